// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::object::{
    DeviceChild, DeviceId, GraphicsBuffer, GraphicsCommandList, GraphicsCommandPool,
    GraphicsCommandQueue, GraphicsDescriptorPool, GraphicsDescriptorSet,
    GraphicsDescriptorSetLayout, GraphicsFramebuffer, GraphicsFramebufferLayout,
    GraphicsInputLayout, GraphicsPipeline, GraphicsProgram, GraphicsSampler, GraphicsSemaphore,
    GraphicsShader, GraphicsState, GraphicsTexture,
};
use std::fmt::Debug;
use std::sync::Arc;

/// The factory for GPU resources and the executor of submitted work.
///
/// Every `create_*` call validates its descriptor against the device
/// capabilities and either returns a new object or an error; no failure leaves
/// partial state behind. The returned objects hold a weak link to the device,
/// so they may outlive it, after which every operation on them reports
/// [`ResourceError::DeviceLost`].
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Process-unique id of the device.
    fn id(&self) -> DeviceId;

    /// Describes the adapter behind the device.
    fn adapter_info(&self) -> RendererAdapterInfo;

    /// Limits and supported feature sets.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Returns `true` if `format` can be used for textures.
    fn is_texture_supported(&self, format: TextureFormat) -> bool {
        self.capabilities().supports_texture_format(format)
    }

    /// Returns `true` if textures of `dimension` can be created.
    fn is_texture_dimension_supported(&self, dimension: TextureDimension) -> bool {
        self.capabilities().supports_texture_dimension(dimension)
    }

    /// Returns `true` if `format` can be used in vertex attributes.
    fn is_vertex_supported(&self, format: VertexFormat) -> bool {
        self.capabilities().supports_vertex_format(format)
    }

    /// Returns `true` if shaders of `stage` can be created.
    fn is_shader_supported(&self, stage: ShaderStage) -> bool {
        self.capabilities().supports_shader_stage(stage)
    }

    /// Creates a texture, uploading the descriptor's initial data if any.
    /// ## Errors
    /// * `Unsupported` - the format, dimension or size exceeds the capabilities.
    /// * `InvalidDescriptor` - the initial data does not match the level-0 byte size.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<GraphicsTexture>, ResourceError>;

    /// Creates a sampler.
    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<GraphicsSampler>, ResourceError>;

    /// Creates a buffer, uploading the descriptor's initial data if any.
    fn create_buffer(&self, descriptor: &BufferDescriptor)
        -> Result<Arc<GraphicsBuffer>, ResourceError>;

    /// Creates a shader stage.
    /// ## Errors
    /// * `Unsupported` - the stage is not supported by the backend.
    fn create_shader(&self, descriptor: &ShaderDescriptor)
        -> Result<Arc<GraphicsShader>, ResourceError>;

    /// Links shader stages into a program and reflects its active uniforms.
    /// ## Errors
    /// * `InvalidComposition` - two shaders share a stage, come from another
    ///   device, or declare the same uniform with different types.
    fn create_program(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<GraphicsProgram>, ResourceError>;

    /// Creates a vertex input layout.
    fn create_input_layout(
        &self,
        descriptor: &InputLayoutDescriptor,
    ) -> Result<Arc<GraphicsInputLayout>, ResourceError>;

    /// Creates a rasterizer, blend and depth-stencil state object.
    fn create_state(&self, descriptor: &StateDescriptor) -> Result<Arc<GraphicsState>, ResourceError>;

    /// Creates a framebuffer layout.
    fn create_framebuffer_layout(
        &self,
        descriptor: &FramebufferLayoutDescriptor,
    ) -> Result<Arc<GraphicsFramebufferLayout>, ResourceError>;

    /// Creates a framebuffer from attachments matching its layout.
    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<Arc<GraphicsFramebuffer>, ResourceError>;

    /// Creates a descriptor set layout.
    fn create_descriptor_set_layout(
        &self,
        descriptor: &DescriptorSetLayoutDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSetLayout>, ResourceError>;

    /// Creates a descriptor pool.
    fn create_descriptor_pool(
        &self,
        descriptor: &DescriptorPoolDescriptor,
    ) -> Result<Arc<GraphicsDescriptorPool>, ResourceError>;

    /// Allocates a descriptor set from a pool.
    /// ## Errors
    /// * `Exhausted` - the pool has no room left for the set's layout.
    fn create_descriptor_set(
        &self,
        descriptor: &DescriptorSetDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSet>, ResourceError>;

    /// Creates a pipeline state object.
    /// ## Errors
    /// * `InvalidComposition` - the components come from several devices, or a
    ///   program uniform is missing from the descriptor set layout.
    fn create_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<Arc<GraphicsPipeline>, ResourceError>;

    /// Creates a submission queue.
    fn create_command_queue(
        &self,
        descriptor: &CommandQueueDescriptor,
    ) -> Result<Arc<GraphicsCommandQueue>, ResourceError>;

    /// Creates a command pool.
    fn create_command_pool(
        &self,
        descriptor: &CommandPoolDescriptor,
    ) -> Result<Arc<GraphicsCommandPool>, ResourceError>;

    /// Allocates a command list in the `Initial` state.
    fn create_command_list(
        &self,
        descriptor: &CommandListDescriptor,
    ) -> Result<Arc<GraphicsCommandList>, ResourceError>;

    /// Creates a semaphore.
    fn create_semaphore(
        &self,
        descriptor: &SemaphoreDescriptor,
    ) -> Result<Arc<GraphicsSemaphore>, ResourceError>;

    /// Writes `data` into `buffer` at `offset`, outside of any command list.
    fn write_buffer(
        &self,
        buffer: &GraphicsBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Reads back one mip level of a texture, tightly packed, after every
    /// prior submission has executed.
    fn read_texture(
        &self,
        texture: &GraphicsTexture,
        mip_level: u32,
    ) -> Result<Vec<u8>, ResourceError>;

    /// Applies a batch of descriptor copies.
    fn copy_descriptor_sets(&self, copies: &[DescriptorCopy]) -> Result<(), ResourceError> {
        if copies.iter().any(|c| c.src.device_id() != self.id()) {
            return Err(ResourceError::InvalidComposition(
                "descriptor copy source belongs to another device".into(),
            ));
        }
        GraphicsDescriptorSet::copy_bindings(copies)
    }

    /// Hands validated lists to the backend. Called by
    /// [`GraphicsCommandQueue::submit`], which also updates the list states.
    fn submit(
        &self,
        queue: &GraphicsCommandQueue,
        lists: &[Arc<GraphicsCommandList>],
        wait: &[Arc<GraphicsSemaphore>],
        signal: &[Arc<GraphicsSemaphore>],
    ) -> Result<(), ResourceError>;

    /// Blocks until every submitted list has executed.
    fn wait_idle(&self) -> Result<(), ResourceError>;

    /// Counters accumulated since the device was created.
    fn statistics(&self) -> DeviceStatistics;
}
