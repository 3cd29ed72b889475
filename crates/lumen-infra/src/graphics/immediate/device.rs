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

use super::recorder::ImmediateRecorder;
use crate::graphics::soft::{lock, SoftCore, TraceEntry};
use lumen_core::renderer::*;
use std::sync::{Arc, Weak};

/// Capability table of the immediate backend.
pub fn immediate_capabilities() -> DeviceCapabilities {
    DeviceCapabilities {
        texture_formats: TextureFormat::ALL
            .into_iter()
            .filter(|f| !matches!(f, TextureFormat::R16Float | TextureFormat::Rgba16Float))
            .collect(),
        texture_dimensions: vec![
            TextureDimension::D1,
            TextureDimension::D2,
            TextureDimension::D2Array,
            TextureDimension::Cube,
        ],
        vertex_formats: VertexFormat::ALL.to_vec(),
        shader_stages: vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment],
        max_texture_dimension: 8192,
        max_texture_array_layers: 256,
        max_sample_count: 4,
        max_color_attachments: 8,
        max_vertex_buffers: 16,
        max_anisotropy: 16,
        max_buffer_size: 1 << 30,
    }
}

/// A device modelled on an immediate-mode API.
///
/// Recording a command executes it; queue submission only counts. Bound
/// state belongs to each command list and starts empty on every `begin`.
#[derive(Debug)]
pub struct ImmediateDevice {
    core: SoftCore,
}

impl ImmediateDevice {
    /// Creates the device.
    pub fn new(descriptor: &DeviceDescriptor) -> Arc<Self> {
        let name = descriptor
            .label
            .as_deref()
            .unwrap_or("ImmediateDevice")
            .to_string();
        log::info!("Creating immediate graphics device '{name}'");
        Arc::new_cyclic(|this: &Weak<ImmediateDevice>| {
            let this: Weak<dyn GraphicsDevice> = this.clone();
            let adapter = RendererAdapterInfo {
                name,
                backend_type: GraphicsBackendType::Immediate,
                device_type: RendererDeviceType::Cpu,
            };
            Self {
                core: SoftCore::new(adapter, immediate_capabilities(), this),
            }
        })
    }

    /// Every command executed so far, oldest first.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.core.trace()
    }

    /// Empties the execution trace.
    pub fn clear_trace(&self) {
        self.core.clear_trace();
    }

    /// Host bytes backing live textures and buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.core.allocated_bytes()
    }
}

impl GraphicsDevice for ImmediateDevice {
    fn id(&self) -> DeviceId {
        self.core.id()
    }

    fn adapter_info(&self) -> RendererAdapterInfo {
        self.core.adapter_info()
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        self.core.capabilities()
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<GraphicsTexture>, ResourceError> {
        self.core.create_texture(descriptor)
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<GraphicsSampler>, ResourceError> {
        self.core.create_sampler(descriptor)
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<GraphicsBuffer>, ResourceError> {
        self.core.create_buffer(descriptor)
    }

    fn create_shader(
        &self,
        descriptor: &ShaderDescriptor,
    ) -> Result<Arc<GraphicsShader>, ResourceError> {
        self.core.create_shader(descriptor)
    }

    fn create_program(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<GraphicsProgram>, ResourceError> {
        self.core.create_program(descriptor)
    }

    fn create_input_layout(
        &self,
        descriptor: &InputLayoutDescriptor,
    ) -> Result<Arc<GraphicsInputLayout>, ResourceError> {
        self.core.create_input_layout(descriptor)
    }

    fn create_state(&self, descriptor: &StateDescriptor) -> Result<Arc<GraphicsState>, ResourceError> {
        self.core.create_state(descriptor)
    }

    fn create_framebuffer_layout(
        &self,
        descriptor: &FramebufferLayoutDescriptor,
    ) -> Result<Arc<GraphicsFramebufferLayout>, ResourceError> {
        self.core.create_framebuffer_layout(descriptor)
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<Arc<GraphicsFramebuffer>, ResourceError> {
        self.core.create_framebuffer(descriptor)
    }

    fn create_descriptor_set_layout(
        &self,
        descriptor: &DescriptorSetLayoutDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSetLayout>, ResourceError> {
        self.core.create_descriptor_set_layout(descriptor)
    }

    fn create_descriptor_pool(
        &self,
        descriptor: &DescriptorPoolDescriptor,
    ) -> Result<Arc<GraphicsDescriptorPool>, ResourceError> {
        self.core.create_descriptor_pool(descriptor)
    }

    fn create_descriptor_set(
        &self,
        descriptor: &DescriptorSetDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSet>, ResourceError> {
        self.core.create_descriptor_set(descriptor)
    }

    fn create_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<Arc<GraphicsPipeline>, ResourceError> {
        self.core.create_pipeline(descriptor)
    }

    fn create_command_queue(
        &self,
        descriptor: &CommandQueueDescriptor,
    ) -> Result<Arc<GraphicsCommandQueue>, ResourceError> {
        self.core.create_command_queue(descriptor)
    }

    fn create_command_pool(
        &self,
        descriptor: &CommandPoolDescriptor,
    ) -> Result<Arc<GraphicsCommandPool>, ResourceError> {
        self.core.create_command_pool(descriptor)
    }

    fn create_command_list(
        &self,
        descriptor: &CommandListDescriptor,
    ) -> Result<Arc<GraphicsCommandList>, ResourceError> {
        let context = self.core.context().clone();
        self.core.create_command_list(descriptor, |list| {
            Box::new(ImmediateRecorder::new(list, context))
        })
    }

    fn create_semaphore(
        &self,
        descriptor: &SemaphoreDescriptor,
    ) -> Result<Arc<GraphicsSemaphore>, ResourceError> {
        self.core.create_semaphore(descriptor)
    }

    fn write_buffer(
        &self,
        buffer: &GraphicsBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.core.write_buffer(buffer, offset, data)
    }

    fn read_texture(
        &self,
        texture: &GraphicsTexture,
        mip_level: u32,
    ) -> Result<Vec<u8>, ResourceError> {
        self.core.read_texture(texture, mip_level)
    }

    fn submit(
        &self,
        _queue: &GraphicsCommandQueue,
        lists: &[Arc<GraphicsCommandList>],
        _wait: &[Arc<GraphicsSemaphore>],
        _signal: &[Arc<GraphicsSemaphore>],
    ) -> Result<(), ResourceError> {
        // Work ran while recording; submission is bookkeeping only.
        let mut context = lock(self.core.context());
        context.stats.submissions += 1;
        context.stats.command_lists_executed += lists.len() as u64;
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), ResourceError> {
        self.core.reclaim();
        Ok(())
    }

    fn statistics(&self) -> DeviceStatistics {
        self.core.statistics()
    }
}
