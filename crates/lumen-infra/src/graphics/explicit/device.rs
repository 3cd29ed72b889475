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

use super::queue::{Submission, SubmissionQueue};
use super::recorder::{CommandBuffer, ExplicitRecorder};
use crate::graphics::soft::{lock, SoftCore, TraceEntry};
use lumen_core::renderer::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Capability table of the explicit backend.
pub fn explicit_capabilities() -> DeviceCapabilities {
    DeviceCapabilities {
        texture_formats: TextureFormat::ALL
            .into_iter()
            .filter(|f| {
                !matches!(
                    f,
                    TextureFormat::R16Float
                        | TextureFormat::Rgba16Float
                        | TextureFormat::Depth24PlusStencil8
                )
            })
            .collect(),
        texture_dimensions: TextureDimension::ALL.to_vec(),
        vertex_formats: VertexFormat::ALL.to_vec(),
        shader_stages: ShaderStage::ALL.to_vec(),
        max_texture_dimension: 16384,
        max_texture_array_layers: 2048,
        max_sample_count: 8,
        max_color_attachments: 8,
        max_vertex_buffers: 32,
        max_anisotropy: 16,
        max_buffer_size: 1 << 31,
    }
}

/// A device modelled on an explicit API.
///
/// Command lists store their commands; submission snapshots them into a
/// pending queue together with every resource they reference. The queue is
/// executed in submission order by [`GraphicsDevice::wait_idle`] and before
/// any host access to device memory.
#[derive(Debug)]
pub struct ExplicitDevice {
    core: SoftCore,
    buffers: Mutex<HashMap<ResourceHandle, Weak<Mutex<Vec<GraphicsCommand>>>>>,
    submissions: Mutex<SubmissionQueue>,
}

impl ExplicitDevice {
    /// Creates the device.
    pub fn new(descriptor: &DeviceDescriptor) -> Arc<Self> {
        let name = descriptor
            .label
            .as_deref()
            .unwrap_or("ExplicitDevice")
            .to_string();
        log::info!("Creating explicit graphics device '{name}'");
        Arc::new_cyclic(|this: &Weak<ExplicitDevice>| {
            let this: Weak<dyn GraphicsDevice> = this.clone();
            let adapter = RendererAdapterInfo {
                name,
                backend_type: GraphicsBackendType::Explicit,
                device_type: RendererDeviceType::Cpu,
            };
            Self {
                core: SoftCore::new(adapter, explicit_capabilities(), this),
                buffers: Mutex::new(HashMap::new()),
                submissions: Mutex::new(SubmissionQueue::default()),
            }
        })
    }

    /// Every command executed so far, oldest first. Pending submissions are
    /// not included.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.core.trace()
    }

    /// Empties the execution trace.
    pub fn clear_trace(&self) {
        self.core.clear_trace();
    }

    /// Number of submissions waiting for a flush.
    pub fn pending_submissions(&self) -> usize {
        lock(&self.submissions).len()
    }

    /// Host bytes backing live textures and buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.core.allocated_bytes()
    }

    /// Executes every pending submission in order.
    fn flush(&self) -> Result<(), ResourceError> {
        let mut submissions = lock(&self.submissions);
        if submissions.is_empty() {
            return Ok(());
        }
        let batch = submissions.drain();
        let mut first_error = None;
        {
            let mut context = lock(self.core.context());
            for submission in &batch {
                if let Err(err) = submissions.execute(&mut context, submission) {
                    first_error.get_or_insert(err);
                }
            }
        }
        drop(submissions);
        log::trace!("Flushed {} submissions", batch.len());
        // Releases the keep-alive references of the executed commands.
        drop(batch);
        self.core.reclaim();
        first_error.map_or(Ok(()), Err)
    }

    fn recorded_commands(
        &self,
        list: &GraphicsCommandList,
    ) -> Result<Vec<GraphicsCommand>, ResourceError> {
        let buffers = lock(&self.buffers);
        let buffer = buffers
            .get(&list.handle())
            .and_then(Weak::upgrade)
            .ok_or(ResourceError::NotFound)?;
        let commands = lock(&buffer).clone();
        Ok(commands)
    }
}

impl GraphicsDevice for ExplicitDevice {
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
        let commands: CommandBuffer = Arc::new(Mutex::new(Vec::new()));
        let mut buffers = lock(&self.buffers);
        buffers.retain(|_, buffer| buffer.strong_count() > 0);
        let list = self.core.create_command_list(descriptor, |handle| {
            buffers.insert(handle, Arc::downgrade(&commands));
            Box::new(ExplicitRecorder::new(commands.clone()))
        })?;
        Ok(list)
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
        self.flush()?;
        self.core.write_buffer(buffer, offset, data)
    }

    fn read_texture(
        &self,
        texture: &GraphicsTexture,
        mip_level: u32,
    ) -> Result<Vec<u8>, ResourceError> {
        self.flush()?;
        self.core.read_texture(texture, mip_level)
    }

    fn submit(
        &self,
        queue: &GraphicsCommandQueue,
        lists: &[Arc<GraphicsCommandList>],
        wait: &[Arc<GraphicsSemaphore>],
        signal: &[Arc<GraphicsSemaphore>],
    ) -> Result<(), ResourceError> {
        let lists = lists
            .iter()
            .map(|list| Ok((list.handle(), self.recorded_commands(list)?)))
            .collect::<Result<Vec<_>, ResourceError>>()?;
        lock(&self.submissions).push(Submission {
            queue: queue.handle(),
            lists,
            wait: wait.to_vec(),
            signal: signal.to_vec(),
        });
        lock(self.core.context()).stats.submissions += 1;
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), ResourceError> {
        self.flush()
    }

    fn statistics(&self) -> DeviceStatistics {
        self.core.statistics()
    }
}
