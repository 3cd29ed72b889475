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

//! Host-memory device state shared by the immediate and explicit backends.
//!
//! Both backends validate descriptors the same way and keep texels and
//! buffer bytes in host memory; they only differ in when recorded commands
//! run. [`SoftCore`] owns everything they have in common.

mod executor;
mod memory;
pub mod texels;

pub use self::executor::{TraceEntry, TRACE_CAPACITY};
pub(crate) use self::executor::{ExecState, SoftContext};

use lumen_core::renderer::validation;
use lumen_core::renderer::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity, limits, host memory and release queue of one software device.
#[derive(Debug)]
pub(crate) struct SoftCore {
    id: DeviceId,
    adapter: RendererAdapterInfo,
    caps: DeviceCapabilities,
    this: Weak<dyn GraphicsDevice>,
    releases: flume::Sender<ResourceHandle>,
    released: flume::Receiver<ResourceHandle>,
    context: Arc<Mutex<SoftContext>>,
    live: AtomicU64,
}

impl SoftCore {
    pub(crate) fn new(
        adapter: RendererAdapterInfo,
        caps: DeviceCapabilities,
        this: Weak<dyn GraphicsDevice>,
    ) -> Self {
        let (releases, released) = flume::unbounded();
        Self {
            id: DeviceId::next(),
            adapter,
            caps,
            this,
            releases,
            released,
            context: Arc::new(Mutex::new(SoftContext::default())),
            live: AtomicU64::new(0),
        }
    }

    pub(crate) fn id(&self) -> DeviceId {
        self.id
    }

    pub(crate) fn adapter_info(&self) -> RendererAdapterInfo {
        self.adapter.clone()
    }

    pub(crate) fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub(crate) fn context(&self) -> &Arc<Mutex<SoftContext>> {
        &self.context
    }

    fn object<D>(&self, kind: ResourceKind, descriptor: D) -> GraphicsObject<D> {
        self.live.fetch_add(1, Ordering::Relaxed);
        let device = DeviceRef::new(self.id, self.this.clone(), self.releases.clone());
        GraphicsObject::new(kind, device, descriptor)
    }

    fn owns(&self, child: &dyn DeviceChild, what: &str) -> Result<(), ResourceError> {
        if child.device_id() == self.id {
            Ok(())
        } else {
            Err(ResourceError::InvalidComposition(format!(
                "{what} belongs to another device"
            )))
        }
    }

    /// Frees the storage of every object dropped since the last call.
    ///
    /// Must not be called while the context lock is held.
    pub(crate) fn reclaim(&self) {
        let handles: Vec<_> = self.released.try_iter().collect();
        if handles.is_empty() {
            return;
        }
        self.live.fetch_sub(handles.len() as u64, Ordering::Relaxed);
        let mut context = lock(&self.context);
        for handle in handles {
            let bytes = context.memory.free(handle);
            log::trace!("{}: released {:?} ({} bytes)", self.adapter.name, handle, bytes);
        }
    }

    pub(crate) fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<GraphicsTexture>, ResourceError> {
        self.reclaim();
        validation::texture(&self.caps, descriptor)?;
        let object = self.object(ResourceKind::Texture, descriptor.clone());
        lock(&self.context)
            .memory
            .allocate_texture(object.handle(), descriptor);
        log::debug!(
            "{}: Created texture '{}' {:?} {}x{}x{}",
            self.adapter.name,
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.format,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth_or_array_layers,
        );
        Ok(Arc::new(object))
    }

    pub(crate) fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<GraphicsSampler>, ResourceError> {
        validation::sampler(&self.caps, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::Sampler, descriptor.clone())))
    }

    pub(crate) fn create_buffer(
        &self,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<GraphicsBuffer>, ResourceError> {
        self.reclaim();
        validation::buffer(&self.caps, descriptor)?;
        let object = self.object(ResourceKind::Buffer, descriptor.clone());
        lock(&self.context).memory.allocate_buffer(
            object.handle(),
            descriptor.size,
            descriptor.data.as_deref(),
        );
        log::debug!(
            "{}: Created buffer '{}', size: {} bytes",
            self.adapter.name,
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size
        );
        Ok(Arc::new(object))
    }

    pub(crate) fn create_shader(
        &self,
        descriptor: &ShaderDescriptor,
    ) -> Result<Arc<GraphicsShader>, ResourceError> {
        validation::shader(&self.caps, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::Shader, descriptor.clone())))
    }

    pub(crate) fn create_program(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<GraphicsProgram>, ResourceError> {
        let uniforms = validation::reflect_program(self.id, descriptor)?;
        let object = self.object(ResourceKind::Program, descriptor.clone());
        Ok(Arc::new(GraphicsProgram::new(object, uniforms)))
    }

    pub(crate) fn create_input_layout(
        &self,
        descriptor: &InputLayoutDescriptor,
    ) -> Result<Arc<GraphicsInputLayout>, ResourceError> {
        validation::input_layout(&self.caps, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::InputLayout, descriptor.clone())))
    }

    pub(crate) fn create_state(
        &self,
        descriptor: &StateDescriptor,
    ) -> Result<Arc<GraphicsState>, ResourceError> {
        validation::state(&self.caps, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::State, descriptor.clone())))
    }

    pub(crate) fn create_framebuffer_layout(
        &self,
        descriptor: &FramebufferLayoutDescriptor,
    ) -> Result<Arc<GraphicsFramebufferLayout>, ResourceError> {
        validation::framebuffer_layout(&self.caps, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::FramebufferLayout, descriptor.clone())))
    }

    pub(crate) fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<Arc<GraphicsFramebuffer>, ResourceError> {
        validation::framebuffer(self.id, descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::Framebuffer, descriptor.clone())))
    }

    pub(crate) fn create_descriptor_set_layout(
        &self,
        descriptor: &DescriptorSetLayoutDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSetLayout>, ResourceError> {
        validation::descriptor_set_layout(descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::DescriptorSetLayout, descriptor.clone())))
    }

    pub(crate) fn create_descriptor_pool(
        &self,
        descriptor: &DescriptorPoolDescriptor,
    ) -> Result<Arc<GraphicsDescriptorPool>, ResourceError> {
        validation::descriptor_pool(descriptor)?;
        let object = self.object(ResourceKind::DescriptorPool, descriptor.clone());
        Ok(Arc::new(GraphicsDescriptorPool::new(object)))
    }

    pub(crate) fn create_descriptor_set(
        &self,
        descriptor: &DescriptorSetDescriptor,
    ) -> Result<Arc<GraphicsDescriptorSet>, ResourceError> {
        self.owns(descriptor.pool.as_ref(), "descriptor pool")?;
        self.owns(descriptor.layout.as_ref(), "descriptor set layout")?;
        let object = self.object(ResourceKind::DescriptorSet, descriptor.clone());
        Ok(Arc::new(GraphicsDescriptorSet::allocate(object)?))
    }

    pub(crate) fn create_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<Arc<GraphicsPipeline>, ResourceError> {
        validation::pipeline(self.id, descriptor)?;
        log::debug!(
            "{}: Created pipeline '{}'",
            self.adapter.name,
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(Arc::new(self.object(ResourceKind::Pipeline, descriptor.clone())))
    }

    pub(crate) fn create_command_queue(
        &self,
        descriptor: &CommandQueueDescriptor,
    ) -> Result<Arc<GraphicsCommandQueue>, ResourceError> {
        validation::command_queue(descriptor)?;
        Ok(Arc::new(self.object(ResourceKind::CommandQueue, descriptor.clone())))
    }

    pub(crate) fn create_command_pool(
        &self,
        descriptor: &CommandPoolDescriptor,
    ) -> Result<Arc<GraphicsCommandPool>, ResourceError> {
        let object = self.object(ResourceKind::CommandPool, descriptor.clone());
        Ok(Arc::new(GraphicsCommandPool::new(object)))
    }

    /// Allocates a list whose recorder is built from the list's handle.
    pub(crate) fn create_command_list(
        &self,
        descriptor: &CommandListDescriptor,
        recorder: impl FnOnce(ResourceHandle) -> Box<dyn CommandRecorder>,
    ) -> Result<Arc<GraphicsCommandList>, ResourceError> {
        self.owns(descriptor.pool.as_ref(), "command pool")?;
        let object = self.object(ResourceKind::CommandList, descriptor.clone());
        let recorder = recorder(object.handle());
        Ok(GraphicsCommandList::new(object, recorder))
    }

    pub(crate) fn create_semaphore(
        &self,
        descriptor: &SemaphoreDescriptor,
    ) -> Result<Arc<GraphicsSemaphore>, ResourceError> {
        Ok(Arc::new(self.object(ResourceKind::Semaphore, descriptor.clone())))
    }

    pub(crate) fn write_buffer(
        &self,
        buffer: &GraphicsBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        self.owns(buffer, "buffer")?;
        validation::buffer_range(buffer.descriptor(), offset, data.len() as u64)?;
        lock(&self.context)
            .memory
            .write_buffer(buffer.handle(), offset, data)
    }

    pub(crate) fn read_texture(
        &self,
        texture: &GraphicsTexture,
        mip_level: u32,
    ) -> Result<Vec<u8>, ResourceError> {
        self.owns(texture, "texture")?;
        let context = lock(&self.context);
        let (_, bytes) = context
            .memory
            .texture(texture.handle())?
            .level(mip_level)
            .ok_or(ResourceError::OutOfBounds)?;
        Ok(bytes.clone())
    }

    pub(crate) fn statistics(&self) -> DeviceStatistics {
        self.reclaim();
        let mut stats = lock(&self.context).stats;
        stats.live_resources = self.live.load(Ordering::Relaxed);
        stats
    }

    pub(crate) fn trace(&self) -> Vec<TraceEntry> {
        lock(&self.context).trace()
    }

    pub(crate) fn clear_trace(&self) {
        lock(&self.context).clear_trace();
    }

    /// Bytes of host memory currently backing textures and buffers.
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.reclaim();
        lock(&self.context).memory.allocated_bytes()
    }
}
