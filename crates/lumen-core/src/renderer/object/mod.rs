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

//! Resource objects returned by a [`GraphicsDevice`].
//!
//! Every object is handed out as an `Arc`, so several owners may alias it; the
//! longest holder keeps it alive. An object refers back to its device through a
//! [`DeviceRef`], which never keeps the device alive. Dropping the last `Arc`
//! posts the object's handle to the device, which frees the backend state at its
//! next safe point.
//!
//! Capabilities are expressed as small traits implemented selectively:
//! [`DeviceChild`] for everything, [`Creatable`] for descriptor introspection,
//! [`Bindable`] for resources that go into descriptor sets and
//! [`PipelineChild`] for the components of a pipeline state object.

mod command;
mod descriptor_set;
mod program;

pub use self::command::{GraphicsCommandList, GraphicsCommandPool};
pub use self::descriptor_set::{GraphicsDescriptorPool, GraphicsDescriptorSet};
pub use self::program::GraphicsProgram;

use super::api::{
    BufferDescriptor, BufferUsage, CommandQueueDescriptor, DescriptorSetLayoutDescriptor,
    FramebufferDescriptor, FramebufferLayoutDescriptor, GraphicsPipelineDescriptor,
    InputLayoutDescriptor, SamplerDescriptor, SemaphoreDescriptor, ShaderDescriptor,
    StateDescriptor, TextureDescriptor, TextureUsage, UniformType,
};
use super::error::ResourceError;
use super::traits::GraphicsDevice;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Locks a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-unique identity of a device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The closed set of resource kinds a device creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// [`GraphicsTexture`].
    Texture,
    /// [`GraphicsSampler`].
    Sampler,
    /// [`GraphicsBuffer`].
    Buffer,
    /// [`GraphicsShader`].
    Shader,
    /// [`GraphicsProgram`].
    Program,
    /// [`GraphicsInputLayout`].
    InputLayout,
    /// [`GraphicsState`].
    State,
    /// [`GraphicsFramebufferLayout`].
    FramebufferLayout,
    /// [`GraphicsFramebuffer`].
    Framebuffer,
    /// [`GraphicsDescriptorSetLayout`].
    DescriptorSetLayout,
    /// [`GraphicsDescriptorPool`].
    DescriptorPool,
    /// [`GraphicsDescriptorSet`].
    DescriptorSet,
    /// [`GraphicsPipeline`].
    Pipeline,
    /// [`GraphicsCommandQueue`].
    CommandQueue,
    /// [`GraphicsCommandPool`].
    CommandPool,
    /// [`GraphicsCommandList`].
    CommandList,
    /// [`GraphicsSemaphore`].
    Semaphore,
}

/// Process-unique handle of a resource object, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: u64,
}

impl ResourceHandle {
    /// Allocates a fresh handle of `kind`.
    pub fn allocate(kind: ResourceKind) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            kind,
            id: NEXT.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Kind of the resource.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Numeric id, unique across all kinds and devices.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A non-owning link from a resource object to the device that created it.
#[derive(Clone)]
pub struct DeviceRef {
    id: DeviceId,
    device: Weak<dyn GraphicsDevice>,
    releases: flume::Sender<ResourceHandle>,
}

impl DeviceRef {
    /// Creates a link. `releases` receives the handles of dropped objects.
    pub fn new(
        id: DeviceId,
        device: Weak<dyn GraphicsDevice>,
        releases: flume::Sender<ResourceHandle>,
    ) -> Self {
        Self {
            id,
            device,
            releases,
        }
    }

    /// Id of the owning device.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns `true` while the owning device exists.
    pub fn is_alive(&self) -> bool {
        self.device.strong_count() > 0
    }

    /// Upgrades to the owning device, if it still exists.
    pub fn upgrade(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Upgrades to the owning device or fails with [`ResourceError::DeviceLost`].
    pub fn require(&self) -> Result<Arc<dyn GraphicsDevice>, ResourceError> {
        self.upgrade().ok_or(ResourceError::DeviceLost)
    }

    fn release(&self, handle: ResourceHandle) {
        // A closed channel means the device is gone along with its backend state.
        let _ = self.releases.send(handle);
    }
}

impl fmt::Debug for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Implemented by every resource object.
pub trait DeviceChild {
    /// The object's handle.
    fn handle(&self) -> ResourceHandle;

    /// The link to the owning device.
    fn device_ref(&self) -> &DeviceRef;

    /// The owning device, if it still exists.
    fn device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.device_ref().upgrade()
    }

    /// Id of the owning device.
    fn device_id(&self) -> DeviceId {
        self.device_ref().id()
    }
}

/// Implemented by objects that keep a copy of their creation descriptor.
pub trait Creatable {
    /// The descriptor type.
    type Descriptor;

    /// The descriptor the object was created from, value-equal to the input.
    fn descriptor(&self) -> &Self::Descriptor;
}

/// Implemented by resources that can be written into descriptor set bindings.
pub trait Bindable: DeviceChild {
    /// Returns `true` if the resource's usage allows binding it as `ty`.
    fn supports_binding(&self, ty: UniformType) -> bool;
}

/// Implemented by the components a pipeline state object is assembled from.
pub trait PipelineChild: DeviceChild {}

/// The common body of every resource object: handle, device link and descriptor copy.
#[derive(Debug)]
pub struct GraphicsObject<D> {
    handle: ResourceHandle,
    device: DeviceRef,
    descriptor: D,
}

impl<D> GraphicsObject<D> {
    /// Wraps a descriptor copy into a new object of `kind`.
    pub fn new(kind: ResourceKind, device: DeviceRef, descriptor: D) -> Self {
        Self {
            handle: ResourceHandle::allocate(kind),
            device,
            descriptor,
        }
    }
}

impl<D> Drop for GraphicsObject<D> {
    fn drop(&mut self) {
        self.device.release(self.handle);
    }
}

impl<D> PartialEq for GraphicsObject<D> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<D> Eq for GraphicsObject<D> {}

impl<D> Hash for GraphicsObject<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<D> DeviceChild for GraphicsObject<D> {
    fn handle(&self) -> ResourceHandle {
        self.handle
    }

    fn device_ref(&self) -> &DeviceRef {
        &self.device
    }
}

impl<D> Creatable for GraphicsObject<D> {
    type Descriptor = D;

    fn descriptor(&self) -> &D {
        &self.descriptor
    }
}

/// A texture.
pub type GraphicsTexture = GraphicsObject<TextureDescriptor>;
/// A sampler.
pub type GraphicsSampler = GraphicsObject<SamplerDescriptor>;
/// A buffer.
pub type GraphicsBuffer = GraphicsObject<BufferDescriptor>;
/// A single shader stage.
pub type GraphicsShader = GraphicsObject<ShaderDescriptor>;
/// A vertex input layout.
pub type GraphicsInputLayout = GraphicsObject<InputLayoutDescriptor>;
/// Rasterizer, blend, depth and stencil state.
pub type GraphicsState = GraphicsObject<StateDescriptor>;
/// The attachment formats of a family of framebuffers.
pub type GraphicsFramebufferLayout = GraphicsObject<FramebufferLayoutDescriptor>;
/// Concrete attachments bound to a framebuffer layout.
pub type GraphicsFramebuffer = GraphicsObject<FramebufferDescriptor>;
/// The binding points of a descriptor set.
pub type GraphicsDescriptorSetLayout = GraphicsObject<DescriptorSetLayoutDescriptor>;
/// A pipeline state object.
pub type GraphicsPipeline = GraphicsObject<GraphicsPipelineDescriptor>;
/// A submission queue.
pub type GraphicsCommandQueue = GraphicsObject<CommandQueueDescriptor>;
/// An opaque synchronization object between submissions.
pub type GraphicsSemaphore = GraphicsObject<SemaphoreDescriptor>;

impl Bindable for GraphicsTexture {
    fn supports_binding(&self, ty: UniformType) -> bool {
        let usage = self.descriptor().usage;
        match ty {
            UniformType::SampledImage | UniformType::CombinedImageSampler => {
                usage.contains(TextureUsage::TEXTURE_BINDING)
            }
            UniformType::StorageImage => usage.contains(TextureUsage::STORAGE_BINDING),
            _ => false,
        }
    }
}

impl Bindable for GraphicsBuffer {
    fn supports_binding(&self, ty: UniformType) -> bool {
        let usage = self.descriptor().usage;
        match ty {
            UniformType::UniformBuffer => usage.contains(BufferUsage::UNIFORM),
            UniformType::StorageBuffer => usage.contains(BufferUsage::STORAGE),
            _ => false,
        }
    }
}

impl Bindable for GraphicsSampler {
    fn supports_binding(&self, ty: UniformType) -> bool {
        matches!(ty, UniformType::Sampler | UniformType::CombinedImageSampler)
    }
}

impl PipelineChild for GraphicsInputLayout {}
impl PipelineChild for GraphicsState {}
impl PipelineChild for GraphicsFramebufferLayout {}
impl PipelineChild for GraphicsFramebuffer {}
impl PipelineChild for GraphicsDescriptorSetLayout {}
impl PipelineChild for GraphicsPipeline {}

impl GraphicsFramebuffer {
    /// The layout the attachments follow.
    pub fn layout(&self) -> &Arc<GraphicsFramebufferLayout> {
        &self.descriptor().layout
    }

    /// Render area width.
    pub fn width(&self) -> u32 {
        self.descriptor().width
    }

    /// Render area height.
    pub fn height(&self) -> u32 {
        self.descriptor().height
    }

    /// Every attached texture, color slots first.
    pub fn attachments(&self) -> impl Iterator<Item = &Arc<GraphicsTexture>> {
        let desc = self.descriptor();
        desc.color_attachments.iter().chain(desc.depth_stencil_attachment.iter())
    }
}

impl GraphicsPipeline {
    /// Returns `true` while the owning device exists and every component was
    /// created by that same device.
    pub fn is_valid(&self) -> bool {
        let desc = self.descriptor();
        let id = self.device_id();
        self.device_ref().is_alive()
            && desc.program.device_id() == id
            && desc.input_layout.device_id() == id
            && desc.descriptor_set_layout.device_id() == id
            && desc.framebuffer_layout.device_id() == id
            && desc.state.device_id() == id
    }
}

impl GraphicsDescriptorSetLayout {
    /// Looks up a binding point by uniform name.
    pub fn binding_by_name(&self, name: &str) -> Option<&super::api::DescriptorBinding> {
        self.descriptor().bindings.iter().find(|b| b.name == name)
    }
}

/// A resource object of any bindable or pipeline kind, recovered by pattern match.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsResource {
    /// A texture.
    Texture(Arc<GraphicsTexture>),
    /// A sampler.
    Sampler(Arc<GraphicsSampler>),
    /// A buffer.
    Buffer(Arc<GraphicsBuffer>),
    /// A shader.
    Shader(Arc<GraphicsShader>),
    /// A program.
    Program(Arc<GraphicsProgram>),
    /// An input layout.
    InputLayout(Arc<GraphicsInputLayout>),
    /// A state object.
    State(Arc<GraphicsState>),
    /// A framebuffer layout.
    FramebufferLayout(Arc<GraphicsFramebufferLayout>),
    /// A framebuffer.
    Framebuffer(Arc<GraphicsFramebuffer>),
    /// A descriptor set layout.
    DescriptorSetLayout(Arc<GraphicsDescriptorSetLayout>),
    /// A descriptor set.
    DescriptorSet(Arc<GraphicsDescriptorSet>),
    /// A pipeline state object.
    Pipeline(Arc<GraphicsPipeline>),
}

impl GraphicsResource {
    fn as_child(&self) -> &dyn DeviceChild {
        match self {
            GraphicsResource::Texture(r) => r.as_ref(),
            GraphicsResource::Sampler(r) => r.as_ref(),
            GraphicsResource::Buffer(r) => r.as_ref(),
            GraphicsResource::Shader(r) => r.as_ref(),
            GraphicsResource::Program(r) => r.as_ref(),
            GraphicsResource::InputLayout(r) => r.as_ref(),
            GraphicsResource::State(r) => r.as_ref(),
            GraphicsResource::FramebufferLayout(r) => r.as_ref(),
            GraphicsResource::Framebuffer(r) => r.as_ref(),
            GraphicsResource::DescriptorSetLayout(r) => r.as_ref(),
            GraphicsResource::DescriptorSet(r) => r.as_ref(),
            GraphicsResource::Pipeline(r) => r.as_ref(),
        }
    }

    /// The kind of the wrapped object.
    pub fn kind(&self) -> ResourceKind {
        self.handle().kind()
    }

    /// The handle of the wrapped object.
    pub fn handle(&self) -> ResourceHandle {
        self.as_child().handle()
    }

    /// Id of the owning device.
    pub fn device_id(&self) -> DeviceId {
        self.as_child().device_id()
    }

    /// The wrapped texture, if this is one.
    pub fn as_texture(&self) -> Option<&Arc<GraphicsTexture>> {
        match self {
            GraphicsResource::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// The wrapped buffer, if this is one.
    pub fn as_buffer(&self) -> Option<&Arc<GraphicsBuffer>> {
        match self {
            GraphicsResource::Buffer(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! resource_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<Arc<$ty>> for GraphicsResource {
                fn from(value: Arc<$ty>) -> Self {
                    GraphicsResource::$variant(value)
                }
            }
        )*
    };
}

resource_from! {
    Texture => GraphicsTexture,
    Sampler => GraphicsSampler,
    Buffer => GraphicsBuffer,
    Shader => GraphicsShader,
    Program => GraphicsProgram,
    InputLayout => GraphicsInputLayout,
    State => GraphicsState,
    FramebufferLayout => GraphicsFramebufferLayout,
    Framebuffer => GraphicsFramebuffer,
    DescriptorSetLayout => GraphicsDescriptorSetLayout,
    DescriptorSet => GraphicsDescriptorSet,
    Pipeline => GraphicsPipeline,
}
