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

use super::{
    lock, Creatable, DeviceChild, DeviceRef, GraphicsBuffer, GraphicsCommandQueue,
    GraphicsDescriptorSet, GraphicsFramebuffer, GraphicsObject, GraphicsPipeline,
    GraphicsSemaphore, GraphicsTexture, ResourceHandle,
};
use crate::math::{Extent3D, LinearRgba, Origin3D};
use crate::renderer::api::{
    BufferUsage, ClearFlags, CommandListDescriptor, CommandListState,
    CommandListUsage, CommandPoolDescriptor, CommandPoolFlags, DrawIndexedIndirectArgs,
    DrawIndirectArgs, GraphicsCommand, IndexFormat,
    QueueType, Scissor, Viewport,
};
use crate::renderer::error::{CommandError, ResourceError};
use crate::renderer::traits::CommandRecorder;
use crate::renderer::validation;
use std::sync::{Arc, Mutex, Weak};

/// Allocates command lists for one queue type.
#[derive(Debug)]
pub struct GraphicsCommandPool {
    object: GraphicsObject<CommandPoolDescriptor>,
    lists: Mutex<Vec<Weak<GraphicsCommandList>>>,
}

impl GraphicsCommandPool {
    /// Creates a pool without lists.
    pub fn new(object: GraphicsObject<CommandPoolDescriptor>) -> Self {
        Self {
            object,
            lists: Mutex::new(Vec::new()),
        }
    }

    /// Queue type of every list in the pool.
    pub fn queue_type(&self) -> QueueType {
        self.object.descriptor().queue_type
    }

    /// Returns `true` if lists may be reset one by one.
    pub fn allows_list_reset(&self) -> bool {
        self.object
            .descriptor()
            .flags
            .contains(CommandPoolFlags::RESET_COMMAND_BUFFER)
    }

    fn register(&self, list: &Arc<GraphicsCommandList>) {
        let mut lists = lock(&self.lists);
        lists.retain(|l| l.strong_count() > 0);
        lists.push(Arc::downgrade(list));
    }

    /// Returns every live list of the pool to [`CommandListState::Initial`].
    pub fn reset(&self) {
        let lists: Vec<_> = lock(&self.lists).iter().filter_map(Weak::upgrade).collect();
        log::debug!("Resetting {} command list(s) of pool {:?}", lists.len(), self.handle());
        for list in lists {
            list.reset_unchecked();
        }
    }

    /// Number of live lists allocated from the pool.
    pub fn list_count(&self) -> usize {
        lock(&self.lists).iter().filter(|l| l.strong_count() > 0).count()
    }
}

impl PartialEq for GraphicsCommandPool {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl DeviceChild for GraphicsCommandPool {
    fn handle(&self) -> ResourceHandle {
        self.object.handle()
    }

    fn device_ref(&self) -> &DeviceRef {
        self.object.device_ref()
    }
}

impl Creatable for GraphicsCommandPool {
    type Descriptor = CommandPoolDescriptor;

    fn descriptor(&self) -> &CommandPoolDescriptor {
        self.object.descriptor()
    }
}

#[derive(Debug, Default)]
struct BoundState {
    framebuffer: Option<Arc<GraphicsFramebuffer>>,
    pipeline: Option<Arc<GraphicsPipeline>>,
    descriptor_set: Option<Arc<GraphicsDescriptorSet>>,
    vertex_slots: u64,
    index_buffer: Option<(Arc<GraphicsBuffer>, u64, IndexFormat)>,
}

#[derive(Debug)]
struct ListInner {
    state: CommandListState,
    recorder: Box<dyn CommandRecorder>,
    bound: BoundState,
    recorded: usize,
}

/// A command list.
///
/// The list owns the recording state machine:
///
/// ```text
/// Initial -> Recording -> Executable -> Submitted -> Initial | Invalid
/// ```
///
/// Commands are validated against the bound framebuffer and pipeline before
/// they reach the backend recorder, so both backends reject the same misuse.
#[derive(Debug)]
pub struct GraphicsCommandList {
    object: GraphicsObject<CommandListDescriptor>,
    inner: Mutex<ListInner>,
}

impl GraphicsCommandList {
    /// Wraps a backend recorder and registers the list with its pool.
    pub fn new(
        object: GraphicsObject<CommandListDescriptor>,
        recorder: Box<dyn CommandRecorder>,
    ) -> Arc<Self> {
        let list = Arc::new(Self {
            object,
            inner: Mutex::new(ListInner {
                state: CommandListState::Initial,
                recorder,
                bound: BoundState::default(),
                recorded: 0,
            }),
        });
        list.pool().register(&list);
        list
    }

    /// The pool the list was allocated from.
    pub fn pool(&self) -> &Arc<GraphicsCommandPool> {
        &self.object.descriptor().pool
    }

    /// Queue type of the list.
    pub fn queue_type(&self) -> QueueType {
        self.pool().queue_type()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CommandListState {
        lock(&self.inner).state
    }

    /// Number of commands recorded since the last `begin`.
    pub fn recorded_len(&self) -> usize {
        lock(&self.inner).recorded
    }

    fn one_time(&self) -> bool {
        self.object
            .descriptor()
            .usage
            .contains(CommandListUsage::ONE_TIME_SUBMIT)
    }

    fn clear(inner: &mut ListInner) {
        inner.recorder.reset();
        inner.bound = BoundState::default();
        inner.recorded = 0;
        inner.state = CommandListState::Initial;
    }

    /// Starts recording.
    ///
    /// A list that was already recorded is reset implicitly when its pool
    /// allows resets; otherwise only an `Initial` list can begin.
    pub fn begin(&self) -> Result<(), CommandError> {
        let mut inner = lock(&self.inner);
        match inner.state {
            CommandListState::Initial => {}
            CommandListState::Executable
            | CommandListState::Submitted
            | CommandListState::Invalid
                if self.pool().allows_list_reset() =>
            {
                Self::clear(&mut inner);
            }
            state => {
                return Err(CommandError::InvalidState {
                    operation: "begin",
                    state,
                })
            }
        }
        inner.recorder.begin()?;
        inner.state = CommandListState::Recording;
        Ok(())
    }

    /// Ends recording. The list becomes submittable.
    pub fn end(&self) -> Result<(), CommandError> {
        let mut inner = lock(&self.inner);
        if inner.state != CommandListState::Recording {
            return Err(CommandError::InvalidState {
                operation: "end",
                state: inner.state,
            });
        }
        inner.recorder.end()?;
        inner.state = CommandListState::Executable;
        Ok(())
    }

    /// Discards recorded commands. Requires a pool created with
    /// [`CommandPoolFlags::RESET_COMMAND_BUFFER`].
    pub fn reset(&self) -> Result<(), CommandError> {
        if !self.pool().allows_list_reset() {
            return Err(CommandError::ResetNotAllowed);
        }
        self.reset_unchecked();
        Ok(())
    }

    fn reset_unchecked(&self) {
        Self::clear(&mut lock(&self.inner));
    }

    pub(crate) fn mark_submitted(&self) {
        let mut inner = lock(&self.inner);
        inner.state = if self.one_time() {
            CommandListState::Invalid
        } else {
            CommandListState::Submitted
        };
    }

    fn record(&self, command: GraphicsCommand) -> Result<(), CommandError> {
        let mut inner = lock(&self.inner);
        if inner.state != CommandListState::Recording {
            return Err(CommandError::InvalidState {
                operation: "record into",
                state: inner.state,
            });
        }
        if !self.device_ref().is_alive() {
            return Err(ResourceError::DeviceLost.into());
        }
        let kind = command.kind();
        let queue = self.queue_type();
        if kind.requires_graphics_queue() && queue != QueueType::Graphics {
            return Err(CommandError::UnsupportedOnQueue {
                command: kind,
                queue,
            });
        }
        self.validate(&inner.bound, &command)?;

        match &command {
            GraphicsCommand::SetFramebuffer(fb) => inner.bound.framebuffer = Some(fb.clone()),
            GraphicsCommand::SetPipeline(p) => inner.bound.pipeline = Some(p.clone()),
            GraphicsCommand::SetDescriptorSet(s) => inner.bound.descriptor_set = Some(s.clone()),
            GraphicsCommand::SetVertexBuffer { slot, .. } => inner.bound.vertex_slots |= 1 << slot,
            GraphicsCommand::SetIndexBuffer {
                buffer,
                offset,
                format,
            } => inner.bound.index_buffer = Some((buffer.clone(), *offset, *format)),
            _ => {}
        }
        inner.recorder.record(command)?;
        inner.recorded += 1;
        Ok(())
    }

    fn same_device(&self, child: &dyn DeviceChild) -> Result<(), CommandError> {
        if child.device_id() != self.device_id() {
            return Err(ResourceError::InvalidComposition(format!(
                "{:?} belongs to another device than the command list",
                child.handle().kind()
            ))
            .into());
        }
        Ok(())
    }

    fn require_buffer_usage(buffer: &GraphicsBuffer, usage: BufferUsage) -> Result<(), CommandError> {
        if !buffer.descriptor().usage.contains(usage) {
            return Err(ResourceError::InvalidComposition(format!(
                "buffer {:?} lacks usage {usage:?}",
                buffer.handle()
            ))
            .into());
        }
        Ok(())
    }

    fn validate(&self, bound: &BoundState, command: &GraphicsCommand) -> Result<(), CommandError> {
        match command {
            GraphicsCommand::SetFramebuffer(fb) => self.same_device(fb.as_ref()),
            GraphicsCommand::SetPipeline(p) => {
                self.same_device(p.as_ref())?;
                if !p.is_valid() {
                    return Err(ResourceError::InvalidComposition(
                        "pipeline components no longer share a live device".into(),
                    )
                    .into());
                }
                Ok(())
            }
            GraphicsCommand::SetDescriptorSet(s) => self.same_device(s.as_ref()),
            GraphicsCommand::SetVertexBuffer { slot, buffer, .. } => {
                if *slot >= u64::BITS {
                    return Err(ResourceError::InvalidComposition(format!(
                        "vertex buffer slot {slot} out of range"
                    ))
                    .into());
                }
                self.same_device(buffer.as_ref())?;
                Self::require_buffer_usage(buffer, BufferUsage::VERTEX)
            }
            GraphicsCommand::SetIndexBuffer { buffer, offset, .. } => {
                self.same_device(buffer.as_ref())?;
                Self::require_buffer_usage(buffer, BufferUsage::INDEX)?;
                validation::buffer_range(buffer.descriptor(), *offset, 0)?;
                Ok(())
            }
            GraphicsCommand::SetViewport(_) | GraphicsCommand::SetScissor(_) => Ok(()),
            GraphicsCommand::Clear { .. } => {
                if bound.framebuffer.is_none() {
                    return Err(CommandError::NoFramebufferBound);
                }
                Ok(())
            }
            GraphicsCommand::Draw { .. }
            | GraphicsCommand::DrawIndexed { .. }
            | GraphicsCommand::DrawIndirect { .. }
            | GraphicsCommand::DrawIndexedIndirect { .. } => self.validate_draw(bound, command),
            GraphicsCommand::CopyTexture {
                src,
                src_mip_level,
                src_origin,
                dst,
                dst_mip_level,
                dst_origin,
                extent,
            } => {
                self.same_device(src.as_ref())?;
                self.same_device(dst.as_ref())?;
                validation::texture_copy(
                    (src.as_ref(), *src_mip_level, *src_origin),
                    (dst.as_ref(), *dst_mip_level, *dst_origin),
                    *extent,
                )
                .map_err(Into::into)
            }
            GraphicsCommand::CopyBuffer {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                self.same_device(src.as_ref())?;
                self.same_device(dst.as_ref())?;
                Self::require_buffer_usage(src, BufferUsage::COPY_SRC)?;
                Self::require_buffer_usage(dst, BufferUsage::COPY_DST)?;
                validation::buffer_range(src.descriptor(), *src_offset, *size)?;
                validation::buffer_range(dst.descriptor(), *dst_offset, *size)?;
                Ok(())
            }
            GraphicsCommand::UpdateBuffer {
                buffer,
                offset,
                data,
            } => {
                self.same_device(buffer.as_ref())?;
                Self::require_buffer_usage(buffer, BufferUsage::COPY_DST)?;
                validation::buffer_range(buffer.descriptor(), *offset, data.len() as u64)?;
                Ok(())
            }
        }
    }

    fn validate_draw(&self, bound: &BoundState, command: &GraphicsCommand) -> Result<(), CommandError> {
        let framebuffer = bound
            .framebuffer
            .as_ref()
            .ok_or(CommandError::NoFramebufferBound)?;
        let pipeline = bound.pipeline.as_ref().ok_or(CommandError::NoPipelineBound)?;
        let desc = pipeline.descriptor();
        if !validation::framebuffer_layouts_compatible(&desc.framebuffer_layout, framebuffer.layout()) {
            return Err(ResourceError::InvalidComposition(
                "bound pipeline was built for another framebuffer layout".into(),
            )
            .into());
        }
        let layout = &desc.descriptor_set_layout;
        match &bound.descriptor_set {
            Some(set) if set.layout().handle() != layout.handle() => {
                return Err(ResourceError::InvalidComposition(
                    "bound descriptor set does not follow the pipeline's set layout".into(),
                )
                .into());
            }
            None if !layout.descriptor().bindings.is_empty() => {
                return Err(ResourceError::InvalidComposition(
                    "pipeline expects a descriptor set but none is bound".into(),
                )
                .into());
            }
            _ => {}
        }
        let slots = desc.input_layout.descriptor().buffers.len() as u32;
        if let Some(slot) = (0..slots).find(|slot| bound.vertex_slots & (1 << slot) == 0) {
            return Err(ResourceError::InvalidComposition(format!(
                "vertex buffer slot {slot} is not bound"
            ))
            .into());
        }
        match command {
            GraphicsCommand::DrawIndexed {
                index_count,
                first_index,
                ..
            } => {
                let (indices, offset, format) =
                    bound.index_buffer.as_ref().ok_or(CommandError::NoIndexBuffer)?;
                validation::index_range(
                    indices.descriptor(),
                    *offset,
                    *format,
                    *first_index,
                    *index_count,
                )?;
                Ok(())
            }
            GraphicsCommand::DrawIndexedIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                if bound.index_buffer.is_none() {
                    return Err(CommandError::NoIndexBuffer);
                }
                self.validate_indirect::<DrawIndexedIndirectArgs>(
                    buffer,
                    *offset,
                    *draw_count,
                    *stride,
                )
            }
            GraphicsCommand::DrawIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => self.validate_indirect::<DrawIndirectArgs>(buffer, *offset, *draw_count, *stride),
            _ => Ok(()),
        }
    }

    fn validate_indirect<T>(
        &self,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) -> Result<(), CommandError> {
        self.same_device(buffer.as_ref())?;
        Self::require_buffer_usage(buffer, BufferUsage::INDIRECT)?;
        let record = std::mem::size_of::<T>() as u64;
        validation::indirect_range(buffer.descriptor(), offset, draw_count, stride, record)?;
        Ok(())
    }

    /// Binds the render target of following clears and draws.
    pub fn set_framebuffer(&self, framebuffer: &Arc<GraphicsFramebuffer>) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetFramebuffer(framebuffer.clone()))
    }

    /// Sets the viewport.
    pub fn set_viewport(&self, viewport: Viewport) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetViewport(viewport))
    }

    /// Sets the scissor rectangle.
    pub fn set_scissor(&self, scissor: Scissor) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetScissor(scissor))
    }

    /// Binds a pipeline state object.
    pub fn set_pipeline(&self, pipeline: &Arc<GraphicsPipeline>) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetPipeline(pipeline.clone()))
    }

    /// Binds a descriptor set.
    pub fn set_descriptor_set(&self, set: &Arc<GraphicsDescriptorSet>) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetDescriptorSet(set.clone()))
    }

    /// Binds a vertex buffer to `slot`.
    pub fn set_vertex_buffer(
        &self,
        slot: u32,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetVertexBuffer {
            slot,
            buffer: buffer.clone(),
            offset,
        })
    }

    /// Binds the index buffer.
    pub fn set_index_buffer(
        &self,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
        format: IndexFormat,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::SetIndexBuffer {
            buffer: buffer.clone(),
            offset,
            format,
        })
    }

    /// Clears the aspects in `flags` of the bound framebuffer.
    pub fn clear_framebuffer(
        &self,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u32,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::Clear {
            flags,
            color,
            depth,
            stencil,
        })
    }

    /// Records a non-indexed draw.
    pub fn draw(
        &self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    /// Records an indexed draw.
    pub fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        })
    }

    /// Records `draw_count` draws whose arguments are read from `buffer`.
    pub fn draw_indirect(
        &self,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::DrawIndirect {
            buffer: buffer.clone(),
            offset,
            draw_count,
            stride,
        })
    }

    /// Records `draw_count` indexed draws whose arguments are read from `buffer`.
    pub fn draw_indexed_indirect(
        &self,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::DrawIndexedIndirect {
            buffer: buffer.clone(),
            offset,
            draw_count,
            stride,
        })
    }

    /// Copies a texel region between two textures of the same format.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_texture(
        &self,
        src: &Arc<GraphicsTexture>,
        src_mip_level: u32,
        src_origin: Origin3D,
        dst: &Arc<GraphicsTexture>,
        dst_mip_level: u32,
        dst_origin: Origin3D,
        extent: Extent3D,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::CopyTexture {
            src: src.clone(),
            src_mip_level,
            src_origin,
            dst: dst.clone(),
            dst_mip_level,
            dst_origin,
            extent,
        })
    }

    /// Copies `size` bytes between two buffers.
    pub fn copy_buffer(
        &self,
        src: &Arc<GraphicsBuffer>,
        src_offset: u64,
        dst: &Arc<GraphicsBuffer>,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::CopyBuffer {
            src: src.clone(),
            src_offset,
            dst: dst.clone(),
            dst_offset,
            size,
        })
    }

    /// Writes `data` into `buffer` at `offset` when the list executes.
    pub fn update_buffer(
        &self,
        buffer: &Arc<GraphicsBuffer>,
        offset: u64,
        data: Vec<u8>,
    ) -> Result<(), CommandError> {
        self.record(GraphicsCommand::UpdateBuffer {
            buffer: buffer.clone(),
            offset,
            data,
        })
    }
}

impl PartialEq for GraphicsCommandList {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl DeviceChild for GraphicsCommandList {
    fn handle(&self) -> ResourceHandle {
        self.object.handle()
    }

    fn device_ref(&self) -> &DeviceRef {
        self.object.device_ref()
    }
}

impl Creatable for GraphicsCommandList {
    type Descriptor = CommandListDescriptor;

    fn descriptor(&self) -> &CommandListDescriptor {
        self.object.descriptor()
    }
}

impl GraphicsCommandQueue {
    /// Queue type.
    pub fn queue_type(&self) -> QueueType {
        self.descriptor().queue_type
    }

    /// Submits executable lists in order.
    ///
    /// Every list must come from this queue's device, be `Executable` and have
    /// a queue type this queue accepts. Afterwards reusable lists are
    /// `Submitted` and one-time lists are `Invalid`; either must `begin` or
    /// `reset` before it can be submitted again.
    pub fn submit(
        &self,
        lists: &[Arc<GraphicsCommandList>],
        wait: &[Arc<GraphicsSemaphore>],
        signal: &[Arc<GraphicsSemaphore>],
    ) -> Result<(), CommandError> {
        let device = self.device_ref().require()?;
        let queue = self.queue_type();
        for list in lists {
            if list.device_id() != self.device_id() {
                return Err(ResourceError::InvalidComposition(
                    "command list belongs to another device than the queue".into(),
                )
                .into());
            }
            let state = list.state();
            if state != CommandListState::Executable {
                return Err(CommandError::InvalidState {
                    operation: "submit",
                    state,
                });
            }
            if !queue.accepts(list.queue_type()) {
                return Err(CommandError::QueueMismatch {
                    queue,
                    list: list.queue_type(),
                });
            }
        }
        for (i, list) in lists.iter().enumerate() {
            if lists[..i].iter().any(|other| Arc::ptr_eq(other, list)) {
                return Err(CommandError::InvalidState {
                    operation: "submit twice",
                    state: CommandListState::Executable,
                });
            }
        }
        if wait
            .iter()
            .chain(signal)
            .any(|s| s.device_id() != self.device_id())
        {
            return Err(ResourceError::InvalidComposition(
                "semaphore belongs to another device than the queue".into(),
            )
            .into());
        }
        device.submit(self, lists, wait, signal)?;
        for list in lists {
            list.mark_submitted();
        }
        Ok(())
    }

    /// Blocks until every submission to the device has executed.
    pub fn wait_idle(&self) -> Result<(), CommandError> {
        self.device_ref().require()?.wait_idle()?;
        Ok(())
    }
}
