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

//! Command queue, pool and list descriptors, and the recorded command stream.

use super::common::IndexFormat;
use super::framebuffer::{ClearFlags, Scissor, Viewport};
use crate::lumen_bitflags;
use crate::math::{Extent3D, LinearRgba, Origin3D};
use crate::renderer::object::{
    GraphicsBuffer, GraphicsCommandPool, GraphicsDescriptorSet, GraphicsFramebuffer,
    GraphicsPipeline, GraphicsResource, GraphicsTexture,
};
use std::borrow::Cow;
use std::sync::Arc;

/// The kind of work a queue executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    /// Draws, clears, copies and dispatches.
    Graphics,
    /// Dispatches and copies.
    Compute,
    /// Copies only.
    Transfer,
}

impl QueueType {
    /// Returns `true` if a queue of this type can execute lists of type `list`.
    pub fn accepts(&self, list: QueueType) -> bool {
        match self {
            QueueType::Graphics => true,
            QueueType::Compute => matches!(list, QueueType::Compute | QueueType::Transfer),
            QueueType::Transfer => list == QueueType::Transfer,
        }
    }
}

/// Describes a submission queue.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandQueueDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Queue type.
    pub queue_type: QueueType,
    /// Scheduling priority in `[0, 1]`.
    pub priority: f32,
}

lumen_bitflags! {
    /// Behavior of a command pool.
    pub struct CommandPoolFlags: u32 {
        /// Lists are short-lived and re-recorded often.
        const TRANSIENT = 1 << 0;
        /// Lists may be reset individually, and `begin` on a submitted list resets it.
        const RESET_COMMAND_BUFFER = 1 << 1;
    }
}

/// Describes a command pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandPoolDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Queue type of every list allocated from the pool.
    pub queue_type: QueueType,
    /// Pool behavior.
    pub flags: CommandPoolFlags,
}

lumen_bitflags! {
    /// How a command list will be submitted.
    pub struct CommandListUsage: u32 {
        /// The list becomes invalid after its first submission.
        const ONE_TIME_SUBMIT = 1 << 0;
    }
}

/// Describes a command list allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandListDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Pool the list is allocated from.
    pub pool: Arc<GraphicsCommandPool>,
    /// Submission usage.
    pub usage: CommandListUsage,
}

/// Describes a semaphore.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SemaphoreDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
}

/// Lifecycle state of a command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandListState {
    /// Allocated or reset; nothing recorded.
    Initial,
    /// Accepting commands.
    Recording,
    /// Recording ended; ready to submit.
    Executable,
    /// Handed to a queue.
    Submitted,
    /// Unusable until reset.
    Invalid,
}

/// A command recorded into a list.
#[derive(Debug, Clone)]
pub enum GraphicsCommand {
    /// Makes `framebuffer` the target of following clears and draws.
    SetFramebuffer(Arc<GraphicsFramebuffer>),
    /// Sets the viewport.
    SetViewport(Viewport),
    /// Sets the scissor rectangle.
    SetScissor(Scissor),
    /// Binds a pipeline state object.
    SetPipeline(Arc<GraphicsPipeline>),
    /// Binds a descriptor set.
    SetDescriptorSet(Arc<GraphicsDescriptorSet>),
    /// Binds a vertex buffer to a slot.
    SetVertexBuffer {
        /// Slot index.
        slot: u32,
        /// Buffer.
        buffer: Arc<GraphicsBuffer>,
        /// Byte offset.
        offset: u64,
    },
    /// Binds the index buffer.
    SetIndexBuffer {
        /// Buffer.
        buffer: Arc<GraphicsBuffer>,
        /// Byte offset.
        offset: u64,
        /// Index format.
        format: IndexFormat,
    },
    /// Clears the bound framebuffer.
    Clear {
        /// Aspects to clear.
        flags: ClearFlags,
        /// Color for every color attachment.
        color: LinearRgba,
        /// Depth value.
        depth: f32,
        /// Stencil value.
        stencil: u32,
    },
    /// Non-indexed draw.
    Draw {
        /// Vertices per instance.
        vertex_count: u32,
        /// Instances.
        instance_count: u32,
        /// First vertex.
        first_vertex: u32,
        /// First instance.
        first_instance: u32,
    },
    /// Indexed draw.
    DrawIndexed {
        /// Indices per instance.
        index_count: u32,
        /// Instances.
        instance_count: u32,
        /// First index.
        first_index: u32,
        /// Value added to each index.
        base_vertex: i32,
        /// First instance.
        first_instance: u32,
    },
    /// Draws with arguments read from a buffer at execution time.
    DrawIndirect {
        /// Buffer holding [`DrawIndirectArgs`](super::DrawIndirectArgs) records.
        buffer: Arc<GraphicsBuffer>,
        /// Byte offset of the first record.
        offset: u64,
        /// Number of records.
        draw_count: u32,
        /// Bytes between records.
        stride: u64,
    },
    /// Indexed draws with arguments read from a buffer at execution time.
    DrawIndexedIndirect {
        /// Buffer holding [`DrawIndexedIndirectArgs`](super::DrawIndexedIndirectArgs) records.
        buffer: Arc<GraphicsBuffer>,
        /// Byte offset of the first record.
        offset: u64,
        /// Number of records.
        draw_count: u32,
        /// Bytes between records.
        stride: u64,
    },
    /// Copies a region between two textures of the same format.
    CopyTexture {
        /// Source texture.
        src: Arc<GraphicsTexture>,
        /// Source mip level.
        src_mip_level: u32,
        /// Source origin.
        src_origin: Origin3D,
        /// Destination texture.
        dst: Arc<GraphicsTexture>,
        /// Destination mip level.
        dst_mip_level: u32,
        /// Destination origin.
        dst_origin: Origin3D,
        /// Region size.
        extent: Extent3D,
    },
    /// Copies bytes between two buffers.
    CopyBuffer {
        /// Source buffer.
        src: Arc<GraphicsBuffer>,
        /// Source offset.
        src_offset: u64,
        /// Destination buffer.
        dst: Arc<GraphicsBuffer>,
        /// Destination offset.
        dst_offset: u64,
        /// Byte count.
        size: u64,
    },
    /// Writes inline data into a buffer.
    UpdateBuffer {
        /// Destination buffer.
        buffer: Arc<GraphicsBuffer>,
        /// Destination offset.
        offset: u64,
        /// Bytes to write.
        data: Vec<u8>,
    },
}

/// The variant of a [`GraphicsCommand`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// [`GraphicsCommand::SetFramebuffer`].
    SetFramebuffer,
    /// [`GraphicsCommand::SetViewport`].
    SetViewport,
    /// [`GraphicsCommand::SetScissor`].
    SetScissor,
    /// [`GraphicsCommand::SetPipeline`].
    SetPipeline,
    /// [`GraphicsCommand::SetDescriptorSet`].
    SetDescriptorSet,
    /// [`GraphicsCommand::SetVertexBuffer`].
    SetVertexBuffer,
    /// [`GraphicsCommand::SetIndexBuffer`].
    SetIndexBuffer,
    /// [`GraphicsCommand::Clear`].
    Clear,
    /// [`GraphicsCommand::Draw`].
    Draw,
    /// [`GraphicsCommand::DrawIndexed`].
    DrawIndexed,
    /// [`GraphicsCommand::DrawIndirect`].
    DrawIndirect,
    /// [`GraphicsCommand::DrawIndexedIndirect`].
    DrawIndexedIndirect,
    /// [`GraphicsCommand::CopyTexture`].
    CopyTexture,
    /// [`GraphicsCommand::CopyBuffer`].
    CopyBuffer,
    /// [`GraphicsCommand::UpdateBuffer`].
    UpdateBuffer,
}

impl CommandKind {
    /// Returns `true` for commands only graphics lists may record.
    pub fn requires_graphics_queue(&self) -> bool {
        !matches!(
            self,
            CommandKind::CopyTexture | CommandKind::CopyBuffer | CommandKind::UpdateBuffer
        )
    }

    /// Returns `true` for draw commands.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            CommandKind::Draw
                | CommandKind::DrawIndexed
                | CommandKind::DrawIndirect
                | CommandKind::DrawIndexedIndirect
        )
    }
}

impl GraphicsCommand {
    /// The variant of the command.
    pub fn kind(&self) -> CommandKind {
        match self {
            GraphicsCommand::SetFramebuffer(_) => CommandKind::SetFramebuffer,
            GraphicsCommand::SetViewport(_) => CommandKind::SetViewport,
            GraphicsCommand::SetScissor(_) => CommandKind::SetScissor,
            GraphicsCommand::SetPipeline(_) => CommandKind::SetPipeline,
            GraphicsCommand::SetDescriptorSet(_) => CommandKind::SetDescriptorSet,
            GraphicsCommand::SetVertexBuffer { .. } => CommandKind::SetVertexBuffer,
            GraphicsCommand::SetIndexBuffer { .. } => CommandKind::SetIndexBuffer,
            GraphicsCommand::Clear { .. } => CommandKind::Clear,
            GraphicsCommand::Draw { .. } => CommandKind::Draw,
            GraphicsCommand::DrawIndexed { .. } => CommandKind::DrawIndexed,
            GraphicsCommand::DrawIndirect { .. } => CommandKind::DrawIndirect,
            GraphicsCommand::DrawIndexedIndirect { .. } => CommandKind::DrawIndexedIndirect,
            GraphicsCommand::CopyTexture { .. } => CommandKind::CopyTexture,
            GraphicsCommand::CopyBuffer { .. } => CommandKind::CopyBuffer,
            GraphicsCommand::UpdateBuffer { .. } => CommandKind::UpdateBuffer,
        }
    }

    /// The resources the command references, which must outlive its execution.
    pub fn resources(&self) -> Vec<GraphicsResource> {
        match self {
            GraphicsCommand::SetFramebuffer(fb) => vec![GraphicsResource::Framebuffer(fb.clone())],
            GraphicsCommand::SetPipeline(p) => vec![GraphicsResource::Pipeline(p.clone())],
            GraphicsCommand::SetDescriptorSet(s) => vec![GraphicsResource::DescriptorSet(s.clone())],
            GraphicsCommand::SetVertexBuffer { buffer, .. }
            | GraphicsCommand::SetIndexBuffer { buffer, .. }
            | GraphicsCommand::DrawIndirect { buffer, .. }
            | GraphicsCommand::DrawIndexedIndirect { buffer, .. }
            | GraphicsCommand::UpdateBuffer { buffer, .. } => {
                vec![GraphicsResource::Buffer(buffer.clone())]
            }
            GraphicsCommand::CopyTexture { src, dst, .. } => vec![
                GraphicsResource::Texture(src.clone()),
                GraphicsResource::Texture(dst.clone()),
            ],
            GraphicsCommand::CopyBuffer { src, dst, .. } => vec![
                GraphicsResource::Buffer(src.clone()),
                GraphicsResource::Buffer(dst.clone()),
            ],
            GraphicsCommand::SetViewport(_)
            | GraphicsCommand::SetScissor(_)
            | GraphicsCommand::Clear { .. }
            | GraphicsCommand::Draw { .. }
            | GraphicsCommand::DrawIndexed { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_queue_accepts_every_list_type() {
        assert!(QueueType::Graphics.accepts(QueueType::Transfer));
        assert!(QueueType::Compute.accepts(QueueType::Transfer));
        assert!(!QueueType::Compute.accepts(QueueType::Graphics));
        assert!(!QueueType::Transfer.accepts(QueueType::Compute));
    }

    #[test]
    fn test_copy_commands_do_not_need_graphics_queue() {
        assert!(!CommandKind::CopyTexture.requires_graphics_queue());
        assert!(CommandKind::Clear.requires_graphics_queue());
        assert!(CommandKind::DrawIndexedIndirect.is_draw());
        assert!(!CommandKind::SetPipeline.is_draw());
    }
}
