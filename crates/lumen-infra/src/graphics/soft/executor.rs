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

//! Execution of recorded commands against host memory.

use super::memory::SoftMemory;
use super::texels;
use lumen_core::math::LinearRgba;
use lumen_core::renderer::{
    ClearFlags, CommandKind, Creatable, DeviceChild, DeviceStatistics, DrawIndexedIndirectArgs,
    DrawIndirectArgs, GraphicsBuffer, GraphicsCommand, GraphicsFramebuffer, IndexFormat,
    ResourceError, ResourceHandle, Scissor,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// Most recent commands kept in the execution trace.
pub const TRACE_CAPACITY: usize = 65_536;

/// One executed command, as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    /// The command list the command came from.
    pub list: ResourceHandle,
    /// The command.
    pub command: CommandKind,
}

/// The bound state commands execute against.
#[derive(Debug, Default)]
pub(crate) struct ExecState {
    framebuffer: Option<Arc<GraphicsFramebuffer>>,
    scissor: Option<Scissor>,
    index_buffer: Option<(Arc<GraphicsBuffer>, u64, IndexFormat)>,
}

/// Memory, counters and trace of one software device.
#[derive(Debug, Default)]
pub(crate) struct SoftContext {
    pub(crate) memory: SoftMemory,
    pub(crate) stats: DeviceStatistics,
    trace: VecDeque<TraceEntry>,
}

impl SoftContext {
    /// The trace, oldest first.
    pub(crate) fn trace(&self) -> Vec<TraceEntry> {
        self.trace.iter().copied().collect()
    }

    pub(crate) fn clear_trace(&mut self) {
        self.trace.clear();
    }

    fn push_trace(&mut self, list: ResourceHandle, command: CommandKind) {
        if self.trace.len() == TRACE_CAPACITY {
            self.trace.pop_front();
        }
        self.trace.push_back(TraceEntry { list, command });
    }

    /// Executes one command of `list` against `state`.
    pub(crate) fn execute(
        &mut self,
        list: ResourceHandle,
        state: &mut ExecState,
        command: &GraphicsCommand,
    ) -> Result<(), ResourceError> {
        match command {
            GraphicsCommand::SetFramebuffer(fb) => state.framebuffer = Some(fb.clone()),
            // Shading is not emulated; these only matter to record-time validation.
            GraphicsCommand::SetViewport(_)
            | GraphicsCommand::SetPipeline(_)
            | GraphicsCommand::SetDescriptorSet(_)
            | GraphicsCommand::SetVertexBuffer { .. } => {}
            GraphicsCommand::SetScissor(s) => state.scissor = Some(*s),
            GraphicsCommand::SetIndexBuffer {
                buffer,
                offset,
                format,
            } => state.index_buffer = Some((buffer.clone(), *offset, *format)),
            GraphicsCommand::Clear {
                flags,
                color,
                depth,
                stencil,
            } => {
                let fb = state.framebuffer.clone().ok_or_else(|| {
                    ResourceError::Backend("clear without a bound framebuffer".into())
                })?;
                self.clear(&fb, state.scissor, *flags, *color, *depth, *stencil)?;
                self.stats.clears += 1;
            }
            GraphicsCommand::Draw {
                vertex_count,
                instance_count,
                ..
            } => self.count_draw(*vertex_count, *instance_count),
            GraphicsCommand::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                ..
            } => {
                self.check_indices(state, *first_index, *index_count)?;
                self.count_draw(*index_count, *instance_count);
            }
            GraphicsCommand::DrawIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                for i in 0..*draw_count as u64 {
                    let at = record_offset(*offset, i, *stride)?;
                    let args: DrawIndirectArgs = self.read_args(buffer, at)?;
                    self.count_draw(args.vertex_count, args.instance_count);
                }
            }
            GraphicsCommand::DrawIndexedIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                for i in 0..*draw_count as u64 {
                    let at = record_offset(*offset, i, *stride)?;
                    let args: DrawIndexedIndirectArgs = self.read_args(buffer, at)?;
                    // Records come from buffer contents, so they cannot be checked while
                    // recording. Out-of-range records are dropped on both backends alike.
                    if self.check_indices(state, args.first_index, args.index_count).is_err() {
                        log::warn!("Skipping indirect record {i}: indices out of range");
                        continue;
                    }
                    self.count_draw(args.index_count, args.instance_count);
                }
            }
            GraphicsCommand::CopyTexture {
                src,
                src_mip_level,
                src_origin,
                dst,
                dst_mip_level,
                dst_origin,
                extent,
            } => {
                self.memory.copy_texture(
                    src.handle(),
                    *src_mip_level,
                    *src_origin,
                    dst.handle(),
                    *dst_mip_level,
                    *dst_origin,
                    *extent,
                )?;
                self.stats.copies += 1;
            }
            GraphicsCommand::CopyBuffer {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                self.memory
                    .copy_buffer(src.handle(), *src_offset, dst.handle(), *dst_offset, *size)?;
                self.stats.copies += 1;
            }
            GraphicsCommand::UpdateBuffer {
                buffer,
                offset,
                data,
            } => self.memory.write_buffer(buffer.handle(), *offset, data)?,
        }
        self.push_trace(list, command.kind());
        Ok(())
    }

    fn count_draw(&mut self, vertices: u32, instances: u32) {
        self.stats.draw_calls += 1;
        self.stats.instances += instances as u64;
        self.stats.vertices += vertices as u64 * instances as u64;
    }

    fn read_args<T: bytemuck::Pod>(
        &self,
        buffer: &GraphicsBuffer,
        offset: u64,
    ) -> Result<T, ResourceError> {
        let bytes = self.memory.buffer(buffer.handle())?;
        let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = start
            .checked_add(std::mem::size_of::<T>())
            .ok_or(ResourceError::OutOfBounds)?;
        let record = bytes.get(start..end).ok_or(ResourceError::OutOfBounds)?;
        Ok(bytemuck::pod_read_unaligned(record))
    }

    fn check_indices(
        &self,
        state: &ExecState,
        first: u32,
        count: u32,
    ) -> Result<(), ResourceError> {
        let (buffer, offset, format) = state
            .index_buffer
            .as_ref()
            .ok_or_else(|| ResourceError::Backend("indexed draw without an index buffer".into()))?;
        let end = (first as u64 + count as u64)
            .checked_mul(format.size())
            .and_then(|bytes| bytes.checked_add(*offset))
            .ok_or(ResourceError::OutOfBounds)?;
        if end > self.memory.buffer(buffer.handle())?.len() as u64 {
            return Err(ResourceError::OutOfBounds);
        }
        Ok(())
    }

    fn clear(
        &mut self,
        fb: &GraphicsFramebuffer,
        scissor: Option<Scissor>,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u32,
    ) -> Result<(), ResourceError> {
        let (x0, y0, x1, y1) = match scissor {
            Some(s) => (
                s.x.min(fb.width()),
                s.y.min(fb.height()),
                s.x.saturating_add(s.width).min(fb.width()),
                s.y.saturating_add(s.height).min(fb.height()),
            ),
            None => (0, 0, fb.width(), fb.height()),
        };
        if flags.contains(ClearFlags::COLOR) {
            for attachment in &fb.descriptor().color_attachments {
                let texture = self.memory.texture_mut(attachment.handle())?;
                let texel = texels::encode_color(texture.format(), color).ok_or_else(|| {
                    ResourceError::Unsupported(format!("clearing {:?}", texture.format()))
                })?;
                fill(texture, (x0, y0, x1, y1), |t| t.copy_from_slice(&texel))?;
            }
        }
        let depth_flags = flags.intersects(ClearFlags::DEPTH_STENCIL);
        if let (true, Some(attachment)) = (depth_flags, &fb.descriptor().depth_stencil_attachment) {
            let depth = flags.contains(ClearFlags::DEPTH).then_some(depth);
            let stencil = flags.contains(ClearFlags::STENCIL).then_some(stencil);
            let texture = self.memory.texture_mut(attachment.handle())?;
            let format = texture.format();
            fill(texture, (x0, y0, x1, y1), |t| {
                texels::write_depth_stencil(format, t, depth, stencil)
            })?;
        }
        Ok(())
    }
}

fn record_offset(offset: u64, index: u64, stride: u64) -> Result<u64, ResourceError> {
    index
        .checked_mul(stride)
        .and_then(|span| span.checked_add(offset))
        .ok_or(ResourceError::OutOfBounds)
}

fn fill(
    texture: &mut super::memory::SoftTexture,
    (x0, y0, x1, y1): (u32, u32, u32, u32),
    mut write: impl FnMut(&mut [u8]),
) -> Result<(), ResourceError> {
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }
    let bpp = texture.format().bytes_per_texel() as usize;
    let extent = texture.level(0).ok_or(ResourceError::OutOfBounds)?.0;
    for y in y0..y1 {
        let range = texture.row(extent, x0, y, 0, x1 - x0);
        let (_, bytes) = texture.level_mut(0).ok_or(ResourceError::OutOfBounds)?;
        let row = bytes.get_mut(range).ok_or(ResourceError::OutOfBounds)?;
        row.chunks_exact_mut(bpp).for_each(&mut write);
    }
    Ok(())
}
