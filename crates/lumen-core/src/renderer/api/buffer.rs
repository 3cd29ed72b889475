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

//! Buffer descriptors.

use crate::lumen_bitflags;
use std::borrow::Cow;

lumen_bitflags! {
    /// How a buffer may be used after creation.
    pub struct BufferUsage: u32 {
        /// Mappable for CPU reads.
        const MAP_READ = 1 << 0;
        /// Mappable for CPU writes.
        const MAP_WRITE = 1 << 1;
        /// Source of copies.
        const COPY_SRC = 1 << 2;
        /// Destination of copies and uploads.
        const COPY_DST = 1 << 3;
        /// Vertex buffer.
        const VERTEX = 1 << 4;
        /// Index buffer.
        const INDEX = 1 << 5;
        /// Uniform buffer.
        const UNIFORM = 1 << 6;
        /// Storage buffer.
        const STORAGE = 1 << 7;
        /// Source of indirect draw arguments.
        const INDIRECT = 1 << 8;
    }
}

/// Describes a buffer to create.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Size in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
    /// Initial contents, at most `size` bytes; the rest is zeroed.
    pub data: Option<Vec<u8>>,
}

/// Arguments of one non-indexed indirect draw, as laid out in an indirect buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DrawIndirectArgs {
    /// Vertices per instance.
    pub vertex_count: u32,
    /// Instance count.
    pub instance_count: u32,
    /// First vertex.
    pub first_vertex: u32,
    /// First instance.
    pub first_instance: u32,
}

/// Arguments of one indexed indirect draw, as laid out in an indirect buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DrawIndexedIndirectArgs {
    /// Indices per instance.
    pub index_count: u32,
    /// Instance count.
    pub instance_count: u32,
    /// First index.
    pub first_index: u32,
    /// Value added to each index.
    pub base_vertex: i32,
    /// First instance.
    pub first_instance: u32,
}
