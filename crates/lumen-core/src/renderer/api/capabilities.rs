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

//! Capability tables and device statistics.

use super::common::{ShaderStage, TextureFormat, VertexFormat};
use super::texture::TextureDimension;

/// What a device can create.
///
/// Queried through the boolean capability calls of
/// [`GraphicsDevice`](crate::renderer::GraphicsDevice); creation validates
/// against the same table, so a `false` answer always means creation fails.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCapabilities {
    /// Texture formats that can be created.
    pub texture_formats: Vec<TextureFormat>,
    /// Texture dimensions that can be created.
    pub texture_dimensions: Vec<TextureDimension>,
    /// Vertex attribute formats accepted by input layouts.
    pub vertex_formats: Vec<VertexFormat>,
    /// Shader stages that can be created.
    pub shader_stages: Vec<ShaderStage>,
    /// Largest width or height of a texture.
    pub max_texture_dimension: u32,
    /// Largest array layer count.
    pub max_texture_array_layers: u32,
    /// Largest sample count.
    pub max_sample_count: u32,
    /// Largest number of color attachments in a framebuffer layout.
    pub max_color_attachments: u32,
    /// Largest vertex buffer slot count in an input layout.
    pub max_vertex_buffers: u32,
    /// Largest sampler anisotropy.
    pub max_anisotropy: u16,
    /// Largest buffer size in bytes.
    pub max_buffer_size: u64,
}

impl DeviceCapabilities {
    /// Returns `true` if `format` is creatable.
    pub fn supports_texture_format(&self, format: TextureFormat) -> bool {
        self.texture_formats.contains(&format)
    }

    /// Returns `true` if `dimension` is creatable.
    pub fn supports_texture_dimension(&self, dimension: TextureDimension) -> bool {
        self.texture_dimensions.contains(&dimension)
    }

    /// Returns `true` if `format` is accepted in input layouts.
    pub fn supports_vertex_format(&self, format: VertexFormat) -> bool {
        self.vertex_formats.contains(&format)
    }

    /// Returns `true` if `stage` is creatable.
    pub fn supports_shader_stage(&self, stage: ShaderStage) -> bool {
        self.shader_stages.contains(&stage)
    }
}

/// Counters accumulated by a device since creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatistics {
    /// Queue submissions.
    pub submissions: u64,
    /// Command lists executed.
    pub command_lists_executed: u64,
    /// Draw calls, counting each indirect record.
    pub draw_calls: u64,
    /// Instances drawn.
    pub instances: u64,
    /// Vertices or indices processed.
    pub vertices: u64,
    /// Framebuffer clears.
    pub clears: u64,
    /// Texture and buffer copies.
    pub copies: u64,
    /// Resources currently alive on the device.
    pub live_resources: u64,
}
