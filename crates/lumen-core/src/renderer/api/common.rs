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

//! Enums shared by several descriptor kinds.

use crate::lumen_bitflags;
use serde::{Deserialize, Serialize};

/// The family of native API a backend emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsBackendType {
    /// Implicit global state; recorded commands execute at call time.
    #[default]
    Immediate,
    /// Manual command buffers, descriptor pools and queue submission.
    Explicit,
}

/// The kind of adapter a device runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererDeviceType {
    /// Integrated GPU.
    IntegratedGpu,
    /// Discrete GPU.
    DiscreteGpu,
    /// Virtualized GPU.
    VirtualGpu,
    /// Software rasterizer running on the CPU.
    Cpu,
    /// Unknown.
    #[default]
    Unknown,
}

/// Identification of the adapter behind a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererAdapterInfo {
    /// Adapter name.
    pub name: String,
    /// Backend family.
    pub backend_type: GraphicsBackendType,
    /// Adapter kind.
    pub device_type: RendererDeviceType,
}

/// Pixel formats for textures and attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit normalized red.
    R8Unorm,
    /// 8-bit normalized red and green.
    Rg8Unorm,
    /// 8-bit normalized RGBA.
    Rgba8Unorm,
    /// 8-bit RGBA with sRGB encoded color channels.
    Rgba8UnormSrgb,
    /// 8-bit normalized BGRA.
    Bgra8Unorm,
    /// 8-bit BGRA with sRGB encoded color channels.
    Bgra8UnormSrgb,
    /// 16-bit float red.
    R16Float,
    /// 16-bit float RGBA.
    Rgba16Float,
    /// 32-bit float red.
    R32Float,
    /// 32-bit float red and green.
    Rg32Float,
    /// 32-bit float RGBA.
    Rgba32Float,
    /// 32-bit unsigned integer red.
    R32Uint,
    /// 16-bit normalized depth.
    Depth16Unorm,
    /// 24-bit depth packed with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// Every format, in declaration order.
    pub const ALL: [TextureFormat; 15] = [
        TextureFormat::R8Unorm,
        TextureFormat::Rg8Unorm,
        TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb,
        TextureFormat::R16Float,
        TextureFormat::Rgba16Float,
        TextureFormat::R32Float,
        TextureFormat::Rg32Float,
        TextureFormat::Rgba32Float,
        TextureFormat::R32Uint,
        TextureFormat::Depth16Unorm,
        TextureFormat::Depth24PlusStencil8,
        TextureFormat::Depth32Float,
    ];

    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm | TextureFormat::R16Float | TextureFormat::Depth16Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::R32Float
            | TextureFormat::R32Uint
            | TextureFormat::Depth24PlusStencil8
            | TextureFormat::Depth32Float => 4,
            TextureFormat::Rgba16Float | TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    /// Returns `true` for depth and depth-stencil formats.
    pub const fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm | TextureFormat::Depth24PlusStencil8 | TextureFormat::Depth32Float
        )
    }

    /// Returns `true` if the format carries a stencil aspect.
    pub const fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::Depth24PlusStencil8)
    }

    /// Returns `true` if color channels are stored sRGB encoded.
    pub const fn is_srgb(&self) -> bool {
        matches!(self, TextureFormat::Rgba8UnormSrgb | TextureFormat::Bgra8UnormSrgb)
    }
}

/// Formats of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One `f32`.
    Float32,
    /// Two `f32`.
    Float32x2,
    /// Three `f32`.
    Float32x3,
    /// Four `f32`.
    Float32x4,
    /// Two `f16`.
    Float16x2,
    /// Four `f16`.
    Float16x4,
    /// One `u32`.
    Uint32,
    /// One `i32`.
    Sint32,
    /// Four `u8`.
    Uint8x4,
    /// Four normalized `u8`.
    Unorm8x4,
    /// Two normalized `i16`.
    Snorm16x2,
}

impl VertexFormat {
    /// Every vertex format, in declaration order.
    pub const ALL: [VertexFormat; 11] = [
        VertexFormat::Float32,
        VertexFormat::Float32x2,
        VertexFormat::Float32x3,
        VertexFormat::Float32x4,
        VertexFormat::Float16x2,
        VertexFormat::Float16x4,
        VertexFormat::Uint32,
        VertexFormat::Sint32,
        VertexFormat::Uint8x4,
        VertexFormat::Unorm8x4,
        VertexFormat::Snorm16x2,
    ];

    /// Size of the attribute in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 4,
            VertexFormat::Uint8x4 | VertexFormat::Unorm8x4 => 4,
            VertexFormat::Float16x2 | VertexFormat::Snorm16x2 => 4,
            VertexFormat::Float32x2 | VertexFormat::Float16x4 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// Element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Geometry stage.
    Geometry,
    /// Tessellation control stage.
    TessControl,
    /// Tessellation evaluation stage.
    TessEvaluation,
    /// Compute stage.
    Compute,
}

impl ShaderStage {
    /// Every stage, in pipeline order.
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];
}

lumen_bitflags! {
    /// A set of shader stages, used for binding visibility.
    pub struct ShaderStageFlags: u32 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Fragment stage.
        const FRAGMENT = 1 << 1;
        /// Geometry stage.
        const GEOMETRY = 1 << 2;
        /// Tessellation control stage.
        const TESS_CONTROL = 1 << 3;
        /// Tessellation evaluation stage.
        const TESS_EVALUATION = 1 << 4;
        /// Compute stage.
        const COMPUTE = 1 << 5;
        /// Vertex and fragment stages.
        const VERTEX_FRAGMENT = (1 << 0) | (1 << 1);
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::TessControl => ShaderStageFlags::TESS_CONTROL,
            ShaderStage::TessEvaluation => ShaderStageFlags::TESS_EVALUATION,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

/// Comparison used by depth tests, stencil tests and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if new < old.
    #[default]
    Less,
    /// Passes if new == old.
    Equal,
    /// Passes if new <= old.
    LessEqual,
    /// Passes if new > old.
    Greater,
    /// Passes if new != old.
    NotEqual,
    /// Passes if new >= old.
    GreaterEqual,
    /// Always passes.
    Always,
}
