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

//! Texture and sampler descriptors.

use super::common::{CompareFunction, TextureFormat};
use crate::lumen_bitflags;
use crate::math::Extent3D;
use std::borrow::Cow;

/// The shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// One dimensional.
    D1,
    /// Two dimensional.
    D2,
    /// Array of 2D layers.
    D2Array,
    /// Three dimensional.
    D3,
    /// Six-faced cube map; `depth_or_array_layers` must be 6.
    Cube,
    /// Array of cube maps; layers must be a multiple of 6.
    CubeArray,
}

impl TextureDimension {
    /// Every dimension, in declaration order.
    pub const ALL: [TextureDimension; 6] = [
        TextureDimension::D1,
        TextureDimension::D2,
        TextureDimension::D2Array,
        TextureDimension::D3,
        TextureDimension::Cube,
        TextureDimension::CubeArray,
    ];
}

lumen_bitflags! {
    /// How a texture may be used after creation.
    pub struct TextureUsage: u32 {
        /// Source of copies and readback.
        const COPY_SRC = 1 << 0;
        /// Destination of copies and uploads.
        const COPY_DST = 1 << 1;
        /// Sampled from shaders.
        const TEXTURE_BINDING = 1 << 2;
        /// Read/write storage image.
        const STORAGE_BINDING = 1 << 3;
        /// Color or depth attachment of a framebuffer.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Describes a texture to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Size of mip level 0.
    pub size: Extent3D,
    /// Number of mip levels, at least 1.
    pub mip_level_count: u32,
    /// Samples per texel, 1 for non-multisampled textures.
    pub sample_count: u32,
    /// Shape of the texture.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
    /// Tightly packed texels of mip level 0 for every layer, or `None` for
    /// zero-initialized contents.
    pub data: Option<Vec<u8>>,
}

impl TextureDescriptor {
    /// A single-level, single-sampled 2D texture without initial data.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3D::new_2d(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage,
            data: None,
        }
    }

    /// Byte size of one mip level across all layers.
    pub fn mip_level_byte_size(&self, level: u32) -> u64 {
        let e = self.size.mip_level_size(level, self.dimension == TextureDimension::D3);
        e.width as u64 * e.height as u64 * e.depth_or_array_layers as u64 * self.format.bytes_per_texel() as u64
    }
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// Addressing outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Wrap around.
    Repeat,
    /// Wrap around, mirrored every other repeat.
    MirrorRepeat,
    /// Return the border color.
    ClampToBorder,
}

/// Describes a sampler to create.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// U addressing.
    pub address_mode_u: AddressMode,
    /// V addressing.
    pub address_mode_v: AddressMode,
    /// W addressing.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
    /// Lowest mip level accessible.
    pub lod_min_clamp: f32,
    /// Highest mip level accessible.
    pub lod_max_clamp: f32,
    /// Comparison for shadow samplers.
    pub compare: Option<CompareFunction>,
    /// Maximum anisotropy, 1 disables anisotropic filtering.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::default(),
            address_mode_v: AddressMode::default(),
            address_mode_w: AddressMode::default(),
            mag_filter: FilterMode::default(),
            min_filter: FilterMode::default(),
            mipmap_filter: FilterMode::default(),
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}
