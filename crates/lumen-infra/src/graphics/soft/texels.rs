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

//! Texel encoding for clears.

use lumen_core::math::LinearRgba;
use lumen_core::renderer::TextureFormat;

fn unorm8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Encodes `color` as one texel of a color `format`.
///
/// Returns `None` for depth formats and formats the software backends do not store.
pub fn encode_color(format: TextureFormat, color: LinearRgba) -> Option<Vec<u8>> {
    let srgb = if format.is_srgb() {
        let encoded = color.to_srgb();
        LinearRgba::new(encoded.r, encoded.g, encoded.b, color.a)
    } else {
        color
    };
    let texel = match format {
        TextureFormat::R8Unorm => vec![unorm8(color.r)],
        TextureFormat::Rg8Unorm => vec![unorm8(color.r), unorm8(color.g)],
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => {
            vec![unorm8(srgb.r), unorm8(srgb.g), unorm8(srgb.b), unorm8(srgb.a)]
        }
        TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => {
            vec![unorm8(srgb.b), unorm8(srgb.g), unorm8(srgb.r), unorm8(srgb.a)]
        }
        TextureFormat::R32Float => color.r.to_le_bytes().to_vec(),
        TextureFormat::Rg32Float => bytemuck::cast_slice(&[color.r, color.g]).to_vec(),
        TextureFormat::Rgba32Float => bytemuck::bytes_of(&color).to_vec(),
        TextureFormat::R32Uint => (color.r.max(0.0) as u32).to_le_bytes().to_vec(),
        TextureFormat::R16Float
        | TextureFormat::Rgba16Float
        | TextureFormat::Depth16Unorm
        | TextureFormat::Depth24PlusStencil8
        | TextureFormat::Depth32Float => return None,
    };
    Some(texel)
}

/// Overwrites the depth and/or stencil aspect of one depth texel in place.
pub fn write_depth_stencil(
    format: TextureFormat,
    texel: &mut [u8],
    depth: Option<f32>,
    stencil: Option<u32>,
) {
    match format {
        TextureFormat::Depth16Unorm => {
            if let Some(d) = depth {
                let v = (d.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16;
                texel.copy_from_slice(&v.to_le_bytes());
            }
        }
        TextureFormat::Depth32Float => {
            if let Some(d) = depth {
                texel.copy_from_slice(&d.to_le_bytes());
            }
        }
        TextureFormat::Depth24PlusStencil8 => {
            let mut packed = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
            if let Some(d) = depth {
                let d24 = (d.clamp(0.0, 1.0) * 0x00ff_ffff as f32).round() as u32;
                packed = (packed & 0xff00_0000) | d24;
            }
            if let Some(s) = stencil {
                packed = (packed & 0x00ff_ffff) | ((s & 0xff) << 24);
            }
            texel.copy_from_slice(&packed.to_le_bytes());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_black_is_opaque() {
        assert_eq!(
            encode_color(TextureFormat::Rgba8Unorm, LinearRgba::new(0.0, 0.0, 0.0, 1.0)),
            Some(vec![0, 0, 0, 255])
        );
    }

    #[test]
    fn test_bgra_swizzles_channels() {
        assert_eq!(
            encode_color(TextureFormat::Bgra8Unorm, LinearRgba::RED),
            Some(vec![0, 0, 255, 255])
        );
    }

    #[test]
    fn test_srgb_encodes_color_but_not_alpha() {
        let texel = encode_color(TextureFormat::Rgba8UnormSrgb, LinearRgba::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(texel, Some(vec![188, 188, 188, 128]));
    }

    #[test]
    fn test_depth_stencil_aspects_are_independent() {
        let mut texel = [0u8; 4];
        write_depth_stencil(TextureFormat::Depth24PlusStencil8, &mut texel, None, Some(7));
        write_depth_stencil(TextureFormat::Depth24PlusStencil8, &mut texel, Some(1.0), None);
        assert_eq!(u32::from_le_bytes(texel), 0x07ff_ffff);
    }
}
