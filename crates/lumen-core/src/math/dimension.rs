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

//! Integer extents and origins for texture regions.

use serde::{Deserialize, Serialize};

/// Width, height and depth (or array layer count) of a texture or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth for 3D textures, array layer count otherwise.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// A 2D extent with a single layer.
    pub const fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// The extent of mip `level`, never smaller than one texel per axis.
    ///
    /// Depth shrinks only when `is_3d` is set; array layers are preserved.
    pub fn mip_level_size(&self, level: u32, is_3d: bool) -> Self {
        let shrink = |v: u32| (v >> level.min(31)).max(1);
        Self {
            width: shrink(self.width),
            height: shrink(self.height),
            depth_or_array_layers: if is_3d {
                shrink(self.depth_or_array_layers)
            } else {
                self.depth_or_array_layers
            },
        }
    }

    /// Returns `true` if any axis is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth_or_array_layers == 0
    }
}

/// The texel offset of a region inside a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin3D {
    /// X offset.
    pub x: u32,
    /// Y offset.
    pub y: u32,
    /// Z offset or first array layer.
    pub z: u32,
}

impl Origin3D {
    /// The zero origin.
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_size_clamps_to_one() {
        let e = Extent3D {
            width: 256,
            height: 64,
            depth_or_array_layers: 6,
        };
        assert_eq!(e.mip_level_size(3, false), Extent3D { width: 32, height: 8, depth_or_array_layers: 6 });
        assert_eq!(e.mip_level_size(10, true), Extent3D { width: 1, height: 1, depth_or_array_layers: 1 });
    }
}
