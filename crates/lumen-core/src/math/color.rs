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

//! Linear-space RGBA color.

/// A color in linear RGBA space with `f32` components.
///
/// Values above `1.0` are allowed for HDR targets; encoding into a normalized
/// texture format clamps them.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, serde::Serialize, serde::Deserialize)]
#[repr(C)]
pub struct LinearRgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);

    /// Creates a color from all four components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Converts the color channels to the sRGB transfer curve, leaving alpha linear.
    pub fn to_srgb(self) -> Self {
        fn encode(c: f32) -> f32 {
            let c = c.clamp(0.0, 1.0);
            if c <= 0.003_130_8 {
                c * 12.92
            } else {
                1.055 * c.powf(1.0 / 2.4) - 0.055
            }
        }
        Self::new(encode(self.r), encode(self.g), encode(self.b), self.a)
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_srgb_endpoints_are_fixed() {
        let c = LinearRgba::new(0.0, 1.0, 2.0, 0.5).to_srgb();
        assert_relative_eq!(c.r, 0.0);
        assert_relative_eq!(c.g, 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.b, 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.a, 0.5);
    }

    #[test]
    fn test_srgb_midtone_brightens() {
        let c = LinearRgba::rgb(0.5, 0.5, 0.5).to_srgb();
        assert!(c.r > 0.7 && c.r < 0.75);
    }
}
