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

//! Framebuffer layouts, framebuffers and the per-draw viewport state.

use super::common::TextureFormat;
use crate::lumen_bitflags;
use crate::renderer::object::{GraphicsFramebufferLayout, GraphicsTexture};
use std::borrow::Cow;
use std::sync::Arc;

/// Format and sample count of one framebuffer attachment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentLayout {
    /// Texel format of the attached texture.
    pub format: TextureFormat,
    /// Sample count of the attached texture.
    pub sample_count: u32,
}

impl AttachmentLayout {
    /// A single-sampled attachment.
    pub const fn new(format: TextureFormat) -> Self {
        Self {
            format,
            sample_count: 1,
        }
    }
}

/// The attachment formats a framebuffer must provide.
///
/// Pipelines are compiled against a layout, not against concrete framebuffers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferLayoutDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Color attachment slots, in order.
    pub color_attachments: Vec<AttachmentLayout>,
    /// Optional depth-stencil slot.
    pub depth_stencil_attachment: Option<AttachmentLayout>,
}

/// Binds concrete textures to the slots of a layout.
///
/// Attachment textures may be shared between several framebuffers.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// The layout the attachments follow.
    pub layout: Arc<GraphicsFramebufferLayout>,
    /// One texture per color slot.
    pub color_attachments: Vec<Arc<GraphicsTexture>>,
    /// Texture for the depth-stencil slot.
    pub depth_stencil_attachment: Option<Arc<GraphicsTexture>>,
    /// Render area width.
    pub width: u32,
    /// Render area height.
    pub height: u32,
}

lumen_bitflags! {
    /// Aspects touched by a framebuffer clear.
    pub struct ClearFlags: u32 {
        /// Color attachments.
        const COLOR = 1 << 0;
        /// Depth aspect.
        const DEPTH = 1 << 1;
        /// Stencil aspect.
        const STENCIL = 1 << 2;
        /// Depth and stencil aspects.
        const DEPTH_STENCIL = (1 << 1) | (1 << 2);
        /// Every aspect.
        const ALL = 0b111;
    }
}

/// The viewport transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Depth mapped from NDC 0.
    pub min_depth: f32,
    /// Depth mapped from NDC 1.
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport covering `width` x `height` with the full depth range.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scissor {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}
