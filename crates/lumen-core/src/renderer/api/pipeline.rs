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

//! Input layouts, fixed-function state and pipeline state object descriptors.

use super::common::{CompareFunction, VertexFormat};
use crate::lumen_bitflags;
use crate::renderer::object::{
    GraphicsDescriptorSetLayout, GraphicsFramebufferLayout, GraphicsInputLayout, GraphicsProgram,
    GraphicsState,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Per vertex.
    #[default]
    Vertex,
    /// Per instance.
    Instance,
}

/// One attribute inside a vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Data format.
    pub format: VertexFormat,
    /// Byte offset inside one element.
    pub offset: u64,
}

/// Layout of one vertex buffer slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Bytes between consecutive elements.
    pub stride: u64,
    /// Step mode.
    pub step_mode: VertexStepMode,
    /// Attributes read from this buffer.
    pub attributes: Vec<VertexAttribute>,
}

/// Describes how vertex buffers feed the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputLayoutDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// One entry per vertex buffer slot.
    pub buffers: Vec<VertexBufferLayout>,
}

/// Primitive assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Points.
    PointList,
    /// Separate lines.
    LineList,
    /// Connected lines.
    LineStrip,
    /// Separate triangles.
    #[default]
    TriangleList,
    /// Connected triangles.
    TriangleStrip,
}

/// Winding of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// Which faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Nothing is culled.
    None,
    /// Front faces are culled.
    Front,
    /// Back faces are culled.
    #[default]
    Back,
}

/// Polygon fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Filled.
    #[default]
    Fill,
    /// Wireframe.
    Line,
    /// Vertices only.
    Point,
}

/// Rasterizer state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RasterState {
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Front face winding.
    pub front_face: FrontFace,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Fill mode.
    pub polygon_mode: PolygonMode,
    /// Constant depth bias.
    pub depth_bias: i32,
    /// Slope scaled depth bias.
    pub depth_bias_slope_scale: f32,
    /// Scissor test enable.
    pub scissor_test: bool,
}

/// Blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 0.
    Zero,
    /// 1.
    One,
    /// Source color.
    Src,
    /// 1 - source color.
    OneMinusSrc,
    /// Source alpha.
    SrcAlpha,
    /// 1 - source alpha.
    OneMinusSrcAlpha,
    /// Destination color.
    Dst,
    /// 1 - destination color.
    OneMinusDst,
    /// Destination alpha.
    DstAlpha,
    /// 1 - destination alpha.
    OneMinusDstAlpha,
}

/// Blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// src + dst.
    #[default]
    Add,
    /// src - dst.
    Subtract,
    /// dst - src.
    ReverseSubtract,
    /// min(src, dst).
    Min,
    /// max(src, dst).
    Max,
}

/// One blend equation for color or alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Source factor.
    pub src_factor: BlendFactor,
    /// Destination factor.
    pub dst_factor: BlendFactor,
    /// Operation.
    pub operation: BlendOperation,
}

impl BlendComponent {
    /// Replaces the destination with the source.
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };

    /// Standard alpha blending.
    pub const OVER: Self = Self {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
}

lumen_bitflags! {
    /// Color channels written by a color attachment.
    pub struct ColorWrites: u32 {
        /// Red.
        const RED = 1 << 0;
        /// Green.
        const GREEN = 1 << 1;
        /// Blue.
        const BLUE = 1 << 2;
        /// Alpha.
        const ALPHA = 1 << 3;
        /// All channels.
        const ALL = 0b1111;
    }
}

/// Blend state of one color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBlendState {
    /// Whether blending is enabled.
    pub enabled: bool,
    /// Color equation.
    pub color: BlendComponent,
    /// Alpha equation.
    pub alpha: BlendComponent,
    /// Written channels.
    pub write_mask: ColorWrites,
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            color: BlendComponent::REPLACE,
            alpha: BlendComponent::REPLACE,
            write_mask: ColorWrites::ALL,
        }
    }
}

/// Stencil operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the value.
    #[default]
    Keep,
    /// Write zero.
    Zero,
    /// Write the reference value.
    Replace,
    /// Increment and clamp.
    IncrementClamp,
    /// Decrement and clamp.
    DecrementClamp,
    /// Bitwise invert.
    Invert,
}

/// Stencil behavior of one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// Comparison against the reference.
    pub compare: CompareFunction,
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both pass.
    pub pass_op: StencilOperation,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
        }
    }
}

/// Depth and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Depth test enable.
    pub depth_test: bool,
    /// Depth write enable.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Stencil test enable.
    pub stencil_test: bool,
    /// Front face stencil.
    pub stencil_front: StencilFaceState,
    /// Back face stencil.
    pub stencil_back: StencilFaceState,
    /// Stencil read mask.
    pub stencil_read_mask: u32,
    /// Stencil write mask.
    pub stencil_write_mask: u32,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            stencil_test: false,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
        }
    }
}

/// Rasterizer, blend, depth and stencil state of a pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Rasterizer state.
    pub raster: RasterState,
    /// Blend state per color attachment, in attachment order.
    pub color_blends: Vec<ColorBlendState>,
    /// Depth and stencil state.
    pub depth_stencil: DepthStencilState,
}

/// Composition of a pipeline state object.
///
/// Every component must come from the same device. The pipeline keeps them
/// alive for as long as it exists.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Linked program.
    pub program: Arc<GraphicsProgram>,
    /// Vertex input layout.
    pub input_layout: Arc<GraphicsInputLayout>,
    /// Layout of the descriptor set bound with the pipeline.
    pub descriptor_set_layout: Arc<GraphicsDescriptorSetLayout>,
    /// Layout of the framebuffers the pipeline renders into.
    pub framebuffer_layout: Arc<GraphicsFramebufferLayout>,
    /// Fixed-function state.
    pub state: Arc<GraphicsState>,
}
