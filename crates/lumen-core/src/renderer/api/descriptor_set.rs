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

//! Descriptor set layouts, pools, sets and the values written into them.

use super::common::ShaderStageFlags;
use super::shader::UniformType;
use crate::lumen_bitflags;
use crate::math::Mat4;
use crate::renderer::object::{
    GraphicsBuffer, GraphicsDescriptorPool, GraphicsDescriptorSet, GraphicsDescriptorSetLayout,
    GraphicsResource, GraphicsSampler, GraphicsTexture,
};
use std::borrow::Cow;
use std::sync::Arc;

/// One binding point of a descriptor set layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// Binding index, unique within the layout.
    pub binding: u32,
    /// Uniform name the binding serves, unique within the layout.
    pub name: Cow<'static, str>,
    /// Type of the bound value.
    pub ty: UniformType,
    /// Stages that see the binding.
    pub stages: ShaderStageFlags,
}

/// Describes the binding points of a descriptor set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Binding points.
    pub bindings: Vec<DescriptorBinding>,
}

lumen_bitflags! {
    /// Behavior of a descriptor pool.
    pub struct DescriptorPoolFlags: u32 {
        /// Sets return their slots to the pool when dropped.
        const FREE_DESCRIPTOR_SET = 1 << 0;
    }
}

/// Capacity of a pool for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorPoolSize {
    /// Resource type.
    pub ty: UniformType,
    /// Number of descriptors of that type.
    pub count: u32,
}

/// Describes a bounded descriptor allocation arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorPoolDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Maximum number of live sets.
    pub max_sets: u32,
    /// Capacity per resource type. Value-typed bindings consume no pool slot.
    pub pool_sizes: Vec<DescriptorPoolSize>,
    /// Pool behavior.
    pub flags: DescriptorPoolFlags,
}

/// Describes a set allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSetDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Layout the set follows.
    pub layout: Arc<GraphicsDescriptorSetLayout>,
    /// Pool the set is carved from.
    pub pool: Arc<GraphicsDescriptorPool>,
}

/// A value bound to a uniform or descriptor binding.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `bool`.
    Bool(bool),
    /// `int`.
    Int(i32),
    /// `ivec2`.
    Int2([i32; 2]),
    /// `ivec3`.
    Int3([i32; 3]),
    /// `ivec4`.
    Int4([i32; 4]),
    /// `uint`.
    UInt(u32),
    /// `float`.
    Float(f32),
    /// `vec2`.
    Float2([f32; 2]),
    /// `vec3`.
    Float3([f32; 3]),
    /// `vec4`.
    Float4([f32; 4]),
    /// `mat3`, column-major.
    Float3x3([f32; 9]),
    /// `mat4`.
    Float4x4(Mat4),
    /// `float[]`.
    FloatArray(Vec<f32>),
    /// A sampler.
    Sampler(Arc<GraphicsSampler>),
    /// A sampled texture.
    SampledImage(Arc<GraphicsTexture>),
    /// A texture with an optional sampler; `None` uses the backend default sampler.
    CombinedImageSampler(Arc<GraphicsTexture>, Option<Arc<GraphicsSampler>>),
    /// A storage image.
    StorageImage(Arc<GraphicsTexture>),
    /// A uniform buffer.
    UniformBuffer(Arc<GraphicsBuffer>),
    /// A storage buffer.
    StorageBuffer(Arc<GraphicsBuffer>),
}

impl UniformValue {
    /// The type of the value.
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Bool(_) => UniformType::Bool,
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Int2(_) => UniformType::Int2,
            UniformValue::Int3(_) => UniformType::Int3,
            UniformValue::Int4(_) => UniformType::Int4,
            UniformValue::UInt(_) => UniformType::UInt,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Float2(_) => UniformType::Float2,
            UniformValue::Float3(_) => UniformType::Float3,
            UniformValue::Float4(_) => UniformType::Float4,
            UniformValue::Float3x3(_) => UniformType::Float3x3,
            UniformValue::Float4x4(_) => UniformType::Float4x4,
            UniformValue::FloatArray(_) => UniformType::FloatArray,
            UniformValue::Sampler(_) => UniformType::Sampler,
            UniformValue::SampledImage(_) => UniformType::SampledImage,
            UniformValue::CombinedImageSampler(..) => UniformType::CombinedImageSampler,
            UniformValue::StorageImage(_) => UniformType::StorageImage,
            UniformValue::UniformBuffer(_) => UniformType::UniformBuffer,
            UniformValue::StorageBuffer(_) => UniformType::StorageBuffer,
        }
    }

    /// The GPU resources the value references.
    pub fn resources(&self) -> Vec<GraphicsResource> {
        match self {
            UniformValue::Sampler(s) => vec![GraphicsResource::Sampler(s.clone())],
            UniformValue::SampledImage(t) | UniformValue::StorageImage(t) => {
                vec![GraphicsResource::Texture(t.clone())]
            }
            UniformValue::CombinedImageSampler(t, s) => {
                let mut out = vec![GraphicsResource::Texture(t.clone())];
                out.extend(s.iter().cloned().map(GraphicsResource::Sampler));
                out
            }
            UniformValue::UniformBuffer(b) | UniformValue::StorageBuffer(b) => {
                vec![GraphicsResource::Buffer(b.clone())]
            }
            _ => Vec::new(),
        }
    }

    /// Packs a value type as std140-free tightly packed bytes. Resources yield `None`.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let bytes = match self {
            UniformValue::Bool(v) => bytemuck::bytes_of(&(*v as u32)).to_vec(),
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Int2(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Int3(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Int4(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::UInt(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Float2(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Float3(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Float4(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Float3x3(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Float4x4(m) => bytemuck::bytes_of(m).to_vec(),
            UniformValue::FloatArray(v) => bytemuck::cast_slice(v).to_vec(),
            _ => return None,
        };
        Some(bytes)
    }
}

/// Writes one value into a set binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorWrite {
    /// Target binding index.
    pub binding: u32,
    /// Value to store.
    pub value: UniformValue,
}

/// Copies `count` consecutive bindings from one set to another.
#[derive(Debug, Clone)]
pub struct DescriptorCopy {
    /// Source set.
    pub src: Arc<GraphicsDescriptorSet>,
    /// First source binding index.
    pub src_binding: u32,
    /// Destination set.
    pub dst: Arc<GraphicsDescriptorSet>,
    /// First destination binding index.
    pub dst_binding: u32,
    /// Number of bindings.
    pub count: u32,
}
