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

//! Shader and program descriptors, and the uniform type system.

use super::common::{ShaderStage, ShaderStageFlags};
use crate::renderer::object::GraphicsShader;
use std::borrow::Cow;
use std::sync::Arc;

/// The type of a shader uniform or descriptor binding.
///
/// Value types live in the set's uniform block; resource types occupy a
/// descriptor slot of the pool the set was allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `bool`.
    Bool,
    /// `int`.
    Int,
    /// `ivec2`.
    Int2,
    /// `ivec3`.
    Int3,
    /// `ivec4`.
    Int4,
    /// `uint`.
    UInt,
    /// `float`.
    Float,
    /// `vec2`.
    Float2,
    /// `vec3`.
    Float3,
    /// `vec4`.
    Float4,
    /// `mat3`.
    Float3x3,
    /// `mat4`.
    Float4x4,
    /// `float[]`.
    FloatArray,
    /// A standalone sampler.
    Sampler,
    /// A sampled texture without a sampler.
    SampledImage,
    /// A texture paired with a sampler.
    CombinedImageSampler,
    /// A read/write storage image.
    StorageImage,
    /// A uniform buffer.
    UniformBuffer,
    /// A storage buffer.
    StorageBuffer,
}

impl UniformType {
    /// Returns `true` for types that reference a GPU resource.
    pub const fn is_resource(&self) -> bool {
        matches!(
            self,
            UniformType::Sampler
                | UniformType::SampledImage
                | UniformType::CombinedImageSampler
                | UniformType::StorageImage
                | UniformType::UniformBuffer
                | UniformType::StorageBuffer
        )
    }
}

/// A uniform declared by a shader stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderUniformDescriptor {
    /// Name as written in the shader.
    pub name: Cow<'static, str>,
    /// Declared type.
    pub ty: UniformType,
}

impl ShaderUniformDescriptor {
    /// Convenience constructor.
    pub fn new(name: impl Into<Cow<'static, str>>, ty: UniformType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Describes one shader stage.
///
/// The bytecode is opaque to the abstraction layer; the uniform list is the
/// reflection data supplied alongside it by the shading-language front end.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Stage this shader runs in.
    pub stage: ShaderStage,
    /// Compiled or source byte stream.
    pub bytecode: Vec<u8>,
    /// Entry point name.
    pub entry_point: Cow<'static, str>,
    /// Uniforms the stage reads.
    pub uniforms: Vec<ShaderUniformDescriptor>,
}

/// Describes a program linking several shader stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// One shader per stage.
    pub shaders: Vec<Arc<GraphicsShader>>,
}

/// An active uniform of a linked program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramUniform {
    /// Uniform name.
    pub name: String,
    /// Uniform type, identical across stages.
    pub ty: UniformType,
    /// Stages reading the uniform.
    pub stages: ShaderStageFlags,
}
