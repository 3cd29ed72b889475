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

use super::{Creatable, DeviceChild, DeviceRef, GraphicsObject, PipelineChild, ResourceHandle};
use crate::renderer::api::{ProgramDescriptor, ProgramUniform, ShaderStageFlags};

/// A linked set of shader stages with its merged uniform reflection.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GraphicsProgram {
    object: GraphicsObject<ProgramDescriptor>,
    uniforms: Vec<ProgramUniform>,
}

impl GraphicsProgram {
    /// Creates a program from its object body and reflected uniforms.
    pub fn new(object: GraphicsObject<ProgramDescriptor>, uniforms: Vec<ProgramUniform>) -> Self {
        Self { object, uniforms }
    }

    /// The active uniforms, ordered by first appearance across stages.
    pub fn active_uniforms(&self) -> &[ProgramUniform] {
        &self.uniforms
    }

    /// Looks up an active uniform by name.
    pub fn uniform(&self, name: &str) -> Option<&ProgramUniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// Stages linked into the program.
    pub fn stages(&self) -> ShaderStageFlags {
        self.object
            .descriptor()
            .shaders
            .iter()
            .fold(ShaderStageFlags::EMPTY, |acc, s| {
                acc | ShaderStageFlags::from(s.descriptor().stage)
            })
    }
}

impl DeviceChild for GraphicsProgram {
    fn handle(&self) -> ResourceHandle {
        self.object.handle()
    }

    fn device_ref(&self) -> &DeviceRef {
        self.object.device_ref()
    }
}

impl Creatable for GraphicsProgram {
    type Descriptor = ProgramDescriptor;

    fn descriptor(&self) -> &ProgramDescriptor {
        self.object.descriptor()
    }
}

impl PipelineChild for GraphicsProgram {}
