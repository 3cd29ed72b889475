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

//! Materials: named parameters plus one technique per render queue.
//!
//! A [`Material`] owns its [`MaterialParam`]s and [`MaterialTech`]s. Each
//! technique holds ordered [`MaterialPass`]es, and each pass binds one program
//! and fixed-function state. Setting a pass up matches the program's active
//! uniforms against the material's parameters by name: semantic parameters and
//! bare semantic names read the [`MaterialSemanticTable`], local parameters feed
//! the descriptor set whenever their value changes.

mod binding;
mod parameter;
mod semantic;
mod technique;

pub use self::binding::{MaterialBinding, UniformSlot, UniformSource};
pub use self::parameter::MaterialParam;
pub use self::semantic::{CameraSemantics, GlobalSemantic, MaterialSemanticTable};
pub use self::technique::{MaterialPass, MaterialTech};

use crate::math::Mat4;
use crate::renderer::api::{RenderQueue, UniformType, UniformValue};
use crate::renderer::error::MaterialError;
use crate::renderer::object::{GraphicsDescriptorPool, GraphicsSampler, GraphicsTexture};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique material identity, used to group draws by material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A material.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    name: String,
    params: Vec<Arc<MaterialParam>>,
    techniques: Vec<MaterialTech>,
}

impl Material {
    /// An empty material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.into(),
            params: Vec::new(),
            techniques: Vec::new(),
        }
    }

    /// Material identity.
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a parameter. Names are unique within a material.
    pub fn add_parameter(&mut self, param: MaterialParam) -> Result<Arc<MaterialParam>, MaterialError> {
        if self.get_parameter(param.name()).is_some() {
            return Err(MaterialError::DuplicateParameter(param.name().to_string()));
        }
        let param = Arc::new(param);
        self.params.push(param.clone());
        Ok(param)
    }

    /// Adds a technique, replacing any previous technique of the same queue.
    pub fn add_technique(&mut self, technique: MaterialTech) {
        if let Some(pos) = self.techniques.iter().position(|t| t.queue() == technique.queue()) {
            log::debug!(
                "Material '{}' replaces its {:?} technique",
                self.name,
                technique.queue()
            );
            self.techniques.remove(pos);
        }
        self.techniques.push(technique);
    }

    /// The parameter called `name`. Absence is a normal answer, not an error.
    pub fn get_parameter(&self, name: &str) -> Option<&Arc<MaterialParam>> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// Every parameter, in insertion order.
    pub fn parameters(&self) -> &[Arc<MaterialParam>] {
        &self.params
    }

    /// The technique drawing in `queue`.
    pub fn get_technique(&self, queue: RenderQueue) -> Option<&MaterialTech> {
        self.techniques.iter().find(|t| t.queue() == queue)
    }

    /// Every technique.
    pub fn techniques(&self) -> &[MaterialTech] {
        &self.techniques
    }

    fn param(&self, name: &str) -> Result<&Arc<MaterialParam>, MaterialError> {
        self.get_parameter(name)
            .ok_or_else(|| MaterialError::UnknownParameter(name.to_string()))
    }

    /// Assigns any value to the parameter called `name`.
    pub fn set_value(&self, name: &str, value: UniformValue) -> Result<(), MaterialError> {
        self.param(name)?.set(value)
    }

    /// Assigns a `float`.
    pub fn uniform1f(&self, name: &str, x: f32) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Float(x))
    }

    /// Assigns a `vec2`.
    pub fn uniform2f(&self, name: &str, x: f32, y: f32) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Float2([x, y]))
    }

    /// Assigns a `vec3`.
    pub fn uniform3f(&self, name: &str, x: f32, y: f32, z: f32) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Float3([x, y, z]))
    }

    /// Assigns a `vec4`.
    pub fn uniform4f(&self, name: &str, x: f32, y: f32, z: f32, w: f32) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Float4([x, y, z, w]))
    }

    /// Assigns an `int`.
    pub fn uniform1i(&self, name: &str, x: i32) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Int(x))
    }

    /// Assigns a `mat4`.
    pub fn uniform_mat4(&self, name: &str, m: &Mat4) -> Result<(), MaterialError> {
        self.set_value(name, UniformValue::Float4x4(*m))
    }

    /// Assigns a texture, wrapped according to the parameter's declared type.
    pub fn uniform_texture(
        &self,
        name: &str,
        texture: Arc<GraphicsTexture>,
        sampler: Option<Arc<GraphicsSampler>>,
    ) -> Result<(), MaterialError> {
        let param = self.param(name)?;
        let value = match param.ty() {
            UniformType::SampledImage => UniformValue::SampledImage(texture),
            UniformType::StorageImage => UniformValue::StorageImage(texture),
            _ => UniformValue::CombinedImageSampler(texture, sampler),
        };
        param.set(value)
    }

    /// Sets up every pass of every technique, allocating descriptor sets from
    /// `pool`. On failure, passes set up by this call are closed again.
    pub fn setup(&self, pool: &Arc<GraphicsDescriptorPool>) -> Result<(), MaterialError> {
        let passes = self.techniques.iter().flat_map(|t| t.passes());
        for (done, pass) in passes.clone().enumerate() {
            if let Err(err) = pass.setup(self, pool) {
                passes.take(done).for_each(|p| p.close());
                log::warn!("Failed to set up material '{}': {err}", self.name);
                return Err(err);
            }
        }
        log::debug!("Material '{}' set up", self.name);
        Ok(())
    }

    /// Returns `true` once every pass is set up.
    pub fn is_setup(&self) -> bool {
        self.techniques
            .iter()
            .flat_map(|t| t.passes())
            .all(|p| p.is_setup())
    }

    /// Tears down every pass.
    pub fn close(&self) {
        for pass in self.techniques.iter().flat_map(|t| t.passes()) {
            pass.close();
        }
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names_are_unique() {
        let mut material = Material::new("rock");
        material
            .add_parameter(MaterialParam::new("albedo", UniformType::Float4))
            .unwrap();
        let err = material.add_parameter(MaterialParam::new("albedo", UniformType::Float3));
        assert_eq!(err.unwrap_err(), MaterialError::DuplicateParameter("albedo".into()));
    }

    #[test]
    fn test_missing_parameter_is_none() {
        let material = Material::new("rock");
        assert!(material.get_parameter("albedo").is_none());
        assert!(matches!(
            material.uniform1f("albedo", 1.0),
            Err(MaterialError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_uniform_setters_check_types() {
        let mut material = Material::new("rock");
        material
            .add_parameter(MaterialParam::new("tint", UniformType::Float3))
            .unwrap();
        material.uniform3f("tint", 1.0, 0.5, 0.25).unwrap();
        assert!(material.uniform4f("tint", 1.0, 1.0, 1.0, 1.0).is_err());
        assert_eq!(
            material.get_parameter("tint").and_then(|p| p.value()),
            Some(UniformValue::Float3([1.0, 0.5, 0.25]))
        );
    }

    #[test]
    fn test_material_ids_are_distinct() {
        assert_ne!(Material::new("a").id(), Material::new("b").id());
    }

    #[test]
    fn test_technique_replaced_per_queue() {
        let mut material = Material::new("glass");
        material.add_technique(MaterialTech::new("first", RenderQueue::Transparent));
        material.add_technique(MaterialTech::new("second", RenderQueue::Transparent));
        assert_eq!(material.techniques().len(), 1);
        assert_eq!(
            material.get_technique(RenderQueue::Transparent).map(|t| t.name()),
            Some("second")
        );
    }
}
