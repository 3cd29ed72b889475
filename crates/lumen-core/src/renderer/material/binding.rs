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

use super::parameter::MaterialParam;
use super::semantic::{GlobalSemantic, MaterialSemanticTable};
use super::Material;
use crate::renderer::api::{DescriptorWrite, UniformType};
use crate::renderer::error::MaterialError;
use crate::renderer::object::{GraphicsDescriptorSet, GraphicsProgram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a uniform slot takes its value from.
#[derive(Debug, Clone)]
pub enum UniformSource {
    /// A material-local parameter.
    Local(Arc<MaterialParam>),
    /// The renderer's semantic table.
    Semantic(GlobalSemantic),
}

/// One program uniform bound to its value source.
#[derive(Debug)]
pub struct UniformSlot {
    name: String,
    binding: u32,
    ty: UniformType,
    source: UniformSource,
    needs_update: AtomicBool,
}

impl UniformSlot {
    /// A slot that starts out needing an update.
    pub fn new(name: impl Into<String>, binding: u32, ty: UniformType, source: UniformSource) -> Self {
        Self {
            name: name.into(),
            binding,
            ty,
            source,
            needs_update: AtomicBool::new(true),
        }
    }

    /// Uniform name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor set binding the slot writes.
    pub fn binding(&self) -> u32 {
        self.binding
    }

    /// Uniform type.
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    /// Value source.
    pub fn source(&self) -> &UniformSource {
        &self.source
    }

    /// Flags the slot for rewriting on the next apply.
    pub fn mark_dirty(&self) {
        self.needs_update.store(true, Ordering::Release);
    }

    /// Returns `true` if the slot must be rewritten.
    pub fn needs_update(&self) -> bool {
        self.needs_update.load(Ordering::Acquire)
    }
}

/// The uniform slots of one program, wired to a material and a descriptor set.
///
/// Setup registers every local slot with its parameter; [`close`](Self::close)
/// removes exactly those registrations. Dropping a binding closes it.
#[derive(Debug)]
pub struct MaterialBinding {
    slots: Vec<Arc<UniformSlot>>,
    set: Arc<GraphicsDescriptorSet>,
}

impl MaterialBinding {
    /// Matches every active uniform of `program` to a material parameter or a
    /// global semantic of the same name.
    ///
    /// Uniforms matching neither are left unbound.
    pub fn setup(
        material: &Material,
        program: &GraphicsProgram,
        set: Arc<GraphicsDescriptorSet>,
    ) -> Result<Self, MaterialError> {
        let mut binding = Self {
            slots: Vec::new(),
            set,
        };
        for uniform in program.active_uniforms() {
            let source = match material.get_parameter(&uniform.name) {
                Some(param) => match param.semantic() {
                    Some(semantic) => UniformSource::Semantic(semantic),
                    None => UniformSource::Local(param.clone()),
                },
                None => match GlobalSemantic::from_name(&uniform.name) {
                    Some(semantic) => UniformSource::Semantic(semantic),
                    None => {
                        log::trace!(
                            "Uniform '{}' of material '{}' has no source",
                            uniform.name,
                            material.name()
                        );
                        continue;
                    }
                },
            };
            let declared = match &source {
                UniformSource::Local(param) => param.ty(),
                UniformSource::Semantic(semantic) => semantic.uniform_type(),
            };
            if declared != uniform.ty {
                // Registrations made so far are undone by Drop.
                return Err(MaterialError::TypeMismatch {
                    name: uniform.name.clone(),
                    expected: uniform.ty,
                    actual: declared,
                });
            }
            let Some(index) = binding.set.binding_of(&uniform.name) else {
                continue;
            };
            let slot = Arc::new(UniformSlot::new(uniform.name.clone(), index, uniform.ty, source));
            if let UniformSource::Local(param) = slot.source() {
                param.add_listener(&slot);
            }
            binding.slots.push(slot);
        }
        Ok(binding)
    }

    /// The bound slots.
    pub fn slots(&self) -> &[Arc<UniformSlot>] {
        &self.slots
    }

    /// The descriptor set the slots write into.
    pub fn descriptor_set(&self) -> &Arc<GraphicsDescriptorSet> {
        &self.set
    }

    /// Writes semantic slots from `semantics` and every dirty local slot into
    /// the descriptor set. Returns the number of bindings written.
    pub fn apply(&self, semantics: &MaterialSemanticTable) -> Result<usize, MaterialError> {
        let mut writes = Vec::new();
        let mut refreshed = Vec::new();
        for slot in &self.slots {
            let value = match slot.source() {
                UniformSource::Semantic(semantic) => semantics.get(*semantic).cloned(),
                UniformSource::Local(param) if slot.needs_update() => {
                    refreshed.push(slot);
                    param.value()
                }
                UniformSource::Local(_) => None,
            };
            if let Some(value) = value {
                writes.push(DescriptorWrite {
                    binding: slot.binding(),
                    value,
                });
            }
        }
        self.set.update(&writes)?;
        for slot in refreshed {
            slot.needs_update.store(false, Ordering::Release);
        }
        Ok(writes.len())
    }

    /// Removes every listener registration made by setup.
    pub fn close(&mut self) {
        for slot in self.slots.drain(..) {
            if let UniformSource::Local(param) = slot.source() {
                param.remove_listener(&slot);
            }
        }
    }
}

impl Drop for MaterialBinding {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::UniformValue;

    #[test]
    fn test_listener_marks_slot_dirty() {
        let param = Arc::new(MaterialParam::new("roughness", UniformType::Float));
        let slot = Arc::new(UniformSlot::new(
            "roughness",
            0,
            UniformType::Float,
            UniformSource::Local(param.clone()),
        ));
        slot.needs_update.store(false, Ordering::Release);
        param.add_listener(&slot);
        param.set(UniformValue::Float(0.5)).unwrap();
        assert!(slot.needs_update());
        assert!(param.remove_listener(&slot));
        assert_eq!(param.listener_count(), 0);
        assert!(!param.remove_listener(&slot));
    }
}
