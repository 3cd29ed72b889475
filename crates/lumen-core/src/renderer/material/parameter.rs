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

use super::binding::UniformSlot;
use super::semantic::GlobalSemantic;
use crate::renderer::api::{UniformType, UniformValue};
use crate::renderer::error::MaterialError;
use crate::renderer::object::lock;
use std::sync::{Arc, Mutex, Weak};

/// A named, typed material input.
///
/// A local parameter stores its own value and notifies the uniform slots
/// listening to it whenever that value changes. A semantic parameter stores
/// nothing; its slots read the renderer's semantic table instead.
#[derive(Debug)]
pub struct MaterialParam {
    name: String,
    ty: UniformType,
    semantic: Option<GlobalSemantic>,
    value: Mutex<Option<UniformValue>>,
    listeners: Mutex<Vec<Weak<UniformSlot>>>,
}

impl MaterialParam {
    /// A material-local parameter without a value.
    pub fn new(name: impl Into<String>, ty: UniformType) -> Self {
        Self {
            name: name.into(),
            ty,
            semantic: None,
            value: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// A local parameter holding `value`.
    pub fn with_value(name: impl Into<String>, value: UniformValue) -> Self {
        let param = Self::new(name, value.ty());
        *lock(&param.value) = Some(value);
        param
    }

    /// A parameter redirected to `semantic`.
    pub fn with_semantic(name: impl Into<String>, semantic: GlobalSemantic) -> Self {
        Self {
            semantic: Some(semantic),
            ..Self::new(name, semantic.uniform_type())
        }
    }

    /// A parameter redirected to the semantic called `semantic`.
    pub fn with_semantic_name(name: impl Into<String>, semantic: &str) -> Result<Self, MaterialError> {
        let semantic = GlobalSemantic::from_name(semantic)
            .ok_or_else(|| MaterialError::UnknownSemantic(semantic.to_string()))?;
        Ok(Self::with_semantic(name, semantic))
    }

    /// Parameter name, matched against shader uniform names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    /// The global semantic feeding the parameter, if any.
    pub fn semantic(&self) -> Option<GlobalSemantic> {
        self.semantic
    }

    /// The current value of a local parameter.
    pub fn value(&self) -> Option<UniformValue> {
        lock(&self.value).clone()
    }

    /// Assigns a new value and marks every listening slot for update.
    pub fn set(&self, value: UniformValue) -> Result<(), MaterialError> {
        if self.semantic.is_some() {
            return Err(MaterialError::SemanticParameter(self.name.clone()));
        }
        if value.ty() != self.ty {
            return Err(MaterialError::TypeMismatch {
                name: self.name.clone(),
                expected: self.ty,
                actual: value.ty(),
            });
        }
        *lock(&self.value) = Some(value);
        let listeners: Vec<_> = lock(&self.listeners).iter().filter_map(Weak::upgrade).collect();
        for slot in listeners {
            slot.mark_dirty();
        }
        Ok(())
    }

    /// Registers a slot to be notified of value changes.
    pub fn add_listener(&self, slot: &Arc<UniformSlot>) {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(Arc::downgrade(slot));
    }

    /// Unregisters a slot. Returns `true` if it was registered.
    pub fn remove_listener(&self, slot: &Arc<UniformSlot>) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        let target = Arc::downgrade(slot);
        listeners.retain(|l| !l.ptr_eq(&target));
        listeners.len() != before
    }

    /// Number of registered slots, including ones already dropped.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_checks_type() {
        let param = MaterialParam::new("tint", UniformType::Float4);
        let err = param.set(UniformValue::Float3([1.0; 3]));
        assert!(matches!(err, Err(MaterialError::TypeMismatch { .. })));
        assert!(param.value().is_none());
        param.set(UniformValue::Float4([1.0; 4])).unwrap();
        assert_eq!(param.value(), Some(UniformValue::Float4([1.0; 4])));
    }

    #[test]
    fn test_semantic_parameter_holds_no_value() {
        let param = MaterialParam::with_semantic_name("mvp", "matModelViewProject").unwrap();
        assert_eq!(param.semantic(), Some(GlobalSemantic::ModelViewProjectMatrix));
        assert_eq!(param.ty(), UniformType::Float4x4);
        assert!(matches!(
            param.set(UniformValue::Float(1.0)),
            Err(MaterialError::SemanticParameter(_))
        ));
    }

    #[test]
    fn test_unknown_semantic_name() {
        assert!(matches!(
            MaterialParam::with_semantic_name("x", "matNothing"),
            Err(MaterialError::UnknownSemantic(_))
        ));
    }
}
