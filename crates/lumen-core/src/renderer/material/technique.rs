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

use super::binding::{MaterialBinding, UniformSlot};
use super::semantic::MaterialSemanticTable;
use super::Material;
use crate::renderer::api::{DescriptorSetDescriptor, RenderPass, RenderQueue};
use crate::renderer::error::{MaterialError, ResourceError};
use crate::renderer::object::{
    lock, DeviceChild, GraphicsDescriptorPool, GraphicsDescriptorSet,
    GraphicsDescriptorSetLayout, GraphicsProgram, GraphicsState,
};
use std::sync::{Arc, Mutex};

/// One way of drawing a material inside a render queue.
///
/// A pass owns everything of a pipeline state object except the mesh input
/// layout and the target framebuffer layout, which are only known at draw time.
#[derive(Debug)]
pub struct MaterialPass {
    name: String,
    pass: RenderPass,
    program: Arc<GraphicsProgram>,
    state: Arc<GraphicsState>,
    descriptor_set_layout: Arc<GraphicsDescriptorSetLayout>,
    binding: Mutex<Option<MaterialBinding>>,
}

impl MaterialPass {
    /// Creates a pass that is not set up yet.
    pub fn new(
        name: impl Into<String>,
        pass: RenderPass,
        program: Arc<GraphicsProgram>,
        state: Arc<GraphicsState>,
        descriptor_set_layout: Arc<GraphicsDescriptorSetLayout>,
    ) -> Self {
        Self {
            name: name.into(),
            pass,
            program,
            state,
            descriptor_set_layout,
            binding: Mutex::new(None),
        }
    }

    /// Pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The render pass the pass draws in.
    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    /// Linked program.
    pub fn program(&self) -> &Arc<GraphicsProgram> {
        &self.program
    }

    /// Fixed-function state.
    pub fn state(&self) -> &Arc<GraphicsState> {
        &self.state
    }

    /// Layout of the pass's descriptor set.
    pub fn descriptor_set_layout(&self) -> &Arc<GraphicsDescriptorSetLayout> {
        &self.descriptor_set_layout
    }

    /// Allocates the pass's descriptor set from `pool` and binds it to the
    /// material. A previous binding is closed first.
    pub fn setup(&self, material: &Material, pool: &Arc<GraphicsDescriptorPool>) -> Result<(), MaterialError> {
        let device = self.program.device().ok_or(ResourceError::DeviceLost)?;
        let set = device.create_descriptor_set(&DescriptorSetDescriptor {
            label: Some(format!("{}/{}", material.name(), self.name).into()),
            layout: self.descriptor_set_layout.clone(),
            pool: pool.clone(),
        })?;
        let binding = MaterialBinding::setup(material, &self.program, set)?;
        let previous = lock(&self.binding).replace(binding);
        drop(previous);
        Ok(())
    }

    /// Refreshes the descriptor set and returns it, or `None` before setup.
    pub fn apply(
        &self,
        semantics: &MaterialSemanticTable,
    ) -> Result<Option<Arc<GraphicsDescriptorSet>>, MaterialError> {
        let binding = lock(&self.binding);
        let Some(binding) = binding.as_ref() else {
            return Ok(None);
        };
        binding.apply(semantics)?;
        Ok(Some(binding.descriptor_set().clone()))
    }

    /// The descriptor set, once set up.
    pub fn descriptor_set(&self) -> Option<Arc<GraphicsDescriptorSet>> {
        lock(&self.binding).as_ref().map(|b| b.descriptor_set().clone())
    }

    /// The uniform slots bound by setup; empty before setup and after close.
    pub fn slots(&self) -> Vec<Arc<UniformSlot>> {
        lock(&self.binding)
            .as_ref()
            .map_or_else(Vec::new, |b| b.slots().to_vec())
    }

    /// Returns `true` between setup and close.
    pub fn is_setup(&self) -> bool {
        lock(&self.binding).is_some()
    }

    /// Tears down the binding made by setup and releases the descriptor set.
    pub fn close(&self) {
        let binding = lock(&self.binding).take();
        drop(binding);
    }
}

/// The passes a material draws with in one render queue.
#[derive(Debug)]
pub struct MaterialTech {
    name: String,
    queue: RenderQueue,
    passes: Vec<Arc<MaterialPass>>,
}

impl MaterialTech {
    /// An empty technique for `queue`.
    pub fn new(name: impl Into<String>, queue: RenderQueue) -> Self {
        Self {
            name: name.into(),
            queue,
            passes: Vec::new(),
        }
    }

    /// Appends a pass; passes draw in insertion order.
    pub fn with_pass(mut self, pass: MaterialPass) -> Self {
        self.passes.push(Arc::new(pass));
        self
    }

    /// Technique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The render queue the technique belongs to.
    pub fn queue(&self) -> RenderQueue {
        self.queue
    }

    /// Passes in draw order.
    pub fn passes(&self) -> &[Arc<MaterialPass>] {
        &self.passes
    }

    /// The first pass drawing in `pass`.
    pub fn pass(&self, pass: RenderPass) -> Option<&Arc<MaterialPass>> {
        self.passes.iter().find(|p| p.pass() == pass)
    }
}
