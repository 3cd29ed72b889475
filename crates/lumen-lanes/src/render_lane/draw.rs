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

//! Recording of material draws into the frame's command list.

use super::error::{RenderPipelineError, Result};
use super::pipeline_cache::PipelineCache;
use super::world::RenderMesh;
use lumen_core::math::Mat4;
use lumen_core::renderer::material::{Material, MaterialPass, MaterialSemanticTable};
use lumen_core::renderer::{
    GraphicsBuffer, GraphicsCommandList, GraphicsDescriptorPool, GraphicsDevice,
    GraphicsFramebuffer, GraphicsPipelineDescriptor, Scissor, Viewport,
};
use std::sync::Arc;

/// Everything a draw needs, borrowed from the renderer for the span of a frame step.
pub struct DrawContext<'a> {
    pub(crate) device: &'a dyn GraphicsDevice,
    pub(crate) list: &'a GraphicsCommandList,
    pub(crate) cache: &'a mut PipelineCache,
    pub(crate) semantics: &'a mut MaterialSemanticTable,
    pub(crate) descriptor_pool: &'a Arc<GraphicsDescriptorPool>,
    pub(crate) target: Option<Arc<GraphicsFramebuffer>>,
}

impl DrawContext<'_> {
    /// The device draws are recorded for.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device
    }

    /// The command list draws are recorded into.
    pub fn list(&self) -> &GraphicsCommandList {
        self.list
    }

    /// The semantic table, for stages that feed their own values.
    pub fn semantics_mut(&mut self) -> &mut MaterialSemanticTable {
        self.semantics
    }

    /// The framebuffer currently bound.
    pub fn target(&self) -> Option<&Arc<GraphicsFramebuffer>> {
        self.target.as_ref()
    }

    /// Binds `framebuffer` with a viewport and scissor covering it.
    pub fn bind_target(&mut self, framebuffer: &Arc<GraphicsFramebuffer>) -> Result<()> {
        let (width, height) = (framebuffer.width(), framebuffer.height());
        self.list.set_framebuffer(framebuffer)?;
        self.target = Some(framebuffer.clone());
        self.list.set_viewport(Viewport::full(width, height))?;
        self.list.set_scissor(Scissor {
            x: 0,
            y: 0,
            width,
            height,
        })?;
        Ok(())
    }

    /// Refreshes the model slots of the semantic table.
    pub fn set_model(&mut self, transform: Mat4) {
        self.semantics.set_model(transform);
    }

    /// Binds the pipeline, descriptor set and vertex input of one pass.
    fn bind_pass(&mut self, material: &Material, pass: &MaterialPass, mesh: &RenderMesh) -> Result<()> {
        let target = self.target.clone().ok_or(RenderPipelineError::MissingFramebuffer)?;
        if !pass.is_setup() {
            material.setup(self.descriptor_pool)?;
        }
        let pipeline = self.cache.get_or_create(
            self.device,
            &GraphicsPipelineDescriptor {
                label: None,
                program: pass.program().clone(),
                input_layout: mesh.input_layout.clone(),
                descriptor_set_layout: pass.descriptor_set_layout().clone(),
                framebuffer_layout: target.layout().clone(),
                state: pass.state().clone(),
            },
        )?;
        self.list.set_pipeline(&pipeline)?;
        if let Some(set) = pass.apply(&*self.semantics)? {
            self.list.set_descriptor_set(&set)?;
        }
        for (slot, buffer) in mesh.vertex_buffers.iter().enumerate() {
            self.list.set_vertex_buffer(slot as u32, buffer, 0)?;
        }
        if let Some((buffer, format)) = &mesh.index_buffer {
            self.list.set_index_buffer(buffer, 0, *format)?;
        }
        Ok(())
    }

    /// Draws `mesh` with one material pass into the bound target.
    pub fn draw(
        &mut self,
        material: &Material,
        pass: &MaterialPass,
        mesh: &RenderMesh,
        instance_count: u32,
    ) -> Result<()> {
        self.bind_pass(material, pass, mesh)?;
        if mesh.is_indexed() {
            self.list.draw_indexed(mesh.index_count, instance_count, 0, 0, 0)?;
        } else {
            self.list.draw(mesh.vertex_count, instance_count, 0, 0)?;
        }
        Ok(())
    }

    /// Draws `mesh` with arguments read from `indirect`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_indirect(
        &mut self,
        material: &Material,
        pass: &MaterialPass,
        mesh: &RenderMesh,
        indirect: &Arc<GraphicsBuffer>,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) -> Result<()> {
        self.bind_pass(material, pass, mesh)?;
        if mesh.is_indexed() {
            self.list.draw_indexed_indirect(indirect, offset, draw_count, stride)?;
        } else {
            self.list.draw_indirect(indirect, offset, draw_count, stride)?;
        }
        Ok(())
    }
}
