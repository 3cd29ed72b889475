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

//! The post-process chain: ordered full-screen stages per render queue.
//!
//! Stages are added and removed through pending edits that only apply at the
//! next `render_begin`, so a running frame always sees a stable chain. Each
//! stage reads the previous stage's output and the last one writes the frame's
//! output framebuffer; intermediate results alternate between two ping-pong
//! targets shaped like the output.

use super::draw::DrawContext;
use super::error::{RenderPipelineError, Result};
use super::world::RenderMesh;
use lumen_core::math::{Extent3D, Origin3D};
use lumen_core::renderer::material::Material;
use lumen_core::renderer::{
    Creatable, DeviceChild, FramebufferDescriptor, GraphicsDescriptorPool, GraphicsDevice,
    GraphicsFramebuffer, GraphicsTexture, RenderQueue, ResourceError, ResourceHandle,
    TextureDescriptor, TextureUsage,
};
use std::fmt;
use std::sync::Arc;

/// A full-screen effect.
pub trait PostProcess: Send + Sync {
    /// Stage name, for logs.
    fn name(&self) -> &str;

    /// Prepares GPU state before the stage first runs. A failure drops the stage.
    fn activate(
        &mut self,
        _device: &dyn GraphicsDevice,
        _pool: &Arc<GraphicsDescriptorPool>,
    ) -> Result<()> {
        Ok(())
    }

    /// Records the effect reading `source` into the target bound in `ctx`.
    fn render(&mut self, ctx: &mut DrawContext<'_>, source: &Arc<GraphicsTexture>) -> Result<()>;

    /// Releases what `activate` prepared.
    fn deactivate(&mut self) {}
}

/// Identity of a stage added to a [`PostProcessChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostProcessId(u64);

enum Edit {
    Add(PostProcessId, RenderQueue, Box<dyn PostProcess>),
    Remove(PostProcessId),
}

struct PingPong {
    output: ResourceHandle,
    textures: [Arc<GraphicsTexture>; 2],
    framebuffers: [Arc<GraphicsFramebuffer>; 2],
}

impl PingPong {
    fn new(device: &dyn GraphicsDevice, output: &GraphicsFramebuffer, color: &GraphicsTexture) -> Result<Self> {
        let desc = output.descriptor();
        let make = |i: usize| -> Result<(Arc<GraphicsTexture>, Arc<GraphicsFramebuffer>)> {
            let mut texture = TextureDescriptor::new_2d(
                output.width(),
                output.height(),
                color.descriptor().format,
                TextureUsage::RENDER_ATTACHMENT
                    | TextureUsage::TEXTURE_BINDING
                    | TextureUsage::COPY_SRC
                    | TextureUsage::COPY_DST,
            );
            texture.label = Some(format!("post-process ping-pong {i}").into());
            let texture = device.create_texture(&texture)?;
            let mut color_attachments = desc.color_attachments.clone();
            color_attachments[0] = texture.clone();
            let framebuffer = device.create_framebuffer(&FramebufferDescriptor {
                label: None,
                layout: desc.layout.clone(),
                color_attachments,
                depth_stencil_attachment: desc.depth_stencil_attachment.clone(),
                width: output.width(),
                height: output.height(),
            })?;
            Ok((texture, framebuffer))
        };
        let (t0, f0) = make(0)?;
        let (t1, f1) = make(1)?;
        log::debug!("Created post-process targets {}x{}", output.width(), output.height());
        Ok(Self {
            output: output.handle(),
            textures: [t0, t1],
            framebuffers: [f0, f1],
        })
    }
}

/// Post-process stages of every render queue.
#[derive(Default)]
pub struct PostProcessChain {
    stages: [Vec<(PostProcessId, Box<dyn PostProcess>)>; RenderQueue::COUNT],
    pending: Vec<Edit>,
    targets: Option<PingPong>,
    next_id: u64,
}

impl fmt::Debug for PostProcessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessChain")
            .field("stages", &self.stages.iter().map(Vec::len).collect::<Vec<_>>())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl PostProcessChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `stage` for addition at the end of `queue`'s chain.
    pub fn add(&mut self, queue: RenderQueue, stage: Box<dyn PostProcess>) -> PostProcessId {
        self.next_id += 1;
        let id = PostProcessId(self.next_id);
        self.pending.push(Edit::Add(id, queue, stage));
        id
    }

    /// Queues the removal of a stage. Returns `false` for an unknown id.
    pub fn remove(&mut self, id: PostProcessId) -> bool {
        let known = self.stages.iter().flatten().any(|(s, _)| *s == id)
            || self
                .pending
                .iter()
                .any(|e| matches!(e, Edit::Add(s, ..) if *s == id));
        if known {
            self.pending.push(Edit::Remove(id));
        }
        known
    }

    /// Applies pending edits in call order. Returns the number of stages
    /// activated.
    pub fn apply_pending(&mut self, device: &dyn GraphicsDevice, pool: &Arc<GraphicsDescriptorPool>) -> usize {
        let mut activated = 0;
        for edit in std::mem::take(&mut self.pending) {
            match edit {
                Edit::Add(id, queue, mut stage) => match stage.activate(device, pool) {
                    Ok(()) => {
                        log::debug!("Post-process '{}' added to {queue:?}", stage.name());
                        self.stages[queue.index()].push((id, stage));
                        activated += 1;
                    }
                    Err(err) => {
                        log::warn!("Post-process '{}' failed to activate and is dropped: {err}", stage.name());
                    }
                },
                Edit::Remove(id) => {
                    for chain in &mut self.stages {
                        if let Some(pos) = chain.iter().position(|(s, _)| *s == id) {
                            let (_, mut stage) = chain.remove(pos);
                            stage.deactivate();
                            log::debug!("Post-process '{}' removed", stage.name());
                        }
                    }
                }
            }
        }
        activated
    }

    /// Names of the active stages of `queue`, in order.
    pub fn stage_names(&self, queue: RenderQueue) -> Vec<&str> {
        self.stages[queue.index()].iter().map(|(_, s)| s.name()).collect()
    }

    /// Number of edits waiting for the next frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Runs `queue`'s stages, ending in `output`.
    pub fn run(
        &mut self,
        queue: RenderQueue,
        ctx: &mut DrawContext<'_>,
        output: &Arc<GraphicsFramebuffer>,
    ) -> Result<()> {
        let stages = &mut self.stages[queue.index()];
        if stages.is_empty() {
            return Ok(());
        }
        let color = output.descriptor().color_attachments.first().ok_or_else(|| {
            ResourceError::InvalidComposition("post-processing needs a color attachment".into())
        })?;
        if self
            .targets
            .as_ref()
            .map_or(true, |t| t.output != output.handle())
        {
            self.targets = Some(PingPong::new(ctx.device(), output, color)?);
        }
        let targets = self.targets.as_ref().ok_or(RenderPipelineError::MissingFramebuffer)?;

        ctx.list().copy_texture(
            color,
            0,
            Origin3D::ZERO,
            &targets.textures[0],
            0,
            Origin3D::ZERO,
            Extent3D::new_2d(output.width(), output.height()),
        )?;
        let last = stages.len() - 1;
        for (i, (_, stage)) in stages.iter_mut().enumerate() {
            let write = if i == last {
                output
            } else {
                &targets.framebuffers[(i + 1) % 2]
            };
            ctx.bind_target(write)?;
            stage.render(ctx, &targets.textures[i % 2])?;
        }
        Ok(())
    }
}

/// A stage drawing a full-screen mesh with a material's post-process technique.
///
/// The previous stage's output is written to the material parameter named by
/// [`with_source`](Self::with_source), if any.
pub struct FullscreenMaterialStage {
    name: String,
    material: Arc<Material>,
    mesh: Arc<RenderMesh>,
    source: Option<String>,
}

impl FullscreenMaterialStage {
    /// A stage drawing `mesh` with `material`.
    pub fn new(name: impl Into<String>, material: Arc<Material>, mesh: Arc<RenderMesh>) -> Self {
        Self {
            name: name.into(),
            material,
            mesh,
            source: None,
        }
    }

    /// Feeds the source texture to the parameter called `param`.
    pub fn with_source(mut self, param: impl Into<String>) -> Self {
        self.source = Some(param.into());
        self
    }

    /// The drawing material.
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    fn missing_pass(&self) -> RenderPipelineError {
        RenderPipelineError::MissingMaterialPass {
            material: self.material.name().to_string(),
            queue: RenderQueue::PostProcess,
            pass: None,
        }
    }
}

impl PostProcess for FullscreenMaterialStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&mut self, _device: &dyn GraphicsDevice, pool: &Arc<GraphicsDescriptorPool>) -> Result<()> {
        if self.material.get_technique(RenderQueue::PostProcess).is_none() {
            return Err(self.missing_pass());
        }
        self.material.setup(pool)?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut DrawContext<'_>, source: &Arc<GraphicsTexture>) -> Result<()> {
        if let Some(param) = &self.source {
            self.material.uniform_texture(param, source.clone(), None)?;
        }
        let technique = self
            .material
            .get_technique(RenderQueue::PostProcess)
            .ok_or_else(|| self.missing_pass())?;
        for pass in technique.passes() {
            ctx.draw(&self.material, pass, &self.mesh, 1)?;
        }
        Ok(())
    }

    fn deactivate(&mut self) {
        self.material.close();
    }
}
