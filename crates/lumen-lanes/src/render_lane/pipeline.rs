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

//! The renderer context driving one frame at a time.

use super::data_manager::RenderDataManager;
use super::draw::DrawContext;
use super::error::{RenderPipelineError, Result};
use super::pipeline_cache::PipelineCache;
use super::post_process::{PostProcess, PostProcessChain, PostProcessId};
use super::world::{Camera, CameraClear, RenderMesh, RenderScene};
use lumen_core::math::{Extent3D, LinearRgba, Mat4, Origin3D};
use lumen_core::renderer::material::{Material, MaterialPass, MaterialSemanticTable};
use lumen_core::renderer::{
    ClearFlags, CommandListDescriptor, CommandListUsage, CommandPoolDescriptor, CommandPoolFlags,
    CommandQueueDescriptor, Creatable, DescriptorPoolDescriptor, DescriptorPoolFlags,
    DescriptorPoolSize, DeviceStatistics, GraphicsBuffer, GraphicsCommandList,
    GraphicsCommandQueue, GraphicsDescriptorPool, GraphicsDevice, GraphicsFramebuffer,
    GraphicsTexture, QueueType, RenderQueue, RenderSettings, UniformType,
};
use std::sync::Arc;

/// An explicitly constructed renderer: one device, one graphics queue, one
/// frame command list and the per-frame orchestration state.
///
/// Several pipelines may share a device; nothing here is global.
pub struct RenderPipeline {
    device: Arc<dyn GraphicsDevice>,
    settings: RenderSettings,
    queue: Arc<GraphicsCommandQueue>,
    list: Arc<GraphicsCommandList>,
    descriptor_pool: Arc<GraphicsDescriptorPool>,
    cache: PipelineCache,
    data: RenderDataManager,
    semantics: MaterialSemanticTable,
    post: PostProcessChain,
    render_target: Option<Arc<GraphicsFramebuffer>>,
    bound_target: Option<Arc<GraphicsFramebuffer>>,
    in_frame: bool,
    frame: u64,
}

fn pool_sizes(settings: &RenderSettings) -> Vec<DescriptorPoolSize> {
    let pool = &settings.descriptor_pool;
    let images = [
        UniformType::Sampler,
        UniformType::SampledImage,
        UniformType::CombinedImageSampler,
        UniformType::StorageImage,
    ]
    .map(|ty| DescriptorPoolSize {
        ty,
        count: pool.images_per_type,
    });
    let buffers = [UniformType::UniformBuffer, UniformType::StorageBuffer].map(|ty| DescriptorPoolSize {
        ty,
        count: pool.buffers_per_type,
    });
    images
        .into_iter()
        .chain(buffers)
        .filter(|size| size.count > 0)
        .collect()
}

impl RenderPipeline {
    /// Creates the queue, command list and descriptor pool the renderer records with.
    pub fn new(device: Arc<dyn GraphicsDevice>, settings: RenderSettings) -> Result<Self> {
        let queue = device.create_command_queue(&CommandQueueDescriptor {
            label: Some("render queue".into()),
            queue_type: QueueType::Graphics,
            priority: 1.0,
        })?;
        let pool = device.create_command_pool(&CommandPoolDescriptor {
            label: Some("render command pool".into()),
            queue_type: QueueType::Graphics,
            flags: CommandPoolFlags::RESET_COMMAND_BUFFER,
        })?;
        let list = device.create_command_list(&CommandListDescriptor {
            label: Some("frame".into()),
            pool,
            usage: CommandListUsage::EMPTY,
        })?;
        let flags = if settings.descriptor_pool.free_descriptor_sets {
            DescriptorPoolFlags::FREE_DESCRIPTOR_SET
        } else {
            DescriptorPoolFlags::EMPTY
        };
        let descriptor_pool = device.create_descriptor_pool(&DescriptorPoolDescriptor {
            label: Some("material sets".into()),
            max_sets: settings.descriptor_pool.max_sets,
            pool_sizes: pool_sizes(&settings),
            flags,
        })?;
        let adapter = device.adapter_info();
        log::info!(
            "Render pipeline created on '{}' ({:?} backend)",
            adapter.name,
            adapter.backend_type
        );
        Ok(Self {
            data: RenderDataManager::new(settings.shadows_enabled),
            device,
            settings,
            queue,
            list,
            descriptor_pool,
            cache: PipelineCache::new(),
            semantics: MaterialSemanticTable::new(),
            post: PostProcessChain::new(),
            render_target: None,
            bound_target: None,
            in_frame: false,
            frame: 0,
        })
    }

    /// The device.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The settings the pipeline was built with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The pool material descriptor sets are allocated from.
    pub fn descriptor_pool(&self) -> &Arc<GraphicsDescriptorPool> {
        &self.descriptor_pool
    }

    /// The pipeline state cache.
    pub fn pipeline_cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// The culling and sorting state of the last camera.
    pub fn data_manager(&self) -> &RenderDataManager {
        &self.data
    }

    /// The global semantic table.
    pub fn semantics(&self) -> &MaterialSemanticTable {
        &self.semantics
    }

    /// Mutable access to the global semantic table.
    pub fn semantics_mut(&mut self) -> &mut MaterialSemanticTable {
        &mut self.semantics
    }

    /// The post-process chain.
    pub fn post_process(&self) -> &PostProcessChain {
        &self.post
    }

    /// Frames completed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Returns `true` between `render_begin` and `render_end`.
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Device counters.
    pub fn statistics(&self) -> DeviceStatistics {
        self.device.statistics()
    }

    /// Sets the framebuffer used by cameras without a target and by direct draws.
    pub fn set_render_texture(&mut self, framebuffer: Option<Arc<GraphicsFramebuffer>>) {
        self.render_target = framebuffer;
    }

    /// The framebuffer set by [`set_render_texture`](Self::set_render_texture).
    pub fn render_texture(&self) -> Option<&Arc<GraphicsFramebuffer>> {
        self.render_target.as_ref()
    }

    fn require_frame(&self, operation: &'static str) -> Result<()> {
        if self.in_frame {
            Ok(())
        } else {
            Err(RenderPipelineError::NotInFrame(operation))
        }
    }

    fn context(&mut self) -> DrawContext<'_> {
        DrawContext {
            device: self.device.as_ref(),
            list: &self.list,
            cache: &mut self.cache,
            semantics: &mut self.semantics,
            descriptor_pool: &self.descriptor_pool,
            target: self.bound_target.clone(),
        }
    }

    /// Binds the render texture unless it is already bound.
    fn bind_render_texture(&mut self) -> Result<()> {
        let target = self
            .render_target
            .clone()
            .ok_or(RenderPipelineError::MissingFramebuffer)?;
        if self.bound_target.as_ref().is_some_and(|bound| Arc::ptr_eq(bound, &target)) {
            return Ok(());
        }
        let mut ctx = self.context();
        let bound = ctx.bind_target(&target);
        self.bound_target = ctx.target;
        bound
    }

    /// Opens a frame: applies pending post-process edits, drops invalid or
    /// unused pipelines and starts recording.
    pub fn render_begin(&mut self) -> Result<()> {
        if self.in_frame {
            return Err(RenderPipelineError::AlreadyInFrame(self.frame));
        }
        // Last frame's draw items still reference its materials.
        self.data.clear();
        self.post.apply_pending(self.device.as_ref(), &self.descriptor_pool);
        self.cache.purge_invalid();
        self.cache.evict_unused();
        self.list.begin()?;
        self.bound_target = None;
        self.in_frame = true;
        log::trace!("Frame {} begins", self.frame);
        Ok(())
    }

    /// Draws `scene` from every camera in render order.
    ///
    /// Shadow cameras draw the shadow queue only; main cameras draw the opaque,
    /// transparent and post-process queues, each followed by that queue's
    /// post-process stages.
    pub fn render(&mut self, scene: &RenderScene) -> Result<()> {
        self.require_frame("render")?;
        let cameras = scene.cameras();
        if cameras.is_empty() {
            return Err(RenderPipelineError::MissingCamera);
        }
        for camera in cameras {
            let target = camera
                .target
                .clone()
                .or_else(|| self.render_target.clone())
                .ok_or(RenderPipelineError::MissingFramebuffer)?;
            self.data.prepare(scene, camera);
            self.semantics.set_camera(&camera.semantics());

            let mut ctx = DrawContext {
                device: self.device.as_ref(),
                list: &self.list,
                cache: &mut self.cache,
                semantics: &mut self.semantics,
                descriptor_pool: &self.descriptor_pool,
                target: None,
            };
            let drawn = Self::draw_camera(
                &mut ctx,
                &self.data,
                &mut self.post,
                self.settings.post_process_enabled,
                camera,
                &target,
            );
            // A failed camera may still have rebound the list.
            self.bound_target = ctx.target;
            drawn?;
        }
        Ok(())
    }

    fn draw_camera(
        ctx: &mut DrawContext<'_>,
        data: &RenderDataManager,
        post: &mut PostProcessChain,
        post_process_enabled: bool,
        camera: &Camera,
        target: &Arc<GraphicsFramebuffer>,
    ) -> Result<()> {
        ctx.bind_target(target)?;
        if let Some(clear) = camera.clear {
            ctx.list()
                .clear_framebuffer(clear.flags, clear.color, clear.depth, clear.stencil)?;
        }
        for &queue in camera.kind.queues() {
            for (_, items) in data.buckets().non_empty(queue) {
                for item in items {
                    ctx.set_model(item.object.transform);
                    ctx.draw(&item.object.material, &item.pass, &item.object.mesh, item.object.instance_count)?;
                }
            }
            if post_process_enabled {
                post.run(queue, ctx, target)?;
            }
        }
        Ok(())
    }

    /// Ends recording and submits the frame.
    pub fn render_end(&mut self) -> Result<()> {
        self.require_frame("render_end")?;
        self.in_frame = false;
        self.list.end()?;
        self.queue.submit(std::slice::from_ref(&self.list), &[], &[])?;
        log::trace!("Frame {} submitted", self.frame);
        self.frame += 1;
        Ok(())
    }

    /// Clears the render texture.
    pub fn clear_framebuffer(
        &mut self,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u32,
    ) -> Result<()> {
        self.require_frame("clear_framebuffer")?;
        self.bind_render_texture()?;
        self.list.clear_framebuffer(flags, color, depth, stencil)?;
        Ok(())
    }

    /// The clear configured in the settings, over every aspect.
    pub fn default_clear(&self) -> CameraClear {
        CameraClear::from_settings(&self.settings)
    }

    /// Clears the render texture with the configured clear values.
    pub fn clear_to_default(&mut self) -> Result<()> {
        let clear = self.default_clear();
        self.clear_framebuffer(clear.flags, clear.color, clear.depth, clear.stencil)
    }

    /// Clears `framebuffer`, then restores the previously bound target.
    pub fn clear_render_texture(
        &mut self,
        framebuffer: &Arc<GraphicsFramebuffer>,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u32,
    ) -> Result<()> {
        self.require_frame("clear_render_texture")?;
        let previous = self.bound_target.clone();
        let mut ctx = self.context();
        let mut cleared = ctx.bind_target(framebuffer).and_then(|()| {
            ctx.list().clear_framebuffer(flags, color, depth, stencil)?;
            Ok(())
        });
        if let (Ok(()), Some(previous)) = (&cleared, &previous) {
            cleared = ctx.bind_target(previous);
        }
        self.bound_target = ctx.target;
        cleared
    }

    /// Copies level 0 of `src` into `dst`, over the region both textures cover.
    pub fn copy_render_texture(&mut self, src: &Arc<GraphicsTexture>, dst: &Arc<GraphicsTexture>) -> Result<()> {
        self.require_frame("copy_render_texture")?;
        let (a, b) = (src.descriptor().size, dst.descriptor().size);
        let extent = Extent3D {
            width: a.width.min(b.width),
            height: a.height.min(b.height),
            depth_or_array_layers: a.depth_or_array_layers.min(b.depth_or_array_layers),
        };
        self.list
            .copy_texture(src, 0, Origin3D::ZERO, dst, 0, Origin3D::ZERO, extent)?;
        Ok(())
    }

    /// Reads back one mip level of `texture`.
    ///
    /// Inside a frame the commands recorded so far are submitted and waited
    /// for first, then recording resumes on the same target. This stalls.
    pub fn read_render_texture(&mut self, texture: &Arc<GraphicsTexture>, level: u32) -> Result<Vec<u8>> {
        if self.in_frame {
            self.list.end()?;
            self.queue.submit(std::slice::from_ref(&self.list), &[], &[])?;
            self.queue.wait_idle()?;
            self.list.begin()?;
            if let Some(target) = self.bound_target.take() {
                let mut ctx = self.context();
                let bound = ctx.bind_target(&target);
                self.bound_target = ctx.target;
                bound?;
            }
        }
        Ok(self.device.read_texture(texture, level)?)
    }

    fn technique_passes(
        material: &Material,
        queue: RenderQueue,
    ) -> Result<&[Arc<MaterialPass>]> {
        material
            .get_technique(queue)
            .map(|t| t.passes())
            .filter(|passes| !passes.is_empty())
            .ok_or_else(|| RenderPipelineError::MissingMaterialPass {
                material: material.name().to_string(),
                queue,
                pass: None,
            })
    }

    /// Draws `mesh` into the render texture with every pass of `material`'s
    /// technique for `queue`.
    pub fn draw_mesh(
        &mut self,
        mesh: &RenderMesh,
        material: &Material,
        transform: Mat4,
        queue: RenderQueue,
        instance_count: u32,
    ) -> Result<()> {
        self.require_frame("draw_mesh")?;
        let passes = Self::technique_passes(material, queue)?;
        self.bind_render_texture()?;
        let mut ctx = self.context();
        ctx.set_model(transform);
        for pass in passes {
            ctx.draw(material, pass, mesh, instance_count)?;
        }
        Ok(())
    }

    /// Like [`draw_mesh`](Self::draw_mesh) with draw arguments read from `indirect`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_render_indirect(
        &mut self,
        mesh: &RenderMesh,
        material: &Material,
        transform: Mat4,
        queue: RenderQueue,
        indirect: &Arc<GraphicsBuffer>,
        offset: u64,
        draw_count: u32,
        stride: u64,
    ) -> Result<()> {
        self.require_frame("draw_render_indirect")?;
        let passes = Self::technique_passes(material, queue)?;
        self.bind_render_texture()?;
        let mut ctx = self.context();
        ctx.set_model(transform);
        for pass in passes {
            ctx.draw_indirect(material, pass, mesh, indirect, offset, draw_count, stride)?;
        }
        Ok(())
    }

    /// Queues a post-process stage; it runs from the next frame on.
    pub fn add_post_process(&mut self, queue: RenderQueue, stage: Box<dyn PostProcess>) -> PostProcessId {
        self.post.add(queue, stage)
    }

    /// Queues the removal of a stage; it stops running from the next frame on.
    pub fn remove_post_process(&mut self, id: PostProcessId) -> bool {
        self.post.remove(id)
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        if self.in_frame {
            log::warn!("Render pipeline dropped inside frame {}", self.frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sizes_skip_empty_types() {
        let mut settings = RenderSettings::default();
        settings.descriptor_pool.buffers_per_type = 0;
        settings.descriptor_pool.images_per_type = 8;
        let sizes = pool_sizes(&settings);
        assert_eq!(sizes.len(), 4);
        assert!(sizes.iter().all(|s| s.count == 8 && s.ty.is_resource()));
    }
}
