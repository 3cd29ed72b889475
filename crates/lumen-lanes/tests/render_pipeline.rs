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

mod common;

use common::*;
use lumen_core::math::{LinearRgba, Mat4, Vec3};
use lumen_core::renderer::material::Material;
use lumen_core::renderer::*;
use lumen_lanes::render_lane::{
    DrawContext, FullscreenMaterialStage, PostProcess, RenderPipelineError, RenderScene,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn settle(device: &Arc<dyn GraphicsDevice>) -> DeviceStatistics {
    device.wait_idle().unwrap();
    device.statistics()
}

#[test]
fn test_clear_frame_reads_back_black() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), SIZE, SIZE);
        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(target.framebuffer.clone()));

        renderer.render_begin().unwrap();
        renderer
            .clear_framebuffer(ClearFlags::COLOR, LinearRgba::new(0.0, 0.0, 0.0, 1.0), 1.0, 0)
            .unwrap();
        renderer.render_end().unwrap();

        let pixels = renderer.read_render_texture(&target.color, 0).unwrap();
        assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);
        assert!(all_texels(&pixels, [0, 0, 0, 255]));
        assert_eq!(renderer.frame_index(), 1);
    }
}

#[test]
fn test_scene_frame_draws_only_visible_objects() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 64, 64);
        let mesh = triangle(device.as_ref());
        let lit = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
        let mut scene = RenderScene::new();
        scene.add_object(object_at(&mesh, &lit, Vec3::new(0.0, 0.0, -10.0)));
        scene.add_object(object_at(&mesh, &lit, Vec3::new(0.0, 0.0, 400.0)));
        scene.add_camera(
            camera()
                .with_target(target.framebuffer.clone())
                .with_clear(clear(LinearRgba::WHITE)),
        );

        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.render_begin().unwrap();
        renderer.render(&scene).unwrap();
        renderer.render_end().unwrap();

        let stats = settle(&device);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.clears, 1);
        assert_eq!(renderer.data_manager().stats().culled, 1);
        assert!(lit.is_setup());
        let pixels = renderer.read_render_texture(&target.color, 0).unwrap();
        assert!(all_texels(&pixels, [255, 255, 255, 255]));
    }
}

#[test]
fn test_pipeline_cache_reuses_pipeline_objects() {
    let device = device(GraphicsBackendType::Immediate);
    let target = target(device.as_ref(), 16, 16);
    let mesh = triangle(device.as_ref());
    let lit = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
    let mut scene = RenderScene::new();
    scene.add_object(object_at(&mesh, &lit, Vec3::new(-1.0, 0.0, -8.0)));
    scene.add_object(object_at(&mesh, &lit, Vec3::new(1.0, 0.0, -8.0)));
    scene.add_camera(camera());

    let mut renderer = renderer(&device, RenderSettings::default());
    renderer.set_render_texture(Some(target.framebuffer.clone()));
    for _ in 0..2 {
        renderer.render_begin().unwrap();
        renderer.render(&scene).unwrap();
        renderer.render_end().unwrap();
    }
    assert_eq!(renderer.pipeline_cache().len(), 1);
    let stats = renderer.pipeline_cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(settle(&device).draw_calls, 4);
}

#[test]
fn test_pipelines_of_dropped_materials_are_evicted() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 16, 16);
        let mesh = triangle(device.as_ref());
        let kept = material(device.as_ref(), "kept", &[RenderQueue::Opaque]);
        let dropped = material(device.as_ref(), "dropped", &[RenderQueue::Opaque]);
        let mut scene = RenderScene::new();
        scene.add_object(object_at(&mesh, &kept, Vec3::new(-1.0, 0.0, -8.0)));
        scene.add_object(object_at(&mesh, &dropped, Vec3::new(1.0, 0.0, -8.0)));
        scene.add_camera(camera());

        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(target.framebuffer.clone()));
        frame(&mut renderer, &scene);
        assert_eq!(renderer.pipeline_cache().len(), 2);

        drop(scene);
        drop(dropped);
        let mut scene = RenderScene::new();
        scene.add_object(object_at(&mesh, &kept, Vec3::new(-1.0, 0.0, -8.0)));
        scene.add_camera(camera());
        frame(&mut renderer, &scene);
        assert_eq!(renderer.pipeline_cache().len(), 1, "{backend:?}");
        assert_eq!(renderer.pipeline_cache().stats().misses, 2);
    }
}

#[test]
fn test_shadow_camera_draws_shadow_queue_only() {
    for backend in BACKENDS {
        let device = device(backend);
        let shadow_map = target(device.as_ref(), 32, 32);
        let mesh = triangle(device.as_ref());
        let caster = material(device.as_ref(), "caster", &[RenderQueue::Shadow, RenderQueue::Opaque]);
        let mut scene = RenderScene::new();
        scene.add_object(object_at(&mesh, &caster, Vec3::new(0.0, 0.0, -5.0)).with_shadows(true));
        scene.add_camera(camera().as_shadow().with_target(shadow_map.framebuffer.clone()));

        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.render_begin().unwrap();
        renderer.render(&scene).unwrap();
        renderer.render_end().unwrap();
        assert_eq!(settle(&device).draw_calls, 1);

        let mut disabled = RenderSettings::default();
        disabled.shadows_enabled = false;
        let mut renderer = common::renderer(&device, disabled);
        renderer.render_begin().unwrap();
        renderer.render(&scene).unwrap();
        renderer.render_end().unwrap();
        assert_eq!(settle(&device).draw_calls, 1);
    }
}

#[test]
fn test_cameras_render_in_order_into_their_targets() {
    let device = device(GraphicsBackendType::Explicit);
    let first = target(device.as_ref(), 8, 8);
    let second = target(device.as_ref(), 8, 8);
    let mut scene = RenderScene::new();
    scene.add_camera(
        camera()
            .with_order(1)
            .with_target(second.framebuffer.clone())
            .with_clear(clear(LinearRgba::RED)),
    );
    scene.add_camera(
        camera()
            .with_order(0)
            .with_target(first.framebuffer.clone())
            .with_clear(clear(LinearRgba::WHITE)),
    );

    let mut renderer = renderer(&device, RenderSettings::default());
    renderer.render_begin().unwrap();
    renderer.render(&scene).unwrap();
    renderer.render_end().unwrap();
    let first_pixels = renderer.read_render_texture(&first.color, 0).unwrap();
    let second_pixels = renderer.read_render_texture(&second.color, 0).unwrap();
    assert!(all_texels(&first_pixels, [255, 255, 255, 255]));
    assert!(all_texels(&second_pixels, [255, 0, 0, 255]));
}

#[test]
fn test_frame_protocol_errors() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let lit = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
    let mut renderer = renderer(&device, RenderSettings::default());
    let mut scene = RenderScene::new();

    assert!(matches!(renderer.render(&scene), Err(RenderPipelineError::NotInFrame("render"))));
    assert!(matches!(renderer.render_end(), Err(RenderPipelineError::NotInFrame(_))));

    renderer.render_begin().unwrap();
    assert!(matches!(renderer.render_begin(), Err(RenderPipelineError::AlreadyInFrame(0))));
    assert!(matches!(renderer.render(&scene), Err(RenderPipelineError::MissingCamera)));
    scene.add_camera(camera());
    assert!(matches!(renderer.render(&scene), Err(RenderPipelineError::MissingFramebuffer)));
    assert!(matches!(
        renderer.draw_mesh(&mesh, &lit, Mat4::IDENTITY, RenderQueue::Opaque, 1),
        Err(RenderPipelineError::MissingFramebuffer)
    ));

    let target = target(device.as_ref(), 4, 4);
    renderer.set_render_texture(Some(target.framebuffer.clone()));
    let err = renderer
        .draw_mesh(&mesh, &lit, Mat4::IDENTITY, RenderQueue::Transparent, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        RenderPipelineError::MissingMaterialPass {
            queue: RenderQueue::Transparent,
            ..
        }
    ));
    renderer
        .draw_mesh(&mesh, &lit, Mat4::IDENTITY, RenderQueue::Opaque, 2)
        .unwrap();
    renderer.render_end().unwrap();
    assert!(!renderer.is_in_frame());
    let stats = settle(&device);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.instances, 2);
}

#[test]
fn test_draw_render_indirect_counts_every_record() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 16, 16);
        let mesh = triangle(device.as_ref());
        let lit = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
        let records: [[u32; 4]; 2] = [[3, 2, 0, 0], [6, 1, 0, 0]];
        let bytes: Vec<u8> = records
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let indirect = device
            .create_buffer(&BufferDescriptor {
                label: Some("indirect".into()),
                size: bytes.len() as u64,
                usage: BufferUsage::INDIRECT,
                data: Some(bytes),
            })
            .unwrap();

        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(target.framebuffer.clone()));
        renderer.render_begin().unwrap();
        renderer
            .draw_render_indirect(&mesh, &lit, Mat4::IDENTITY, RenderQueue::Opaque, &indirect, 0, 2, 16)
            .unwrap();
        renderer.render_end().unwrap();
        let stats = settle(&device);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.instances, 3);
        assert_eq!(stats.vertices, 12);
    }
}

#[test]
fn test_render_texture_copy_and_clear() {
    for backend in BACKENDS {
        let device = device(backend);
        let main = target(device.as_ref(), 8, 8);
        let scratch = target(device.as_ref(), 4, 4);
        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(main.framebuffer.clone()));

        renderer.render_begin().unwrap();
        renderer
            .clear_framebuffer(ClearFlags::COLOR, LinearRgba::RED, 1.0, 0)
            .unwrap();
        renderer
            .clear_render_texture(&scratch.framebuffer, ClearFlags::COLOR, LinearRgba::WHITE, 1.0, 0)
            .unwrap();
        // Mid-frame readback sees the clears recorded so far.
        let scratch_pixels = renderer.read_render_texture(&scratch.color, 0).unwrap();
        assert!(all_texels(&scratch_pixels, [255, 255, 255, 255]));
        renderer.copy_render_texture(&scratch.color, &main.color).unwrap();
        renderer.render_end().unwrap();

        let pixels = renderer.read_render_texture(&main.color, 0).unwrap();
        let white = pixels
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, t)| *t == [255, 255, 255, 255])
            .map(|(i, _)| (i % 8, i / 8))
            .collect::<Vec<_>>();
        assert_eq!(white.len(), 16);
        assert!(white.iter().all(|&(x, y)| x < 4 && y < 4));
        assert_eq!(pixels[(7 * 8 + 7) * 4..][..4], [255, 0, 0, 255]);
    }
}

#[test]
fn test_failed_render_leaves_direct_clears_on_the_render_texture() {
    for backend in BACKENDS {
        let device = device(backend);
        let texture = target(device.as_ref(), 4, 4);
        let camera_target = target(device.as_ref(), 4, 4);
        let mesh = triangle(device.as_ref());
        let first = material(device.as_ref(), "first", &[RenderQueue::Opaque]);
        let second = material(device.as_ref(), "second", &[RenderQueue::Opaque]);
        let mut scene = RenderScene::new();
        scene.add_object(object_at(&mesh, &first, Vec3::new(0.0, 0.0, -10.0)));
        scene.add_object(object_at(&mesh, &second, Vec3::new(0.0, 0.0, -12.0)));
        scene.add_camera(camera().with_target(camera_target.framebuffer.clone()));

        let mut settings = RenderSettings::default();
        settings.descriptor_pool.max_sets = 1;
        let mut renderer = renderer(&device, settings);
        renderer.set_render_texture(Some(texture.framebuffer.clone()));
        renderer.render_begin().unwrap();
        renderer
            .clear_framebuffer(ClearFlags::COLOR, LinearRgba::rgb(0.0, 1.0, 0.0), 1.0, 0)
            .unwrap();
        let err = renderer.render(&scene).unwrap_err();
        assert!(err.is_recoverable(), "{err}");
        renderer
            .clear_framebuffer(ClearFlags::COLOR, LinearRgba::RED, 1.0, 0)
            .unwrap();
        renderer.render_end().unwrap();

        let pixels = renderer.read_render_texture(&texture.color, 0).unwrap();
        assert!(all_texels(&pixels, [255, 0, 0, 255]), "{backend:?}");
        let pixels = renderer.read_render_texture(&camera_target.color, 0).unwrap();
        assert!(!pixels.chunks_exact(4).any(|t| t == [255, 0, 0, 255]), "{backend:?}");
    }
}

#[test]
fn test_default_clear_follows_settings() {
    for backend in BACKENDS {
        let device = device(backend);
        let texture = target(device.as_ref(), 4, 4);
        let settings = RenderSettings::from_json_str(
            r#"{ "clear_color": { "r": 0.0, "g": 0.0, "b": 1.0, "a": 1.0 } }"#,
        )
        .unwrap();
        let mut renderer = renderer(&device, settings);
        let clear = renderer.default_clear();
        assert_eq!(clear.flags, ClearFlags::ALL);
        assert_eq!(clear.depth, 1.0);

        renderer.set_render_texture(Some(texture.framebuffer.clone()));
        renderer.render_begin().unwrap();
        renderer.clear_to_default().unwrap();
        renderer.render_end().unwrap();
        let pixels = renderer.read_render_texture(&texture.color, 0).unwrap();
        assert!(all_texels(&pixels, [0, 0, 255, 255]));

        // Cameras can take the same clear.
        let mut scene = RenderScene::new();
        scene.add_camera(camera().with_target(texture.framebuffer.clone()).with_clear(clear));
        frame(&mut renderer, &scene);
        assert_eq!(settle(&device).clears, 2);
    }
}

/// Fills whatever target it is given with one color.
struct Fill {
    name: &'static str,
    color: LinearRgba,
    renders: Arc<AtomicUsize>,
    deactivated: Arc<AtomicUsize>,
}

impl Fill {
    fn new(name: &'static str, color: LinearRgba) -> Self {
        Self {
            name,
            color,
            renders: Arc::default(),
            deactivated: Arc::default(),
        }
    }
}

impl PostProcess for Fill {
    fn name(&self) -> &str {
        self.name
    }

    fn render(
        &mut self,
        ctx: &mut DrawContext<'_>,
        _source: &Arc<GraphicsTexture>,
    ) -> lumen_lanes::render_lane::Result<()> {
        ctx.list()
            .clear_framebuffer(ClearFlags::COLOR, self.color, 1.0, 0)?;
        self.renders.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.deactivated.fetch_add(1, Ordering::Relaxed);
    }
}

fn frame(renderer: &mut lumen_lanes::RenderPipeline, scene: &RenderScene) {
    renderer.render_begin().unwrap();
    renderer.render(scene).unwrap();
    renderer.render_end().unwrap();
}

#[test]
fn test_post_process_edits_apply_on_next_frame() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 8, 8);
        let mut scene = RenderScene::new();
        scene.add_camera(camera().with_clear(clear(LinearRgba::BLACK)));
        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(target.framebuffer.clone()));

        let fill = Fill::new("fill-red", LinearRgba::RED);
        let (renders, deactivated) = (fill.renders.clone(), fill.deactivated.clone());
        let id = renderer.add_post_process(RenderQueue::Opaque, Box::new(fill));
        assert!(renderer.post_process().stage_names(RenderQueue::Opaque).is_empty());
        assert_eq!(renderer.post_process().pending_len(), 1);

        frame(&mut renderer, &scene);
        assert_eq!(renderer.post_process().stage_names(RenderQueue::Opaque), vec!["fill-red"]);
        assert_eq!(renders.load(Ordering::Relaxed), 1);
        let pixels = renderer.read_render_texture(&target.color, 0).unwrap();
        assert!(all_texels(&pixels, [255, 0, 0, 255]));

        assert!(renderer.remove_post_process(id));
        assert_eq!(deactivated.load(Ordering::Relaxed), 0);
        frame(&mut renderer, &scene);
        assert_eq!(deactivated.load(Ordering::Relaxed), 1);
        assert_eq!(renders.load(Ordering::Relaxed), 1);
        let pixels = renderer.read_render_texture(&target.color, 0).unwrap();
        assert!(all_texels(&pixels, [0, 0, 0, 255]));
        assert!(!renderer.remove_post_process(id));
    }
}

#[test]
fn test_post_process_chain_ends_in_output() {
    let device = device(GraphicsBackendType::Immediate);
    let target = target(device.as_ref(), 8, 8);
    let mut scene = RenderScene::new();
    scene.add_camera(camera().with_clear(clear(LinearRgba::BLACK)));
    let mut renderer = renderer(&device, RenderSettings::default());
    renderer.set_render_texture(Some(target.framebuffer.clone()));
    renderer.add_post_process(RenderQueue::PostProcess, Box::new(Fill::new("white", LinearRgba::WHITE)));
    renderer.add_post_process(RenderQueue::PostProcess, Box::new(Fill::new("red", LinearRgba::RED)));
    frame(&mut renderer, &scene);
    let pixels = renderer.read_render_texture(&target.color, 0).unwrap();
    assert!(all_texels(&pixels, [255, 0, 0, 255]));

    let mut disabled = RenderSettings::default();
    disabled.post_process_enabled = false;
    let mut plain = common::renderer(&device, disabled);
    plain.set_render_texture(Some(target.framebuffer.clone()));
    plain.add_post_process(RenderQueue::PostProcess, Box::new(Fill::new("red", LinearRgba::RED)));
    frame(&mut plain, &scene);
    let pixels = plain.read_render_texture(&target.color, 0).unwrap();
    assert!(all_texels(&pixels, [0, 0, 0, 255]));
}

#[test]
fn test_failed_activation_drops_the_stage() {
    let device = device(GraphicsBackendType::Immediate);
    let target = target(device.as_ref(), 8, 8);
    let mesh = triangle(device.as_ref());
    let no_post = material(device.as_ref(), "no-post", &[RenderQueue::Opaque]);
    let mut scene = RenderScene::new();
    scene.add_camera(camera());
    let mut renderer = renderer(&device, RenderSettings::default());
    renderer.set_render_texture(Some(target.framebuffer.clone()));

    renderer.add_post_process(
        RenderQueue::PostProcess,
        Box::new(FullscreenMaterialStage::new("broken", no_post, mesh)),
    );
    frame(&mut renderer, &scene);
    assert!(renderer.post_process().stage_names(RenderQueue::PostProcess).is_empty());
    assert_eq!(renderer.post_process().pending_len(), 0);
}

#[test]
fn test_fullscreen_stage_draws_its_post_process_pass() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 8, 8);
        let mesh = triangle(device.as_ref());
        let tonemap: Arc<Material> = material(device.as_ref(), "tonemap", &[RenderQueue::PostProcess]);
        let mut scene = RenderScene::new();
        scene.add_camera(camera());
        let mut renderer = renderer(&device, RenderSettings::default());
        renderer.set_render_texture(Some(target.framebuffer.clone()));

        renderer.add_post_process(
            RenderQueue::PostProcess,
            Box::new(FullscreenMaterialStage::new("tonemap", tonemap.clone(), mesh)),
        );
        frame(&mut renderer, &scene);
        assert_eq!(renderer.post_process().stage_names(RenderQueue::PostProcess), vec!["tonemap"]);
        assert!(tonemap.is_setup());
        assert_eq!(settle(&device).draw_calls, 1);
    }
}
