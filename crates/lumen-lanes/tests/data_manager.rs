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
use lumen_core::math::Vec3;
use lumen_core::renderer::{GraphicsBackendType, RenderPass, RenderQueue};
use lumen_lanes::render_lane::{BucketIndex, RenderDataManager, RenderObject, RenderScene};
use std::sync::Arc;

fn names(manager: &RenderDataManager, queue: RenderQueue) -> Vec<String> {
    manager
        .buckets()
        .non_empty(queue)
        .flat_map(|(_, items)| items.iter().map(|i| i.object.material.name().to_string()))
        .collect()
}

#[test]
fn test_frustum_culls_objects_beyond_far_plane() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let material = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
    let camera = camera();

    let mut scene = RenderScene::new();
    let far = scene.add_object(object_at(&mesh, &material, Vec3::new(0.0, 0.0, -camera.far * 2.0)));
    let near = scene.add_object(object_at(&mesh, &material, Vec3::new(0.0, 0.0, -camera.far * 0.5)));
    scene.add_camera(camera.clone());

    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &camera);
    let opaque = manager.buckets().get(BucketIndex::new(RenderQueue::Opaque, RenderPass::Color));
    assert_eq!(opaque.len(), 1);
    assert_eq!(opaque[0].object.id(), near);
    assert_ne!(opaque[0].object.id(), far);
    assert_eq!(manager.stats().visible, 1);
    assert_eq!(manager.stats().culled, 1);
}

#[test]
fn test_objects_without_bounds_are_visible() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let material = material(device.as_ref(), "lit", &[RenderQueue::Opaque]);
    let camera = camera();

    let mut scene = RenderScene::new();
    // Behind the camera, but nothing to test it against.
    scene.add_object(
        RenderObject::new(mesh.clone(), material.clone())
            .with_transform(lumen_core::math::Mat4::from_translation(Vec3::new(0.0, 0.0, 500.0))),
    );
    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &camera);
    assert_eq!(manager.buckets().len(), 1);
    assert_eq!(manager.stats().unbounded, 1);
    assert_eq!(manager.stats().culled, 0);
}

#[test]
fn test_opaque_buckets_group_by_material_and_stay_stable() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let stone = material(device.as_ref(), "stone", &[RenderQueue::Opaque]);
    let metal = material(device.as_ref(), "metal", &[RenderQueue::Opaque]);
    let camera = camera();

    let mut scene = RenderScene::new();
    for (i, material) in [&stone, &metal, &stone, &metal].into_iter().enumerate() {
        scene.add_object(object_at(&mesh, material, Vec3::new(i as f32, 0.0, -10.0)));
    }
    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &camera);
    let first = names(&manager, RenderQueue::Opaque);
    let ids: Vec<_> = manager
        .buckets()
        .get(BucketIndex::new(RenderQueue::Opaque, RenderPass::Color))
        .iter()
        .map(|i| i.object.id())
        .collect();
    // Equal materials are adjacent.
    assert_eq!(first[0], first[1]);
    assert_eq!(first[2], first[3]);
    assert_ne!(first[1], first[2]);

    manager.prepare(&scene, &camera);
    let again: Vec<_> = manager
        .buckets()
        .get(BucketIndex::new(RenderQueue::Opaque, RenderPass::Color))
        .iter()
        .map(|i| i.object.id())
        .collect();
    assert_eq!(ids, again);
}

#[test]
fn test_transparent_queue_sorts_by_ascending_distance() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let glass = material(device.as_ref(), "glass", &[RenderQueue::Transparent]);
    let camera = camera();

    let mut scene = RenderScene::new();
    for depth in [30.0, 5.0, 60.0, 12.0] {
        scene.add_object(object_at(&mesh, &glass, Vec3::new(0.0, 0.0, -depth)));
    }
    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &camera);
    let distances: Vec<f32> = manager
        .buckets()
        .get(BucketIndex::new(RenderQueue::Transparent, RenderPass::Color))
        .iter()
        .map(|i| i.distance)
        .collect();
    assert_eq!(distances.len(), 4);
    for (got, want) in distances.iter().zip([5.0, 12.0, 30.0, 60.0]) {
        approx::assert_relative_eq!(*got, want, epsilon = 1e-3);
    }
}

#[test]
fn test_shadow_queue_needs_casters_and_shadow_cameras() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let material = material(device.as_ref(), "caster", &[RenderQueue::Shadow, RenderQueue::Opaque]);
    let main = camera();
    let shadow = camera().as_shadow();

    let mut scene = RenderScene::new();
    scene.add_object(object_at(&mesh, &material, Vec3::new(0.0, 0.0, -10.0)).with_shadows(true));
    scene.add_object(object_at(&mesh, &material, Vec3::new(1.0, 0.0, -10.0)).with_shadows(false));

    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &shadow);
    let shadow_items = manager
        .buckets()
        .get(BucketIndex::new(RenderQueue::Shadow, RenderPass::DepthPrepass));
    assert_eq!(shadow_items.len(), 1);
    assert!(shadow_items[0].object.casts_shadows);
    assert_eq!(names(&manager, RenderQueue::Opaque).len(), 0);

    manager.prepare(&scene, &main);
    assert_eq!(names(&manager, RenderQueue::Shadow).len(), 0);
    assert_eq!(names(&manager, RenderQueue::Opaque).len(), 2);

    let mut disabled = RenderDataManager::new(false);
    disabled.prepare(&scene, &shadow);
    assert!(disabled.buckets().is_empty());
}

#[test]
fn test_materials_without_a_technique_skip_the_queue() {
    let device = device(GraphicsBackendType::Immediate);
    let mesh = triangle(device.as_ref());
    let opaque_only = material(device.as_ref(), "opaque", &[RenderQueue::Opaque]);
    let mut scene = RenderScene::new();
    scene.add_object(object_at(&mesh, &opaque_only, Vec3::new(0.0, 0.0, -4.0)));

    let mut manager = RenderDataManager::new(true);
    manager.prepare(&scene, &camera());
    assert_eq!(names(&manager, RenderQueue::Transparent).len(), 0);
    assert_eq!(names(&manager, RenderQueue::Opaque), vec!["opaque".to_string()]);
    assert!(Arc::ptr_eq(
        &manager.buckets().get(BucketIndex::new(RenderQueue::Opaque, RenderPass::Color))[0].pass,
        &opaque_only.get_technique(RenderQueue::Opaque).unwrap().passes()[0],
    ));
}
