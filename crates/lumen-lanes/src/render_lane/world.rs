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

//! The scene as the render lane sees it: meshes, objects and cameras.

use lumen_core::math::{BoundingVolume, Frustum, LinearRgba, Mat4, Vec3};
use lumen_core::renderer::material::{CameraSemantics, Material};
use lumen_core::renderer::{
    ClearFlags, GraphicsBuffer, GraphicsFramebuffer, GraphicsInputLayout, IndexFormat, RenderQueue,
    RenderSettings,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// GPU geometry: vertex buffers matching an input layout, plus optional indices.
#[derive(Debug, Clone)]
pub struct RenderMesh {
    /// Layout the vertex buffers follow.
    pub input_layout: Arc<GraphicsInputLayout>,
    /// One buffer per input layout slot, in slot order.
    pub vertex_buffers: Vec<Arc<GraphicsBuffer>>,
    /// Vertices drawn by a non-indexed draw.
    pub vertex_count: u32,
    /// Index buffer and its element format.
    pub index_buffer: Option<(Arc<GraphicsBuffer>, IndexFormat)>,
    /// Indices drawn by an indexed draw.
    pub index_count: u32,
}

impl RenderMesh {
    /// A non-indexed mesh.
    pub fn new(
        input_layout: Arc<GraphicsInputLayout>,
        vertex_buffers: Vec<Arc<GraphicsBuffer>>,
        vertex_count: u32,
    ) -> Self {
        Self {
            input_layout,
            vertex_buffers,
            vertex_count,
            index_buffer: None,
            index_count: 0,
        }
    }

    /// Adds an index buffer; draws become indexed.
    pub fn with_indices(mut self, buffer: Arc<GraphicsBuffer>, format: IndexFormat, count: u32) -> Self {
        self.index_buffer = Some((buffer, format));
        self.index_count = count;
        self
    }

    /// Returns `true` when draws use the index buffer.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }
}

/// Identity of an object registered in a [`RenderScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderObjectId(u64);

impl RenderObjectId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A drawable: a mesh, the material drawing it and where it sits in the world.
#[derive(Debug)]
pub struct RenderObject {
    id: RenderObjectId,
    /// The geometry.
    pub mesh: Arc<RenderMesh>,
    /// The material; its techniques decide which queues the object enters.
    pub material: Arc<Material>,
    /// Object to world.
    pub transform: Mat4,
    /// Object-space bounds. `None` means the object is never culled.
    pub bounds: Option<BoundingVolume>,
    /// Instances drawn per draw call.
    pub instance_count: u32,
    /// Whether the object also enters the shadow queue.
    pub casts_shadows: bool,
}

impl RenderObject {
    /// An object at the origin with no bounds, one instance and no shadows.
    pub fn new(mesh: Arc<RenderMesh>, material: Arc<Material>) -> Self {
        Self {
            id: RenderObjectId::next(),
            mesh,
            material,
            transform: Mat4::IDENTITY,
            bounds: None,
            instance_count: 1,
            casts_shadows: false,
        }
    }

    /// Sets the object to world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the object-space bounds.
    pub fn with_bounds(mut self, bounds: BoundingVolume) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Sets the instance count.
    pub fn with_instances(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Makes the object cast shadows.
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    /// Object identity.
    pub fn id(&self) -> RenderObjectId {
        self.id
    }

    /// The bounds in world space, if any.
    pub fn world_bounds(&self) -> Option<BoundingVolume> {
        self.bounds.map(|b| b.transform(&self.transform))
    }

    /// The world-space point distances are measured to.
    pub fn world_center(&self) -> Vec3 {
        self.world_bounds()
            .map_or_else(|| self.transform.translation(), |b| b.center())
    }
}

/// What a camera renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKind {
    /// Scene geometry, then post-processing.
    Main,
    /// Shadow casters only, from a light's point of view.
    Shadow,
}

impl CameraKind {
    /// The queues drawn by cameras of this kind, in drawing order.
    pub fn queues(&self) -> &'static [RenderQueue] {
        match self {
            CameraKind::Main => &[RenderQueue::Opaque, RenderQueue::Transparent, RenderQueue::PostProcess],
            CameraKind::Shadow => &[RenderQueue::Shadow],
        }
    }
}

/// Clear applied to a camera's target before it draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraClear {
    /// Cleared aspects.
    pub flags: ClearFlags,
    /// Color value.
    pub color: LinearRgba,
    /// Depth value.
    pub depth: f32,
    /// Stencil value.
    pub stencil: u32,
}

impl CameraClear {
    /// Clears every aspect to the values configured in `settings`.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            flags: ClearFlags::ALL,
            color: settings.clear_color,
            depth: settings.clear_depth,
            stencil: settings.clear_stencil,
        }
    }
}

/// A point of view the scene is rendered from.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Main or shadow camera.
    pub kind: CameraKind,
    /// Cameras render in ascending order; equal orders keep insertion order.
    pub order: i32,
    /// World to camera.
    pub view: Mat4,
    /// Camera to clip.
    pub projection: Mat4,
    /// Vertical field of view in radians.
    pub aperture: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Position in world space.
    pub position: Vec3,
    /// Forward direction in world space.
    pub direction: Vec3,
    /// Framebuffer the camera renders into. `None` uses the pipeline's render texture.
    pub target: Option<Arc<GraphicsFramebuffer>>,
    /// Clear applied before drawing, if any.
    pub clear: Option<CameraClear>,
}

impl Camera {
    /// A perspective camera at `eye` looking at `target`.
    ///
    /// Returns `None` when `eye` and `target` coincide or `up` is parallel to
    /// the view direction.
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        aperture: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Option<Self> {
        let view = Mat4::look_at_rh(eye, target, up)?;
        Some(Self {
            kind: CameraKind::Main,
            order: 0,
            view,
            projection: Mat4::perspective_rh_zo(aperture, aspect_ratio, near, far),
            aperture,
            near,
            far,
            position: eye,
            direction: (target - eye).normalize(),
            target: None,
            clear: None,
        })
    }

    /// Turns the camera into a shadow camera.
    pub fn as_shadow(mut self) -> Self {
        self.kind = CameraKind::Shadow;
        self
    }

    /// Sets the render order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Sets the target framebuffer.
    pub fn with_target(mut self, target: Arc<GraphicsFramebuffer>) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the clear applied before drawing.
    pub fn with_clear(mut self, clear: CameraClear) -> Self {
        self.clear = Some(clear);
        self
    }

    /// World to clip.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// The view volume in world space.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// Depth of a world-space point along the view direction.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        -self.view.transform_point3(point).z
    }

    /// The values this camera feeds into the semantic table.
    pub fn semantics(&self) -> CameraSemantics {
        CameraSemantics {
            view: self.view,
            projection: self.projection,
            aperture: self.aperture,
            near: self.near,
            far: self.far,
            position: self.position,
            direction: self.direction,
        }
    }
}

/// Every object and camera of a frame.
#[derive(Debug, Default)]
pub struct RenderScene {
    objects: Vec<Arc<RenderObject>>,
    cameras: Vec<Camera>,
}

impl RenderScene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object and returns its id.
    pub fn add_object(&mut self, object: RenderObject) -> RenderObjectId {
        let id = object.id();
        self.objects.push(Arc::new(object));
        id
    }

    /// Unregisters an object. Returns `false` if it was not registered.
    pub fn remove_object(&mut self, id: RenderObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.id() != id);
        self.objects.len() != before
    }

    /// Registered objects, in registration order.
    pub fn objects(&self) -> &[Arc<RenderObject>] {
        &self.objects
    }

    /// Adds a camera.
    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.push(camera);
    }

    /// Cameras in render order.
    pub fn cameras(&self) -> Vec<&Camera> {
        let mut cameras: Vec<_> = self.cameras.iter().collect();
        cameras.sort_by_key(|c| c.order);
        cameras
    }

    /// Removes every object and camera.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.cameras.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumen_core::math::BoundingSphere;

    fn camera() -> Camera {
        Camera::perspective(Vec3::ZERO, -Vec3::Z, Vec3::Y, 1.0, 1.0, 0.1, 100.0)
            .expect("valid camera")
    }

    #[test]
    fn test_distance_is_view_depth() {
        let camera = camera();
        assert_relative_eq!(camera.distance_to(Vec3::new(3.0, 1.0, -10.0)), 10.0, epsilon = 1e-4);
        assert!(camera.distance_to(Vec3::new(0.0, 0.0, 5.0)) < 0.0);
    }

    #[test]
    fn test_cameras_sorted_by_order_stably() {
        let mut scene = RenderScene::new();
        scene.add_camera(camera().with_order(1));
        scene.add_camera(camera().as_shadow().with_order(-1));
        scene.add_camera(camera().with_order(1).as_shadow());
        let kinds: Vec<_> = scene.cameras().iter().map(|c| (c.order, c.kind)).collect();
        assert_eq!(
            kinds,
            vec![(-1, CameraKind::Shadow), (1, CameraKind::Main), (1, CameraKind::Shadow)]
        );
    }

    #[test]
    fn test_world_bounds_follow_transform() {
        let sphere = BoundingVolume::Sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
        let bounds = sphere.transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        assert_relative_eq!(bounds.center().z, -5.0);
    }
}
