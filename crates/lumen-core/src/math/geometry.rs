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

//! Bounding volumes and the view frustum used for visibility culling.

use super::matrix::Mat4;
use super::vector::{Vec3, Vec4};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Builds a box from two corners, sorting the components.
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a box from a center and half extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::from_min_max(center - half_extents, center + half_extents)
    }

    /// The center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The box enclosing this box after `matrix` is applied to its eight corners.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let first = matrix.transform_point3(corners[0]);
        let (min, max) = corners[1..]
            .iter()
            .map(|c| matrix.transform_point3(*c))
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Self { min, max }
    }
}

/// A bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere.
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a sphere.
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Applies `matrix`, scaling the radius by the largest axis scale.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * matrix.max_axis_scale(),
        }
    }
}

/// The bounding volume attached to a renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// A sphere.
    Sphere(BoundingSphere),
    /// An axis-aligned box.
    Box(Aabb),
}

impl BoundingVolume {
    /// The volume in the space described by `matrix`.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        match self {
            BoundingVolume::Sphere(s) => BoundingVolume::Sphere(s.transform(matrix)),
            BoundingVolume::Box(b) => BoundingVolume::Box(b.transform(matrix)),
        }
    }

    /// The center of the volume.
    pub fn center(&self) -> Vec3 {
        match self {
            BoundingVolume::Sphere(s) => s.center,
            BoundingVolume::Box(b) => b.center(),
        }
    }
}

/// A plane `normal . p + d = 0`. Points with a positive signed distance are in front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// The unit normal.
    pub normal: Vec3,
    /// The plane constant.
    pub d: f32,
}

impl Plane {
    fn from_vec4(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal * (1.0 / len),
                d: v.w / len,
            }
        } else {
            Self { normal, d: v.w }
        }
    }

    /// Signed distance from `point` to the plane.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// The six planes of a camera's view volume, normals pointing inwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes of a `[0, 1]` depth range view-projection matrix.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.get_row(0);
        let r1 = view_projection.get_row(1);
        let r2 = view_projection.get_row(2);
        let r3 = view_projection.get_row(3);
        Self {
            planes: [
                Plane::from_vec4(r3 + r0),
                Plane::from_vec4(r3 - r0),
                Plane::from_vec4(r3 + r1),
                Plane::from_vec4(r3 - r1),
                Plane::from_vec4(r2),
                Plane::from_vec4(r3 - r2),
            ],
        }
    }

    /// Returns `false` when the sphere lies entirely behind any plane.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(sphere.center) >= -sphere.radius)
    }

    /// Returns `false` when the box lies entirely behind any plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|p| {
            // Corner furthest along the plane normal.
            let positive = Vec3::new(
                if p.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            p.signed_distance(positive) >= 0.0
        })
    }

    /// Tests any bounding volume.
    pub fn intersects(&self, volume: &BoundingVolume) -> bool {
        match volume {
            BoundingVolume::Sphere(s) => self.intersects_sphere(s),
            BoundingVolume::Box(b) => self.intersects_aabb(b),
        }
    }
}
