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

//! Visibility culling and sorting of scene objects into the bucket table.

use super::bucket::{BucketIndex, DrawItem, RenderBuckets};
use super::world::{Camera, RenderObject, RenderScene};
use lumen_core::math::Frustum;
use lumen_core::renderer::{RenderPass, RenderQueue};
use std::cmp::Ordering;
use std::sync::Arc;

/// Per-camera culling counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Objects that passed the frustum test or have no bounds.
    pub visible: usize,
    /// Objects rejected by the frustum test.
    pub culled: usize,
    /// Objects without bounds, counted as visible.
    pub unbounded: usize,
}

/// Fills the bucket table for one camera at a time.
///
/// Objects without bounds are always visible. Buckets of distance sorted
/// queues are ordered by ascending view depth; other buckets group by material
/// first. Both sorts are stable, so ties keep registration order.
#[derive(Debug, Default)]
pub struct RenderDataManager {
    buckets: RenderBuckets,
    frustum: Option<Frustum>,
    stats: CullStats,
    shadows_enabled: bool,
}

impl RenderDataManager {
    /// A manager that fills the shadow queue when `shadows_enabled`.
    pub fn new(shadows_enabled: bool) -> Self {
        Self {
            shadows_enabled,
            ..Self::default()
        }
    }

    /// Culls, assigns and sorts every object of `scene` for `camera`.
    pub fn prepare(&mut self, scene: &RenderScene, camera: &Camera) {
        self.clear();
        let frustum = camera.frustum();
        self.frustum = Some(frustum);
        let queues = camera.kind.queues();
        for object in scene.objects() {
            if self.cull(&frustum, object) {
                continue;
            }
            self.assign(camera, queues, object);
        }
        self.sort();
        log::trace!(
            "Prepared {:?} camera: {} visible, {} culled, {} draw items",
            camera.kind,
            self.stats.visible,
            self.stats.culled,
            self.buckets.len()
        );
    }

    /// Empties the buckets and resets the counters.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.frustum = None;
        self.stats = CullStats::default();
    }

    /// Returns `true` if the object is outside the frustum.
    fn cull(&mut self, frustum: &Frustum, object: &RenderObject) -> bool {
        match object.world_bounds() {
            Some(bounds) if !frustum.intersects(&bounds) => {
                self.stats.culled += 1;
                true
            }
            Some(_) => {
                self.stats.visible += 1;
                false
            }
            None => {
                self.stats.visible += 1;
                self.stats.unbounded += 1;
                false
            }
        }
    }

    fn assign(&mut self, camera: &Camera, queues: &[RenderQueue], object: &Arc<RenderObject>) {
        let distance = camera.distance_to(object.world_center());
        for technique in object.material.techniques() {
            let queue = technique.queue();
            if !queues.contains(&queue) {
                continue;
            }
            if queue == RenderQueue::Shadow && !(self.shadows_enabled && object.casts_shadows) {
                continue;
            }
            for pass in technique.passes() {
                self.buckets.push(
                    BucketIndex::new(queue, pass.pass()),
                    DrawItem {
                        object: object.clone(),
                        pass: pass.clone(),
                        distance,
                    },
                );
            }
        }
    }

    fn sort(&mut self) {
        for queue in RenderQueue::ALL {
            for pass in RenderPass::ALL {
                let items = self.buckets.get_mut(BucketIndex::new(queue, pass));
                if queue.is_distance_sorted() {
                    items.sort_by(by_distance);
                } else {
                    items.sort_by(|a, b| {
                        a.object
                            .material
                            .id()
                            .cmp(&b.object.material.id())
                            .then_with(|| by_distance(a, b))
                    });
                }
            }
        }
    }

    /// The filled table.
    pub fn buckets(&self) -> &RenderBuckets {
        &self.buckets
    }

    /// The frustum of the last prepared camera.
    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }

    /// Counters of the last prepared camera.
    pub fn stats(&self) -> CullStats {
        self.stats
    }

    /// Whether shadow casters enter the shadow queue.
    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }
}

fn by_distance(a: &DrawItem, b: &DrawItem) -> Ordering {
    a.distance.total_cmp(&b.distance)
}
