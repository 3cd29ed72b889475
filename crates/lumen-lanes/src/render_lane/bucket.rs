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

//! The dense render-queue by render-pass table of draw lists.

use super::error::{RenderPipelineError, Result};
use super::world::RenderObject;
use lumen_core::renderer::material::MaterialPass;
use lumen_core::renderer::{RenderPass, RenderQueue};
use std::sync::Arc;

/// A checked (queue, pass) coordinate in the bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketIndex {
    queue: RenderQueue,
    pass: RenderPass,
}

impl BucketIndex {
    /// Number of buckets in the table.
    pub const COUNT: usize = RenderQueue::COUNT * RenderPass::COUNT;

    /// The bucket of `pass` inside `queue`.
    pub const fn new(queue: RenderQueue, pass: RenderPass) -> Self {
        Self { queue, pass }
    }

    /// Builds an index from raw integers, rejecting out-of-range values.
    pub fn from_raw(queue: usize, pass: usize) -> Result<Self> {
        let queue = RenderQueue::from_index(queue).ok_or(RenderPipelineError::QueueOutOfRange(queue))?;
        let pass = RenderPass::from_index(pass).ok_or(RenderPipelineError::PassOutOfRange(pass))?;
        Ok(Self::new(queue, pass))
    }

    /// The queue.
    pub fn queue(&self) -> RenderQueue {
        self.queue
    }

    /// The pass.
    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    fn slot(&self) -> usize {
        self.queue.index() * RenderPass::COUNT + self.pass.index()
    }
}

/// One entry of a bucket: an object and the material pass drawing it.
#[derive(Debug, Clone)]
pub struct DrawItem {
    /// The object.
    pub object: Arc<RenderObject>,
    /// The material pass to draw with.
    pub pass: Arc<MaterialPass>,
    /// Depth of the object's center along the camera's view direction.
    pub distance: f32,
}

/// Draw lists for every (queue, pass) pair, rebuilt each frame.
#[derive(Debug)]
pub struct RenderBuckets {
    buckets: Vec<Vec<DrawItem>>,
}

impl Default for RenderBuckets {
    fn default() -> Self {
        Self {
            buckets: vec![Vec::new(); BucketIndex::COUNT],
        }
    }
}

impl RenderBuckets {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every bucket, keeping allocations.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
    }

    /// Appends an item.
    pub fn push(&mut self, index: BucketIndex, item: DrawItem) {
        self.buckets[index.slot()].push(item);
    }

    /// The items of one bucket.
    pub fn get(&self, index: BucketIndex) -> &[DrawItem] {
        &self.buckets[index.slot()]
    }

    /// Mutable access to one bucket.
    pub fn get_mut(&mut self, index: BucketIndex) -> &mut Vec<DrawItem> {
        &mut self.buckets[index.slot()]
    }

    /// The items at raw coordinates.
    pub fn at(&self, queue: usize, pass: usize) -> Result<&[DrawItem]> {
        Ok(self.get(BucketIndex::from_raw(queue, pass)?))
    }

    /// Non-empty buckets of `queue`, in pass order.
    pub fn non_empty(&self, queue: RenderQueue) -> impl Iterator<Item = (RenderPass, &[DrawItem])> {
        RenderPass::ALL.into_iter().filter_map(move |pass| {
            let items = self.get(BucketIndex::new(queue, pass));
            (!items.is_empty()).then_some((pass, items))
        })
    }

    /// Total number of items.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns `true` when every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_cover_the_table() {
        let mut slots: Vec<_> = RenderQueue::ALL
            .into_iter()
            .flat_map(|q| RenderPass::ALL.into_iter().map(move |p| BucketIndex::new(q, p).slot()))
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..BucketIndex::COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_raw_indices_are_range_checked() {
        assert_eq!(
            BucketIndex::from_raw(1, 1).unwrap(),
            BucketIndex::new(RenderQueue::Opaque, RenderPass::Color)
        );
        assert!(matches!(
            BucketIndex::from_raw(RenderQueue::COUNT, 0),
            Err(RenderPipelineError::QueueOutOfRange(4))
        ));
        assert!(matches!(
            BucketIndex::from_raw(0, RenderPass::COUNT),
            Err(RenderPipelineError::PassOutOfRange(3))
        ));
        let buckets = RenderBuckets::new();
        assert!(buckets.at(9, 0).is_err());
        assert!(buckets.at(3, 2).unwrap().is_empty());
        assert!(buckets.is_empty());
    }
}
