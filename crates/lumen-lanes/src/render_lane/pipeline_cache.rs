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

//! Reuse of pipeline state objects across draws and frames.

use ahash::AHashMap;
use lumen_core::renderer::{
    Creatable, DeviceChild, GraphicsDevice, GraphicsPipeline, GraphicsPipelineDescriptor,
    ResourceError, ResourceHandle,
};
use std::sync::Arc;

/// The component identities a pipeline is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ResourceHandle,
    input_layout: ResourceHandle,
    descriptor_set_layout: ResourceHandle,
    framebuffer_layout: ResourceHandle,
    state: ResourceHandle,
}

impl PipelineKey {
    fn of(desc: &GraphicsPipelineDescriptor) -> Self {
        Self {
            program: desc.program.handle(),
            input_layout: desc.input_layout.handle(),
            descriptor_set_layout: desc.descriptor_set_layout.handle(),
            framebuffer_layout: desc.framebuffer_layout.handle(),
            state: desc.state.handle(),
        }
    }
}

/// Hit and miss counters of a [`PipelineCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCacheStats {
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that created an object.
    pub misses: u64,
}

/// Caches pipelines by component identity.
///
/// Two requests with the same components yield the same `Arc`.
#[derive(Debug, Default)]
pub struct PipelineCache {
    pipelines: AHashMap<PipelineKey, Arc<GraphicsPipeline>>,
    stats: PipelineCacheStats,
}

impl PipelineCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached pipeline built from the components of `desc`, creating it on a miss.
    pub fn get_or_create(
        &mut self,
        device: &dyn GraphicsDevice,
        desc: &GraphicsPipelineDescriptor,
    ) -> Result<Arc<GraphicsPipeline>, ResourceError> {
        let key = PipelineKey::of(desc);
        if let Some(pipeline) = self.pipelines.get(&key) {
            self.stats.hits += 1;
            return Ok(pipeline.clone());
        }
        let pipeline = device.create_pipeline(desc)?;
        log::debug!("Cached pipeline {:?} ({} cached)", pipeline.handle(), self.pipelines.len() + 1);
        self.stats.misses += 1;
        self.pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Drops pipelines whose device or components are gone. Returns how many were dropped.
    pub fn purge_invalid(&mut self) -> usize {
        let before = self.pipelines.len();
        self.pipelines.retain(|_, p| p.is_valid());
        let purged = before - self.pipelines.len();
        if purged > 0 {
            log::debug!("Purged {purged} invalid pipeline(s)");
        }
        purged
    }

    /// Drops pipelines that hold the last reference to one of their components,
    /// such as the program of a dropped material or the layout of a dropped
    /// target. Returns how many were dropped.
    pub fn evict_unused(&mut self) -> usize {
        let before = self.pipelines.len();
        self.pipelines.retain(|_, p| {
            let desc = p.descriptor();
            Arc::strong_count(&desc.program) > 1
                && Arc::strong_count(&desc.input_layout) > 1
                && Arc::strong_count(&desc.descriptor_set_layout) > 1
                && Arc::strong_count(&desc.framebuffer_layout) > 1
                && Arc::strong_count(&desc.state) > 1
        });
        let evicted = before - self.pipelines.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} unused pipeline(s)");
        }
        evicted
    }

    /// Number of cached pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns `true` when no pipeline is cached.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Hit and miss counters.
    pub fn stats(&self) -> PipelineCacheStats {
        self.stats
    }

    /// Forgets every cached object.
    pub fn clear(&mut self) {
        self.pipelines.clear();
    }
}
