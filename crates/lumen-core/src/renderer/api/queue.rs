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

//! Render queues and render passes, the two axes of the per-frame bucket table.

/// A coarse drawing phase. Each material technique targets exactly one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderQueue {
    /// Depth-only rendering from shadow casting lights.
    Shadow,
    /// Opaque geometry.
    Opaque,
    /// Alpha blended geometry.
    Transparent,
    /// Full-screen effects applied after scene geometry.
    PostProcess,
}

impl RenderQueue {
    /// Number of queues.
    pub const COUNT: usize = 4;

    /// Every queue, in drawing order.
    pub const ALL: [RenderQueue; Self::COUNT] = [
        RenderQueue::Shadow,
        RenderQueue::Opaque,
        RenderQueue::Transparent,
        RenderQueue::PostProcess,
    ];

    /// Dense index in `0..COUNT`.
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Inverse of [`index`](Self::index); `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` for queues whose buckets sort purely by camera distance.
    pub fn is_distance_sorted(&self) -> bool {
        matches!(self, RenderQueue::Transparent | RenderQueue::PostProcess)
    }
}

/// A sub-phase inside a render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderPass {
    /// Depth-only pre-pass, also used for shadow maps.
    DepthPrepass,
    /// Main shading pass.
    Color,
    /// Application defined pass drawn after the color pass.
    Custom,
}

impl RenderPass {
    /// Number of passes.
    pub const COUNT: usize = 3;

    /// Every pass, in drawing order.
    pub const ALL: [RenderPass; Self::COUNT] =
        [RenderPass::DepthPrepass, RenderPass::Color, RenderPass::Custom];

    /// Dense index in `0..COUNT`.
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Inverse of [`index`](Self::index); `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}
