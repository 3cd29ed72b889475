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

//! Rendering lane - per-frame orchestration of scene draws.
//!
//! A frame runs `render_begin`, `render`, `render_end` on a [`RenderPipeline`].
//! `render` walks the scene's cameras, lets the [`RenderDataManager`] cull and
//! sort objects into [`RenderBuckets`], then records one draw per bucket entry
//! with pipeline state objects fetched from the [`PipelineCache`].

mod bucket;
mod data_manager;
mod draw;
mod error;
mod pipeline;
mod pipeline_cache;
mod post_process;
mod world;

pub use bucket::*;
pub use data_manager::*;
pub use draw::*;
pub use error::*;
pub use pipeline::*;
pub use pipeline_cache::*;
pub use post_process::*;
pub use world::*;
