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

//! # Lumen Lanes
//!
//! Hot-path frame orchestration on top of the `lumen-core` contracts: culling
//! and sorting scene objects into the render-queue by render-pass bucket
//! table, caching pipeline state objects, running the post-process chain and
//! recording the frame through a [`RenderPipeline`](render_lane::RenderPipeline).
//!
//! Nothing here depends on a concrete backend; any
//! [`GraphicsDevice`](lumen_core::renderer::GraphicsDevice) will do.

#![warn(missing_docs)]

pub mod render_lane;

pub use render_lane::{
    Camera, CameraKind, RenderDataManager, RenderMesh, RenderObject, RenderPipeline,
    RenderPipelineError, RenderScene,
};
