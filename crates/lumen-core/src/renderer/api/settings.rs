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

//! Renderer and device configuration.

use super::common::GraphicsBackendType;
use crate::math::LinearRgba;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Selects and labels the device to create.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceDescriptor {
    /// Debug label.
    pub label: Option<Cow<'static, str>>,
    /// Backend to instantiate.
    pub backend: GraphicsBackendType,
}

/// Sizing of the descriptor pool a renderer allocates material sets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorPoolSettings {
    /// Maximum live sets.
    pub max_sets: u32,
    /// Image and sampler descriptors of each image type.
    pub images_per_type: u32,
    /// Buffer descriptors of each buffer type.
    pub buffers_per_type: u32,
    /// Whether dropped sets return their slots.
    pub free_descriptor_sets: bool,
}

impl Default for DescriptorPoolSettings {
    fn default() -> Self {
        Self {
            max_sets: 256,
            images_per_type: 512,
            buffers_per_type: 256,
            free_descriptor_sets: true,
        }
    }
}

/// Global settings of a renderer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Backend the renderer prefers.
    pub backend: GraphicsBackendType,
    /// Default clear color of cameras.
    pub clear_color: LinearRgba,
    /// Default clear depth.
    pub clear_depth: f32,
    /// Default clear stencil.
    pub clear_stencil: u32,
    /// Whether shadow casting objects enter the shadow queue.
    pub shadows_enabled: bool,
    /// Whether the post-process chain runs.
    pub post_process_enabled: bool,
    /// Descriptor pool sizing.
    pub descriptor_pool: DescriptorPoolSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            backend: GraphicsBackendType::default(),
            clear_color: LinearRgba::BLACK,
            clear_depth: 1.0,
            clear_stencil: 0,
            shadows_enabled: true,
            post_process_enabled: true,
            descriptor_pool: DescriptorPoolSettings::default(),
        }
    }
}

impl RenderSettings {
    /// Parses settings from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse render settings")
    }

    /// The device descriptor matching the preferred backend.
    pub fn device_descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            label: None,
            backend: self.backend,
        }
    }
}
