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

//! Graphics backends.

pub mod explicit;
pub mod immediate;
pub mod soft;

use lumen_core::renderer::{DeviceDescriptor, GraphicsBackendType, GraphicsDevice};
use std::sync::Arc;

/// Creates the device selected by `descriptor.backend`.
pub fn create_device(descriptor: &DeviceDescriptor) -> Arc<dyn GraphicsDevice> {
    match descriptor.backend {
        GraphicsBackendType::Immediate => immediate::ImmediateDevice::new(descriptor),
        GraphicsBackendType::Explicit => explicit::ExplicitDevice::new(descriptor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::renderer::{ShaderStage, TextureDimension, TextureFormat};

    #[test]
    fn test_create_device_honors_backend() {
        for backend in [GraphicsBackendType::Immediate, GraphicsBackendType::Explicit] {
            let device = create_device(&DeviceDescriptor {
                label: None,
                backend,
            });
            assert_eq!(device.adapter_info().backend_type, backend);
        }
    }

    #[test]
    fn test_capability_tables_differ() {
        let immediate = create_device(&DeviceDescriptor::default());
        let explicit = create_device(&DeviceDescriptor {
            label: Some("explicit".into()),
            backend: GraphicsBackendType::Explicit,
        });
        assert!(!immediate.is_shader_supported(ShaderStage::Compute));
        assert!(explicit.is_shader_supported(ShaderStage::Compute));
        assert!(!immediate.is_texture_dimension_supported(TextureDimension::D3));
        assert!(immediate.is_texture_supported(TextureFormat::Depth24PlusStencil8));
        assert!(!explicit.is_texture_supported(TextureFormat::Depth24PlusStencil8));
        assert!(!explicit.is_texture_supported(TextureFormat::Rgba16Float));
        assert_eq!(explicit.adapter_info().name, "explicit");
    }
}
