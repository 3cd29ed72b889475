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

//! Fixtures shared by the backend integration tests.

#![allow(dead_code)]

use lumen_core::renderer::*;
use lumen_infra::create_device;
use std::sync::Arc;

pub const BACKENDS: [GraphicsBackendType; 2] =
    [GraphicsBackendType::Immediate, GraphicsBackendType::Explicit];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device(backend: GraphicsBackendType) -> Arc<dyn GraphicsDevice> {
    init_logger();
    create_device(&DeviceDescriptor {
        label: Some(format!("{backend:?} test device").into()),
        backend,
    })
}

/// A single-color-attachment render target.
pub struct Target {
    pub layout: Arc<GraphicsFramebufferLayout>,
    pub color: Arc<GraphicsTexture>,
    pub framebuffer: Arc<GraphicsFramebuffer>,
}

pub fn target(device: &dyn GraphicsDevice, width: u32, height: u32) -> Target {
    let layout = device
        .create_framebuffer_layout(&FramebufferLayoutDescriptor {
            label: None,
            color_attachments: vec![AttachmentLayout::new(TextureFormat::Rgba8Unorm)],
            depth_stencil_attachment: None,
        })
        .unwrap();
    let color = device
        .create_texture(&TextureDescriptor::new_2d(
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC | TextureUsage::COPY_DST,
        ))
        .unwrap();
    let framebuffer = device
        .create_framebuffer(&FramebufferDescriptor {
            label: None,
            layout: layout.clone(),
            color_attachments: vec![color.clone()],
            depth_stencil_attachment: None,
            width,
            height,
        })
        .unwrap();
    Target {
        layout,
        color,
        framebuffer,
    }
}

pub fn shader(
    device: &dyn GraphicsDevice,
    stage: ShaderStage,
    uniforms: &[(&'static str, UniformType)],
) -> Arc<GraphicsShader> {
    device
        .create_shader(&ShaderDescriptor {
            label: None,
            stage,
            bytecode: b"void main() {}".to_vec(),
            entry_point: "main".into(),
            uniforms: uniforms
                .iter()
                .map(|(name, ty)| ShaderUniformDescriptor::new(*name, *ty))
                .collect(),
        })
        .unwrap()
}

pub fn set_layout(
    device: &dyn GraphicsDevice,
    uniforms: &[(&'static str, UniformType)],
) -> Arc<GraphicsDescriptorSetLayout> {
    device
        .create_descriptor_set_layout(&DescriptorSetLayoutDescriptor {
            label: None,
            bindings: uniforms
                .iter()
                .enumerate()
                .map(|(i, (name, ty))| DescriptorBinding {
                    binding: i as u32,
                    name: (*name).into(),
                    ty: *ty,
                    stages: ShaderStageFlags::VERTEX_FRAGMENT,
                })
                .collect(),
        })
        .unwrap()
}

/// A position-only input layout with one vertex buffer slot.
pub fn position_layout(device: &dyn GraphicsDevice) -> Arc<GraphicsInputLayout> {
    device
        .create_input_layout(&InputLayoutDescriptor {
            label: None,
            buffers: vec![VertexBufferLayout {
                stride: 12,
                step_mode: VertexStepMode::Vertex,
                attributes: vec![VertexAttribute {
                    location: 0,
                    format: VertexFormat::Float32x3,
                    offset: 0,
                }],
            }],
        })
        .unwrap()
}

/// A pipeline whose vertex stage reads `uniforms`, drawing into `layout`.
pub fn pipeline(
    device: &dyn GraphicsDevice,
    layout: &Arc<GraphicsFramebufferLayout>,
    uniforms: &[(&'static str, UniformType)],
) -> Arc<GraphicsPipeline> {
    let program = device
        .create_program(&ProgramDescriptor {
            label: None,
            shaders: vec![
                shader(device, ShaderStage::Vertex, uniforms),
                shader(device, ShaderStage::Fragment, &[]),
            ],
        })
        .unwrap();
    device
        .create_pipeline(&GraphicsPipelineDescriptor {
            label: None,
            program,
            input_layout: position_layout(device),
            descriptor_set_layout: set_layout(device, uniforms),
            framebuffer_layout: layout.clone(),
            state: device.create_state(&StateDescriptor::default()).unwrap(),
        })
        .unwrap()
}

pub fn buffer(device: &dyn GraphicsDevice, usage: BufferUsage, data: &[u8]) -> Arc<GraphicsBuffer> {
    device
        .create_buffer(&BufferDescriptor {
            label: None,
            size: data.len() as u64,
            usage,
            data: Some(data.to_vec()),
        })
        .unwrap()
}

pub fn queue(device: &dyn GraphicsDevice) -> Arc<GraphicsCommandQueue> {
    device
        .create_command_queue(&CommandQueueDescriptor {
            label: None,
            queue_type: QueueType::Graphics,
            priority: 1.0,
        })
        .unwrap()
}

pub fn list(
    device: &dyn GraphicsDevice,
    queue_type: QueueType,
    flags: CommandPoolFlags,
    usage: CommandListUsage,
) -> Arc<GraphicsCommandList> {
    let pool = device
        .create_command_pool(&CommandPoolDescriptor {
            label: None,
            queue_type,
            flags,
        })
        .unwrap();
    device
        .create_command_list(&CommandListDescriptor {
            label: None,
            pool,
            usage,
        })
        .unwrap()
}

pub fn graphics_list(device: &dyn GraphicsDevice) -> Arc<GraphicsCommandList> {
    list(
        device,
        QueueType::Graphics,
        CommandPoolFlags::RESET_COMMAND_BUFFER,
        CommandListUsage::EMPTY,
    )
}
