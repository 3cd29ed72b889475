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

//! Scenes, materials and devices shared by the frame tests.

#![allow(dead_code)]

use lumen_core::math::{BoundingSphere, BoundingVolume, LinearRgba, Mat4, Vec3};
use lumen_core::renderer::material::{Material, MaterialParam, MaterialPass, MaterialTech};
use lumen_core::renderer::*;
use lumen_infra::create_device;
use lumen_lanes::render_lane::{Camera, CameraClear, RenderMesh, RenderObject, RenderPipeline};
use std::sync::Arc;

pub const BACKENDS: [GraphicsBackendType; 2] =
    [GraphicsBackendType::Immediate, GraphicsBackendType::Explicit];

pub const SIZE: u32 = 256;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn device(backend: GraphicsBackendType) -> Arc<dyn GraphicsDevice> {
    init_logger();
    let settings = RenderSettings {
        backend,
        ..RenderSettings::default()
    };
    create_device(&DeviceDescriptor {
        label: Some(format!("{backend:?} frame device").into()),
        ..settings.device_descriptor()
    })
}

pub fn renderer(device: &Arc<dyn GraphicsDevice>, settings: RenderSettings) -> RenderPipeline {
    RenderPipeline::new(device.clone(), settings).unwrap()
}

/// One Rgba8 color target.
pub struct Target {
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
            TextureUsage::RENDER_ATTACHMENT
                | TextureUsage::TEXTURE_BINDING
                | TextureUsage::COPY_SRC
                | TextureUsage::COPY_DST,
        ))
        .unwrap();
    let framebuffer = device
        .create_framebuffer(&FramebufferDescriptor {
            label: None,
            layout,
            color_attachments: vec![color.clone()],
            depth_stencil_attachment: None,
            width,
            height,
        })
        .unwrap();
    Target { color, framebuffer }
}

/// Uniforms read by every test program's vertex stage.
const UNIFORMS: [(&str, UniformType); 2] = [
    ("matModelViewProject", UniformType::Float4x4),
    ("u_tint", UniformType::Float4),
];

fn shader(device: &dyn GraphicsDevice, stage: ShaderStage, uniforms: &[(&str, UniformType)]) -> Arc<GraphicsShader> {
    device
        .create_shader(&ShaderDescriptor {
            label: None,
            stage,
            bytecode: b"void main() {}".to_vec(),
            entry_point: "main".into(),
            uniforms: uniforms
                .iter()
                .map(|(name, ty)| ShaderUniformDescriptor::new(name.to_string(), *ty))
                .collect(),
        })
        .unwrap()
}

pub fn pass(device: &dyn GraphicsDevice, name: &str, pass: RenderPass) -> MaterialPass {
    let program = device
        .create_program(&ProgramDescriptor {
            label: None,
            shaders: vec![
                shader(device, ShaderStage::Vertex, &UNIFORMS),
                shader(device, ShaderStage::Fragment, &[]),
            ],
        })
        .unwrap();
    let layout = device
        .create_descriptor_set_layout(&DescriptorSetLayoutDescriptor {
            label: None,
            bindings: UNIFORMS
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
        .unwrap();
    let state = device.create_state(&StateDescriptor::default()).unwrap();
    MaterialPass::new(name, pass, program, state, layout)
}

/// A material drawing one color pass in each of `queues`.
pub fn material(device: &dyn GraphicsDevice, name: &str, queues: &[RenderQueue]) -> Arc<Material> {
    let mut material = Material::new(name);
    material
        .add_parameter(MaterialParam::new("u_tint", UniformType::Float4))
        .unwrap();
    for &queue in queues {
        let render_pass = if queue == RenderQueue::Shadow {
            RenderPass::DepthPrepass
        } else {
            RenderPass::Color
        };
        material.add_technique(
            MaterialTech::new(format!("{name}/{queue:?}"), queue).with_pass(pass(device, "main", render_pass)),
        );
    }
    material.uniform4f("u_tint", 1.0, 1.0, 1.0, 1.0).unwrap();
    Arc::new(material)
}

/// A three-vertex triangle.
pub fn triangle(device: &dyn GraphicsDevice) -> Arc<RenderMesh> {
    let layout = device
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
        .unwrap();
    let vertices = device
        .create_buffer(&BufferDescriptor {
            label: None,
            size: 36,
            usage: BufferUsage::VERTEX,
            data: Some(vec![0; 36]),
        })
        .unwrap();
    Arc::new(RenderMesh::new(layout, vec![vertices], 3))
}

/// A unit-radius object at `position`.
pub fn object_at(mesh: &Arc<RenderMesh>, material: &Arc<Material>, position: Vec3) -> RenderObject {
    RenderObject::new(mesh.clone(), material.clone())
        .with_transform(Mat4::from_translation(position))
        .with_bounds(BoundingVolume::Sphere(BoundingSphere::new(Vec3::ZERO, 1.0)))
}

/// A camera at the origin looking down -Z, near 0.1, far 100.
pub fn camera() -> Camera {
    Camera::perspective(
        Vec3::ZERO,
        -Vec3::Z,
        Vec3::Y,
        std::f32::consts::FRAC_PI_2,
        1.0,
        0.1,
        100.0,
    )
    .unwrap()
}

pub fn clear(color: LinearRgba) -> CameraClear {
    CameraClear {
        flags: ClearFlags::COLOR,
        color,
        depth: 1.0,
        stencil: 0,
    }
}

/// Every pixel of an Rgba8 readback equals `texel`.
pub fn all_texels(bytes: &[u8], texel: [u8; 4]) -> bool {
    !bytes.is_empty() && bytes.chunks_exact(4).all(|t| t == texel)
}
