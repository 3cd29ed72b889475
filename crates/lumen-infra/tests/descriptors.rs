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

mod common;

use common::*;
use lumen_core::math::LinearRgba;
use lumen_core::renderer::*;
use std::sync::Arc;

fn pool(
    device: &dyn GraphicsDevice,
    max_sets: u32,
    pool_sizes: Vec<DescriptorPoolSize>,
    flags: DescriptorPoolFlags,
) -> Arc<GraphicsDescriptorPool> {
    device
        .create_descriptor_pool(&DescriptorPoolDescriptor {
            label: None,
            max_sets,
            pool_sizes,
            flags,
        })
        .unwrap()
}

fn set(
    device: &dyn GraphicsDevice,
    layout: &Arc<GraphicsDescriptorSetLayout>,
    pool: &Arc<GraphicsDescriptorPool>,
) -> Result<Arc<GraphicsDescriptorSet>, ResourceError> {
    device.create_descriptor_set(&DescriptorSetDescriptor {
        label: None,
        layout: layout.clone(),
        pool: pool.clone(),
    })
}

const UNIFORMS: [(&str, UniformType); 3] = [
    ("u_tint", UniformType::Float4),
    ("u_scale", UniformType::Float),
    ("u_params", UniformType::UniformBuffer),
];

fn write(binding: u32, value: UniformValue) -> DescriptorWrite {
    DescriptorWrite { binding, value }
}

#[test]
fn test_update_accepts_one_write_per_binding() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS);
        let pool = pool(
            device.as_ref(),
            4,
            vec![DescriptorPoolSize {
                ty: UniformType::UniformBuffer,
                count: 4,
            }],
            DescriptorPoolFlags::EMPTY,
        );
        let params = buffer(device.as_ref(), BufferUsage::UNIFORM, &[0; 16]);
        let set = set(device.as_ref(), &layout, &pool).unwrap();
        assert!(!set.is_complete());

        let writes = vec![
            write(0, UniformValue::Float4([1.0, 0.5, 0.25, 1.0])),
            write(1, UniformValue::Float(2.0)),
            write(2, UniformValue::UniformBuffer(params.clone())),
        ];
        set.update(&writes).unwrap();
        assert!(set.is_complete());
        assert_eq!(set.value_by_name("u_scale"), Some(UniformValue::Float(2.0)));
        assert_eq!(set.resources().len(), 1);

        let mut too_many = writes.clone();
        too_many.push(write(0, UniformValue::Float4([0.0; 4])));
        assert!(matches!(
            set.update(&too_many),
            Err(ResourceError::InvalidComposition(_))
        ));
    }
}

#[test]
fn test_failed_batch_leaves_set_untouched() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS[..2]);
        let pool = pool(device.as_ref(), 1, Vec::new(), DescriptorPoolFlags::EMPTY);
        let set = set(device.as_ref(), &layout, &pool).unwrap();
        set.update(&[write(1, UniformValue::Float(1.0))]).unwrap();

        let mismatched = [
            write(1, UniformValue::Float(7.0)),
            write(0, UniformValue::Float3([0.0; 3])),
        ];
        assert!(matches!(
            set.update(&mismatched),
            Err(ResourceError::InvalidComposition(_))
        ));
        assert_eq!(set.value(1), Some(UniformValue::Float(1.0)));
        assert_eq!(set.value(0), None);

        assert!(set.update(&[write(5, UniformValue::Float(0.0))]).is_err());
    }
}

#[test]
fn test_resource_writes_check_usage() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS);
        let pool = pool(
            device.as_ref(),
            1,
            vec![DescriptorPoolSize {
                ty: UniformType::UniformBuffer,
                count: 1,
            }],
            DescriptorPoolFlags::EMPTY,
        );
        let set = set(device.as_ref(), &layout, &pool).unwrap();
        let vertices = buffer(device.as_ref(), BufferUsage::VERTEX, &[0; 16]);
        assert!(set
            .update(&[write(2, UniformValue::UniformBuffer(vertices))])
            .is_err());
    }
}

#[test]
fn test_pool_exhaustion() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS);
        let pool = pool(
            device.as_ref(),
            2,
            vec![DescriptorPoolSize {
                ty: UniformType::UniformBuffer,
                count: 1,
            }],
            DescriptorPoolFlags::EMPTY,
        );
        let first = set(device.as_ref(), &layout, &pool).unwrap();
        assert_eq!(pool.remaining(UniformType::UniformBuffer), 0);
        let err = set(device.as_ref(), &layout, &pool).unwrap_err();
        assert!(matches!(err, ResourceError::Exhausted(_)));
        assert!(err.is_recoverable());

        // Value uniforms take no slots, only the set count limits them.
        let values_only = set_layout(device.as_ref(), &UNIFORMS[..2]);
        let second = set(device.as_ref(), &values_only, &pool).unwrap();
        assert!(matches!(
            set(device.as_ref(), &values_only, &pool),
            Err(ResourceError::Exhausted(_))
        ));

        // Without FREE_DESCRIPTOR_SET dropping a set keeps its slots taken.
        drop(first);
        drop(second);
        assert_eq!(pool.allocated_sets(), 2);
        assert!(set(device.as_ref(), &layout, &pool).is_err());
    }
}

#[test]
fn test_freeing_pool_returns_slots() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS);
        let pool = pool(
            device.as_ref(),
            1,
            vec![DescriptorPoolSize {
                ty: UniformType::UniformBuffer,
                count: 1,
            }],
            DescriptorPoolFlags::FREE_DESCRIPTOR_SET,
        );
        let first = set(device.as_ref(), &layout, &pool).unwrap();
        assert_eq!(pool.allocated_sets(), 1);
        drop(first);
        assert_eq!(pool.allocated_sets(), 0);
        assert_eq!(pool.remaining(UniformType::UniformBuffer), 1);
        set(device.as_ref(), &layout, &pool).unwrap();
    }
}

#[test]
fn test_value_types_cannot_size_a_pool() {
    for backend in BACKENDS {
        let device = device(backend);
        let result = device.create_descriptor_pool(&DescriptorPoolDescriptor {
            label: None,
            max_sets: 1,
            pool_sizes: vec![DescriptorPoolSize {
                ty: UniformType::Float4,
                count: 8,
            }],
            flags: DescriptorPoolFlags::EMPTY,
        });
        assert!(matches!(result, Err(ResourceError::InvalidDescriptor(_))));
    }
}

#[test]
fn test_copy_descriptor_sets() {
    for backend in BACKENDS {
        let device = device(backend);
        let layout = set_layout(device.as_ref(), &UNIFORMS[..2]);
        let pool = pool(device.as_ref(), 2, Vec::new(), DescriptorPoolFlags::EMPTY);
        let src = set(device.as_ref(), &layout, &pool).unwrap();
        let dst = set(device.as_ref(), &layout, &pool).unwrap();
        src.update(&[
            write(0, UniformValue::Float4([0.1, 0.2, 0.3, 0.4])),
            write(1, UniformValue::Float(3.0)),
        ])
        .unwrap();

        device
            .copy_descriptor_sets(&[DescriptorCopy {
                src: src.clone(),
                src_binding: 0,
                dst: dst.clone(),
                dst_binding: 0,
                count: 2,
            }])
            .unwrap();
        assert_eq!(dst.value(1), Some(UniformValue::Float(3.0)));
        assert!(dst.is_complete());

        let mismatched = DescriptorCopy {
            src: src.clone(),
            src_binding: 0,
            dst: dst.clone(),
            dst_binding: 1,
            count: 1,
        };
        assert!(device.copy_descriptor_sets(&[mismatched]).is_err());

        let overflowing = DescriptorCopy {
            src,
            src_binding: 1,
            dst,
            dst_binding: 1,
            count: 2,
        };
        assert!(device.copy_descriptor_sets(&[overflowing]).is_err());
    }
}

#[test]
fn test_draw_requires_matching_descriptor_set() {
    for backend in BACKENDS {
        let device = device(backend);
        let target = target(device.as_ref(), 4, 4);
        let uniforms = [("u_tint", UniformType::Float4)];
        let pipeline = pipeline(device.as_ref(), &target.layout, &uniforms);
        let pool = pool(device.as_ref(), 2, Vec::new(), DescriptorPoolFlags::EMPTY);
        let vertices = buffer(device.as_ref(), BufferUsage::VERTEX, &[0; 36]);

        let list = graphics_list(device.as_ref());
        list.begin().unwrap();
        list.set_framebuffer(&target.framebuffer).unwrap();
        list.clear_framebuffer(ClearFlags::COLOR, LinearRgba::BLACK, 1.0, 0)
            .unwrap();
        list.set_pipeline(&pipeline).unwrap();
        list.set_vertex_buffer(0, &vertices, 0).unwrap();
        assert!(list.draw(3, 1, 0, 0).is_err());

        // Same bindings, distinct layout object.
        let lookalike = set_layout(device.as_ref(), &uniforms);
        let foreign = set(device.as_ref(), &lookalike, &pool).unwrap();
        list.set_descriptor_set(&foreign).unwrap();
        assert!(list.draw(3, 1, 0, 0).is_err());

        let own = set(
            device.as_ref(),
            &pipeline.descriptor().descriptor_set_layout,
            &pool,
        )
        .unwrap();
        own.update(&[write(0, UniformValue::Float4([1.0; 4]))]).unwrap();
        list.set_descriptor_set(&own).unwrap();
        list.draw(3, 1, 0, 0).unwrap();
        list.end().unwrap();
    }
}

#[test]
fn test_sets_from_another_device_are_rejected() {
    let first = device(GraphicsBackendType::Immediate);
    let second = device(GraphicsBackendType::Immediate);
    let layout = set_layout(first.as_ref(), &UNIFORMS[..1]);
    let pool = pool(second.as_ref(), 1, Vec::new(), DescriptorPoolFlags::EMPTY);
    assert!(matches!(
        set(first.as_ref(), &layout, &pool),
        Err(ResourceError::InvalidComposition(_))
    ));
}
