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

use super::{
    lock, Bindable, Creatable, DeviceChild, DeviceRef, GraphicsObject, GraphicsResource,
    ResourceHandle,
};
use crate::renderer::api::{
    DescriptorCopy, DescriptorPoolDescriptor, DescriptorPoolFlags, DescriptorSetDescriptor,
    DescriptorSetLayoutDescriptor, DescriptorWrite, UniformType, UniformValue,
};
use crate::renderer::error::ResourceError;
use crate::renderer::object::GraphicsDescriptorSetLayout;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct PoolUsage {
    sets: u32,
    slots: HashMap<UniformType, u32>,
}

/// An arena descriptor sets are allocated from.
///
/// Every allocated set takes one set slot and one slot of its type per resource
/// binding. Value-typed uniforms live inline and take no slot. Slots come back
/// when a set is dropped, provided the pool was created with
/// [`DescriptorPoolFlags::FREE_DESCRIPTOR_SET`].
#[derive(Debug)]
pub struct GraphicsDescriptorPool {
    object: GraphicsObject<DescriptorPoolDescriptor>,
    usage: Mutex<PoolUsage>,
}

impl GraphicsDescriptorPool {
    /// Creates an empty pool.
    pub fn new(object: GraphicsObject<DescriptorPoolDescriptor>) -> Self {
        Self {
            object,
            usage: Mutex::new(PoolUsage::default()),
        }
    }

    fn capacity(&self, ty: UniformType) -> u32 {
        self.object
            .descriptor()
            .pool_sizes
            .iter()
            .filter(|size| size.ty == ty)
            .map(|size| size.count)
            .sum()
    }

    fn demand(layout: &DescriptorSetLayoutDescriptor) -> HashMap<UniformType, u32> {
        let mut demand = HashMap::new();
        for binding in layout.bindings.iter().filter(|b| b.ty.is_resource()) {
            *demand.entry(binding.ty).or_insert(0) += 1;
        }
        demand
    }

    fn reserve(&self, layout: &DescriptorSetLayoutDescriptor) -> Result<(), ResourceError> {
        let demand = Self::demand(layout);
        let mut usage = lock(&self.usage);
        if usage.sets >= self.object.descriptor().max_sets {
            return Err(ResourceError::Exhausted(format!(
                "descriptor pool already holds its {} sets",
                usage.sets
            )));
        }
        for (ty, count) in &demand {
            let used = usage.slots.get(ty).copied().unwrap_or(0);
            if used + count > self.capacity(*ty) {
                return Err(ResourceError::Exhausted(format!(
                    "descriptor pool has no {ty:?} slot left"
                )));
            }
        }
        usage.sets += 1;
        for (ty, count) in demand {
            *usage.slots.entry(ty).or_insert(0) += count;
        }
        Ok(())
    }

    fn free(&self, layout: &DescriptorSetLayoutDescriptor) {
        let mut usage = lock(&self.usage);
        usage.sets = usage.sets.saturating_sub(1);
        for (ty, count) in Self::demand(layout) {
            if let Some(used) = usage.slots.get_mut(&ty) {
                *used = used.saturating_sub(count);
            }
        }
    }

    /// Number of live sets allocated from the pool.
    pub fn allocated_sets(&self) -> u32 {
        lock(&self.usage).sets
    }

    /// Slots of `ty` still available.
    pub fn remaining(&self, ty: UniformType) -> u32 {
        let used = lock(&self.usage).slots.get(&ty).copied().unwrap_or(0);
        self.capacity(ty).saturating_sub(used)
    }

    /// Returns `true` if dropped sets give their slots back.
    pub fn frees_sets(&self) -> bool {
        self.object
            .descriptor()
            .flags
            .contains(DescriptorPoolFlags::FREE_DESCRIPTOR_SET)
    }
}

impl PartialEq for GraphicsDescriptorPool {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl DeviceChild for GraphicsDescriptorPool {
    fn handle(&self) -> ResourceHandle {
        self.object.handle()
    }

    fn device_ref(&self) -> &DeviceRef {
        self.object.device_ref()
    }
}

impl Creatable for GraphicsDescriptorPool {
    type Descriptor = DescriptorPoolDescriptor;

    fn descriptor(&self) -> &DescriptorPoolDescriptor {
        self.object.descriptor()
    }
}

/// A descriptor set: one value slot per binding of its layout.
///
/// Slots follow the layout's binding order. Updates are validated as a batch
/// and either apply entirely or not at all.
#[derive(Debug)]
pub struct GraphicsDescriptorSet {
    object: GraphicsObject<DescriptorSetDescriptor>,
    values: Mutex<Vec<Option<UniformValue>>>,
}

impl GraphicsDescriptorSet {
    /// Reserves room in the descriptor's pool and creates an empty set.
    pub fn allocate(object: GraphicsObject<DescriptorSetDescriptor>) -> Result<Self, ResourceError> {
        let desc = object.descriptor();
        if desc.layout.device_id() != object.device_id()
            || desc.pool.device_id() != object.device_id()
        {
            return Err(ResourceError::InvalidComposition(
                "descriptor set layout and pool must come from the set's device".into(),
            ));
        }
        desc.pool.reserve(desc.layout.descriptor())?;
        let slots = desc.layout.descriptor().bindings.len();
        Ok(Self {
            object,
            values: Mutex::new(vec![None; slots]),
        })
    }

    /// The layout the set follows.
    pub fn layout(&self) -> &Arc<GraphicsDescriptorSetLayout> {
        &self.object.descriptor().layout
    }

    fn slot(&self, binding: u32) -> Option<usize> {
        self.layout()
            .descriptor()
            .bindings
            .iter()
            .position(|b| b.binding == binding)
    }

    /// Binding number of the uniform called `name`.
    pub fn binding_of(&self, name: &str) -> Option<u32> {
        self.layout().binding_by_name(name).map(|b| b.binding)
    }

    /// The value written to `binding`, if any.
    pub fn value(&self, binding: u32) -> Option<UniformValue> {
        let slot = self.slot(binding)?;
        lock(&self.values)[slot].clone()
    }

    /// The value written to the uniform called `name`, if any.
    pub fn value_by_name(&self, name: &str) -> Option<UniformValue> {
        self.value(self.binding_of(name)?)
    }

    /// Returns `true` once every binding holds a value.
    pub fn is_complete(&self) -> bool {
        lock(&self.values).iter().all(Option::is_some)
    }

    /// Every GPU resource currently referenced by the set.
    pub fn resources(&self) -> Vec<GraphicsResource> {
        lock(&self.values)
            .iter()
            .flatten()
            .flat_map(UniformValue::resources)
            .collect()
    }

    fn check_value(&self, slot: usize, value: &UniformValue) -> Result<(), ResourceError> {
        let binding = &self.layout().descriptor().bindings[slot];
        if value.ty() != binding.ty {
            return Err(ResourceError::InvalidComposition(format!(
                "binding {} ({}) expects {:?}, got {:?}",
                binding.binding,
                binding.name,
                binding.ty,
                value.ty()
            )));
        }
        let device = self.device_id();
        let compatible = match value {
            UniformValue::Sampler(s) => s.device_id() == device && s.supports_binding(binding.ty),
            UniformValue::SampledImage(t) | UniformValue::StorageImage(t) => {
                t.device_id() == device && t.supports_binding(binding.ty)
            }
            UniformValue::CombinedImageSampler(t, s) => {
                t.device_id() == device
                    && t.supports_binding(binding.ty)
                    && s.as_ref().map_or(true, |s| s.device_id() == device)
            }
            UniformValue::UniformBuffer(b) | UniformValue::StorageBuffer(b) => {
                b.device_id() == device && b.supports_binding(binding.ty)
            }
            _ => true,
        };
        if !compatible {
            return Err(ResourceError::InvalidComposition(format!(
                "resource written to binding {} belongs to another device or lacks the usage for {:?}",
                binding.binding, binding.ty
            )));
        }
        Ok(())
    }

    /// Writes a batch of values.
    ///
    /// Fails without modifying the set when the batch is larger than the
    /// layout, names an unknown binding, or carries a value of the wrong type
    /// or from another device.
    pub fn update(&self, writes: &[DescriptorWrite]) -> Result<(), ResourceError> {
        if !self.device_ref().is_alive() {
            return Err(ResourceError::DeviceLost);
        }
        let bindings = self.layout().descriptor().bindings.len();
        if writes.len() > bindings {
            return Err(ResourceError::InvalidComposition(format!(
                "{} writes exceed the {bindings} bindings of the layout",
                writes.len()
            )));
        }
        let mut resolved = Vec::with_capacity(writes.len());
        for write in writes {
            let slot = self.slot(write.binding).ok_or_else(|| {
                ResourceError::InvalidComposition(format!(
                    "descriptor set layout has no binding {}",
                    write.binding
                ))
            })?;
            self.check_value(slot, &write.value)?;
            resolved.push((slot, write.value.clone()));
        }
        let mut values = lock(&self.values);
        for (slot, value) in resolved {
            values[slot] = Some(value);
        }
        Ok(())
    }

    /// Applies a batch of binding copies between sets.
    ///
    /// Every range is validated before any value moves, so a failing batch
    /// leaves all destination sets untouched.
    pub fn copy_bindings(copies: &[DescriptorCopy]) -> Result<(), ResourceError> {
        let mut staged = Vec::new();
        for copy in copies {
            if copy.src.device_id() != copy.dst.device_id() {
                return Err(ResourceError::InvalidComposition(
                    "descriptor copies cannot cross devices".into(),
                ));
            }
            for i in 0..copy.count {
                let (src_binding, dst_binding) = (copy.src_binding + i, copy.dst_binding + i);
                let src_slot = copy.src.slot(src_binding).ok_or_else(|| {
                    ResourceError::InvalidComposition(format!(
                        "source set has no binding {src_binding}"
                    ))
                })?;
                let dst_slot = copy.dst.slot(dst_binding).ok_or_else(|| {
                    ResourceError::InvalidComposition(format!(
                        "destination set has no binding {dst_binding}"
                    ))
                })?;
                let src_ty = copy.src.layout().descriptor().bindings[src_slot].ty;
                let dst_ty = copy.dst.layout().descriptor().bindings[dst_slot].ty;
                if src_ty != dst_ty {
                    return Err(ResourceError::InvalidComposition(format!(
                        "cannot copy {src_ty:?} binding {src_binding} into {dst_ty:?} binding {dst_binding}"
                    )));
                }
                staged.push((&copy.dst, dst_slot, &copy.src, src_slot));
            }
        }
        // Read every source first; a set may be both source and destination.
        let moved: Vec<_> = staged
            .into_iter()
            .map(|(dst, dst_slot, src, src_slot)| {
                let value = lock(&src.values)[src_slot].clone();
                (dst, dst_slot, value)
            })
            .collect();
        for (dst, dst_slot, value) in moved {
            lock(&dst.values)[dst_slot] = value;
        }
        Ok(())
    }
}

impl Drop for GraphicsDescriptorSet {
    fn drop(&mut self) {
        let desc = self.object.descriptor();
        if desc.pool.frees_sets() {
            desc.pool.free(desc.layout.descriptor());
        }
    }
}

impl PartialEq for GraphicsDescriptorSet {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl DeviceChild for GraphicsDescriptorSet {
    fn handle(&self) -> ResourceHandle {
        self.object.handle()
    }

    fn device_ref(&self) -> &DeviceRef {
        self.object.device_ref()
    }
}

impl Creatable for GraphicsDescriptorSet {
    type Descriptor = DescriptorSetDescriptor;

    fn descriptor(&self) -> &DescriptorSetDescriptor {
        self.object.descriptor()
    }
}
