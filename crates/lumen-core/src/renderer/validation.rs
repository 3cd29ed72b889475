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

//! Descriptor checks shared by every backend.
//!
//! Each function inspects one descriptor against the device capabilities and
//! returns the first violation found. Backends call these before touching
//! their own state, so an error never leaves a half-created resource behind.

use super::api::*;
use super::error::ResourceError;
use super::object::{
    Creatable, DeviceChild, DeviceId, GraphicsFramebufferLayout, GraphicsTexture,
};
use crate::math::{Extent3D, Origin3D};

fn unsupported(msg: impl Into<String>) -> ResourceError {
    ResourceError::Unsupported(msg.into())
}

fn invalid(msg: impl Into<String>) -> ResourceError {
    ResourceError::InvalidDescriptor(msg.into())
}

fn composition(msg: impl Into<String>) -> ResourceError {
    ResourceError::InvalidComposition(msg.into())
}

/// Largest mip chain length for a texture of `size`.
pub fn max_mip_levels(size: Extent3D, dimension: TextureDimension) -> u32 {
    let mut largest = size.width.max(size.height);
    if dimension == TextureDimension::D3 {
        largest = largest.max(size.depth_or_array_layers);
    }
    32 - largest.max(1).leading_zeros()
}

/// Validates a texture descriptor.
pub fn texture(caps: &DeviceCapabilities, desc: &TextureDescriptor) -> Result<(), ResourceError> {
    if !caps.supports_texture_format(desc.format) {
        return Err(unsupported(format!("texture format {:?}", desc.format)));
    }
    if !caps.supports_texture_dimension(desc.dimension) {
        return Err(unsupported(format!("texture dimension {:?}", desc.dimension)));
    }
    let size = desc.size;
    if size.is_empty() {
        return Err(invalid(format!("texture size {size:?} has a zero axis")));
    }
    if size.width > caps.max_texture_dimension || size.height > caps.max_texture_dimension {
        return Err(unsupported(format!(
            "texture size {}x{} exceeds the {} texel limit",
            size.width, size.height, caps.max_texture_dimension
        )));
    }
    let layers = size.depth_or_array_layers;
    match desc.dimension {
        TextureDimension::D1 if size.height != 1 || layers != 1 => {
            return Err(invalid("1D textures have a height and depth of 1"));
        }
        TextureDimension::D2 if layers != 1 => {
            return Err(invalid("2D textures have a single layer; use D2Array"));
        }
        TextureDimension::Cube if layers != 6 => {
            return Err(invalid(format!("cube textures need 6 layers, got {layers}")));
        }
        TextureDimension::CubeArray if layers % 6 != 0 => {
            return Err(invalid(format!(
                "cube array layer count {layers} is not a multiple of 6"
            )));
        }
        TextureDimension::Cube | TextureDimension::CubeArray if size.width != size.height => {
            return Err(invalid("cube faces must be square"));
        }
        TextureDimension::D3 => {
            if layers > caps.max_texture_dimension {
                return Err(unsupported(format!("texture depth {layers} exceeds the limit")));
            }
        }
        _ => {
            if layers > caps.max_texture_array_layers {
                return Err(unsupported(format!("{layers} array layers exceed the limit")));
            }
        }
    }
    let max_mips = max_mip_levels(size, desc.dimension);
    if desc.mip_level_count == 0 || desc.mip_level_count > max_mips {
        return Err(invalid(format!(
            "mip level count {} outside 1..={max_mips}",
            desc.mip_level_count
        )));
    }
    if desc.sample_count == 0 || !desc.sample_count.is_power_of_two() {
        return Err(invalid(format!("sample count {} is not a power of two", desc.sample_count)));
    }
    if desc.sample_count > caps.max_sample_count {
        return Err(unsupported(format!("sample count {}", desc.sample_count)));
    }
    if desc.sample_count > 1 && desc.mip_level_count > 1 {
        return Err(invalid("multisampled textures cannot have mip levels"));
    }
    if let Some(data) = &desc.data {
        let expected = desc.mip_level_byte_size(0);
        if data.len() as u64 != expected {
            return Err(invalid(format!(
                "initial data holds {} bytes, level 0 needs {expected}",
                data.len()
            )));
        }
    }
    Ok(())
}

/// Validates a sampler descriptor.
pub fn sampler(caps: &DeviceCapabilities, desc: &SamplerDescriptor) -> Result<(), ResourceError> {
    if desc.anisotropy_clamp == 0 {
        return Err(invalid("anisotropy clamp must be at least 1"));
    }
    if desc.anisotropy_clamp > caps.max_anisotropy {
        return Err(unsupported(format!("anisotropy {}", desc.anisotropy_clamp)));
    }
    if desc.lod_min_clamp > desc.lod_max_clamp {
        return Err(invalid("lod_min_clamp exceeds lod_max_clamp"));
    }
    Ok(())
}

/// Validates a buffer descriptor.
pub fn buffer(caps: &DeviceCapabilities, desc: &BufferDescriptor) -> Result<(), ResourceError> {
    if desc.size == 0 {
        return Err(invalid("buffer size is zero"));
    }
    if desc.size > caps.max_buffer_size {
        return Err(unsupported(format!("buffer size {} exceeds the limit", desc.size)));
    }
    if desc.usage.is_empty() {
        return Err(invalid("buffer has no usage"));
    }
    if let Some(data) = &desc.data {
        if data.len() as u64 > desc.size {
            return Err(invalid(format!(
                "initial data holds {} bytes, buffer holds {}",
                data.len(),
                desc.size
            )));
        }
    }
    Ok(())
}

/// Validates a shader descriptor.
pub fn shader(caps: &DeviceCapabilities, desc: &ShaderDescriptor) -> Result<(), ResourceError> {
    if !caps.supports_shader_stage(desc.stage) {
        return Err(unsupported(format!("shader stage {:?}", desc.stage)));
    }
    if desc.bytecode.is_empty() {
        return Err(invalid("shader bytecode is empty"));
    }
    if desc.entry_point.is_empty() {
        return Err(invalid("shader entry point is empty"));
    }
    for (i, uniform) in desc.uniforms.iter().enumerate() {
        if desc.uniforms[..i].iter().any(|u| u.name == uniform.name) {
            return Err(invalid(format!("uniform '{}' declared twice", uniform.name)));
        }
    }
    Ok(())
}

/// Checks a program's shaders and merges their uniforms.
///
/// The result lists every uniform once, in order of first appearance, with the
/// stages that read it.
pub fn reflect_program(
    device: DeviceId,
    desc: &ProgramDescriptor,
) -> Result<Vec<ProgramUniform>, ResourceError> {
    if desc.shaders.is_empty() {
        return Err(invalid("program has no shader"));
    }
    let mut stages = ShaderStageFlags::EMPTY;
    let mut uniforms: Vec<ProgramUniform> = Vec::new();
    for shader in &desc.shaders {
        if shader.device_id() != device {
            return Err(composition("program shader belongs to another device"));
        }
        let stage = ShaderStageFlags::from(shader.descriptor().stage);
        if stages.intersects(stage) {
            return Err(composition(format!(
                "program links two {:?} shaders",
                shader.descriptor().stage
            )));
        }
        stages.insert(stage);
        for declared in &shader.descriptor().uniforms {
            match uniforms.iter_mut().find(|u| u.name == declared.name) {
                Some(existing) if existing.ty != declared.ty => {
                    return Err(composition(format!(
                        "uniform '{}' is {:?} in one stage and {:?} in another",
                        declared.name, existing.ty, declared.ty
                    )));
                }
                Some(existing) => existing.stages.insert(stage),
                None => uniforms.push(ProgramUniform {
                    name: declared.name.to_string(),
                    ty: declared.ty,
                    stages: stage,
                }),
            }
        }
    }
    if stages.contains(ShaderStageFlags::COMPUTE) && stages != ShaderStageFlags::COMPUTE {
        return Err(composition("compute shaders cannot be linked with graphics stages"));
    }
    Ok(uniforms)
}

/// Validates an input layout descriptor.
pub fn input_layout(
    caps: &DeviceCapabilities,
    desc: &InputLayoutDescriptor,
) -> Result<(), ResourceError> {
    if desc.buffers.len() as u32 > caps.max_vertex_buffers {
        return Err(unsupported(format!("{} vertex buffers", desc.buffers.len())));
    }
    let mut locations = Vec::new();
    for layout in &desc.buffers {
        for attribute in &layout.attributes {
            if !caps.supports_vertex_format(attribute.format) {
                return Err(unsupported(format!("vertex format {:?}", attribute.format)));
            }
            if locations.contains(&attribute.location) {
                return Err(invalid(format!(
                    "vertex location {} used twice",
                    attribute.location
                )));
            }
            locations.push(attribute.location);
            if layout.stride > 0 && attribute.offset + attribute.format.size() > layout.stride {
                return Err(invalid(format!(
                    "attribute at location {} overruns the {}-byte stride",
                    attribute.location, layout.stride
                )));
            }
        }
    }
    Ok(())
}

/// Validates a state descriptor.
pub fn state(caps: &DeviceCapabilities, desc: &StateDescriptor) -> Result<(), ResourceError> {
    if desc.color_blends.len() as u32 > caps.max_color_attachments {
        return Err(unsupported(format!("{} blend states", desc.color_blends.len())));
    }
    Ok(())
}

/// Validates a framebuffer layout descriptor.
pub fn framebuffer_layout(
    caps: &DeviceCapabilities,
    desc: &FramebufferLayoutDescriptor,
) -> Result<(), ResourceError> {
    if desc.color_attachments.len() as u32 > caps.max_color_attachments {
        return Err(unsupported(format!(
            "{} color attachments",
            desc.color_attachments.len()
        )));
    }
    for slot in desc.color_attachments.iter().chain(&desc.depth_stencil_attachment) {
        if !caps.supports_texture_format(slot.format) {
            return Err(unsupported(format!("attachment format {:?}", slot.format)));
        }
        if slot.sample_count == 0 || slot.sample_count > caps.max_sample_count {
            return Err(unsupported(format!("attachment sample count {}", slot.sample_count)));
        }
    }
    if let Some(slot) = desc.color_attachments.iter().find(|s| s.format.is_depth()) {
        return Err(invalid(format!("depth format {:?} in a color slot", slot.format)));
    }
    if let Some(slot) = desc.depth_stencil_attachment.filter(|s| !s.format.is_depth()) {
        return Err(invalid(format!("color format {:?} in the depth slot", slot.format)));
    }
    Ok(())
}

/// Returns `true` if framebuffers of layout `b` can be used with pipelines
/// built for layout `a`.
pub fn framebuffer_layouts_compatible(
    a: &GraphicsFramebufferLayout,
    b: &GraphicsFramebufferLayout,
) -> bool {
    a.handle() == b.handle()
        || (a.descriptor().color_attachments == b.descriptor().color_attachments
            && a.descriptor().depth_stencil_attachment == b.descriptor().depth_stencil_attachment)
}

fn attachment(
    device: DeviceId,
    texture: &GraphicsTexture,
    slot: AttachmentLayout,
    desc: &FramebufferDescriptor,
) -> Result<(), ResourceError> {
    let tex = texture.descriptor();
    if texture.device_id() != device {
        return Err(composition("framebuffer attachment belongs to another device"));
    }
    if tex.format != slot.format || tex.sample_count != slot.sample_count {
        return Err(composition(format!(
            "attachment {:?} x{} does not match slot {:?} x{}",
            tex.format, tex.sample_count, slot.format, slot.sample_count
        )));
    }
    if !tex.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        return Err(composition("attachment lacks RENDER_ATTACHMENT usage"));
    }
    if tex.size.width < desc.width || tex.size.height < desc.height {
        return Err(composition(format!(
            "attachment {}x{} is smaller than the {}x{} render area",
            tex.size.width, tex.size.height, desc.width, desc.height
        )));
    }
    Ok(())
}

/// Validates a framebuffer against its layout.
pub fn framebuffer(device: DeviceId, desc: &FramebufferDescriptor) -> Result<(), ResourceError> {
    if desc.width == 0 || desc.height == 0 {
        return Err(invalid("framebuffer render area is empty"));
    }
    if desc.layout.device_id() != device {
        return Err(composition("framebuffer layout belongs to another device"));
    }
    let layout = desc.layout.descriptor();
    if layout.color_attachments.len() != desc.color_attachments.len() {
        return Err(composition(format!(
            "layout has {} color slots, {} textures given",
            layout.color_attachments.len(),
            desc.color_attachments.len()
        )));
    }
    for (texture, slot) in desc.color_attachments.iter().zip(&layout.color_attachments) {
        attachment(device, texture, *slot, desc)?;
    }
    match (&desc.depth_stencil_attachment, layout.depth_stencil_attachment) {
        (Some(texture), Some(slot)) => attachment(device, texture, slot, desc),
        (None, None) => Ok(()),
        _ => Err(composition("depth-stencil attachment does not match the layout")),
    }
}

/// Validates a descriptor set layout descriptor.
pub fn descriptor_set_layout(desc: &DescriptorSetLayoutDescriptor) -> Result<(), ResourceError> {
    for (i, binding) in desc.bindings.iter().enumerate() {
        let earlier = &desc.bindings[..i];
        if earlier.iter().any(|b| b.binding == binding.binding) {
            return Err(invalid(format!("binding {} declared twice", binding.binding)));
        }
        if earlier.iter().any(|b| b.name == binding.name) {
            return Err(invalid(format!("binding name '{}' declared twice", binding.name)));
        }
    }
    Ok(())
}

/// Validates a descriptor pool descriptor.
pub fn descriptor_pool(desc: &DescriptorPoolDescriptor) -> Result<(), ResourceError> {
    if desc.max_sets == 0 {
        return Err(invalid("descriptor pool holds no set"));
    }
    if let Some(size) = desc.pool_sizes.iter().find(|s| !s.ty.is_resource()) {
        return Err(invalid(format!(
            "{:?} is stored inline and has no pool slots",
            size.ty
        )));
    }
    Ok(())
}

/// Validates a pipeline composition.
///
/// Every program uniform must appear in the descriptor set layout under the
/// same name and type.
pub fn pipeline(device: DeviceId, desc: &GraphicsPipelineDescriptor) -> Result<(), ResourceError> {
    let components: [&dyn DeviceChild; 5] = [
        desc.program.as_ref(),
        desc.input_layout.as_ref(),
        desc.descriptor_set_layout.as_ref(),
        desc.framebuffer_layout.as_ref(),
        desc.state.as_ref(),
    ];
    for component in components {
        if component.device_id() != device {
            return Err(composition(format!(
                "pipeline component {:?} belongs to another device",
                component.handle().kind()
            )));
        }
        if !component.device_ref().is_alive() {
            return Err(ResourceError::DeviceLost);
        }
    }
    for uniform in desc.program.active_uniforms() {
        match desc.descriptor_set_layout.binding_by_name(&uniform.name) {
            Some(binding) if binding.ty == uniform.ty => {}
            Some(binding) => {
                return Err(composition(format!(
                    "uniform '{}' is {:?} in the program and {:?} in the set layout",
                    uniform.name, uniform.ty, binding.ty
                )));
            }
            None => {
                return Err(composition(format!(
                    "uniform '{}' has no binding in the set layout",
                    uniform.name
                )));
            }
        }
    }
    let blends = desc.state.descriptor().color_blends.len();
    let colors = desc.framebuffer_layout.descriptor().color_attachments.len();
    if blends > colors {
        return Err(composition(format!(
            "{blends} blend states for {colors} color attachments"
        )));
    }
    Ok(())
}

/// Validates a command queue descriptor.
pub fn command_queue(desc: &CommandQueueDescriptor) -> Result<(), ResourceError> {
    if !(0.0..=1.0).contains(&desc.priority) {
        return Err(invalid(format!("queue priority {} outside [0, 1]", desc.priority)));
    }
    Ok(())
}

fn texture_region(
    texture: &GraphicsTexture,
    mip_level: u32,
    origin: Origin3D,
    extent: Extent3D,
) -> Result<(), ResourceError> {
    let desc = texture.descriptor();
    if mip_level >= desc.mip_level_count {
        return Err(ResourceError::OutOfBounds);
    }
    let level = desc
        .size
        .mip_level_size(mip_level, desc.dimension == TextureDimension::D3);
    let fits = |o: u32, e: u32, limit: u32| o.checked_add(e).is_some_and(|end| end <= limit);
    if !fits(origin.x, extent.width, level.width)
        || !fits(origin.y, extent.height, level.height)
        || !fits(origin.z, extent.depth_or_array_layers, level.depth_or_array_layers)
    {
        return Err(ResourceError::OutOfBounds);
    }
    Ok(())
}

/// Validates a texture-to-texture copy.
pub fn texture_copy(
    src: (&GraphicsTexture, u32, Origin3D),
    dst: (&GraphicsTexture, u32, Origin3D),
    extent: Extent3D,
) -> Result<(), ResourceError> {
    let (src_tex, dst_tex) = (src.0.descriptor(), dst.0.descriptor());
    if src_tex.format != dst_tex.format {
        return Err(composition(format!(
            "cannot copy {:?} texels into a {:?} texture",
            src_tex.format, dst_tex.format
        )));
    }
    if src_tex.sample_count != dst_tex.sample_count {
        return Err(composition("copy between textures of different sample counts"));
    }
    if !src_tex.usage.contains(TextureUsage::COPY_SRC) {
        return Err(composition("copy source lacks COPY_SRC usage"));
    }
    if !dst_tex.usage.contains(TextureUsage::COPY_DST) {
        return Err(composition("copy destination lacks COPY_DST usage"));
    }
    texture_region(src.0, src.1, src.2, extent)?;
    texture_region(dst.0, dst.1, dst.2, extent)
}

/// Checks that `size` bytes at `offset` lie inside the buffer.
pub fn buffer_range(desc: &BufferDescriptor, offset: u64, size: u64) -> Result<(), ResourceError> {
    match offset.checked_add(size) {
        Some(end) if end <= desc.size => Ok(()),
        _ => Err(ResourceError::OutOfBounds),
    }
}

/// Checks that `count` indices starting at `first` fit in an index buffer
/// bound at `offset`.
pub fn index_range(
    desc: &BufferDescriptor,
    offset: u64,
    format: IndexFormat,
    first: u32,
    count: u32,
) -> Result<(), ResourceError> {
    let start = (first as u64)
        .checked_mul(format.size())
        .and_then(|bytes| bytes.checked_add(offset))
        .ok_or(ResourceError::OutOfBounds)?;
    buffer_range(desc, start, count as u64 * format.size())
}

/// Checks that `draw_count` records of `record_size` bytes, `stride` apart
/// from `offset`, lie inside an indirect buffer.
pub fn indirect_range(
    desc: &BufferDescriptor,
    offset: u64,
    draw_count: u32,
    stride: u64,
    record_size: u64,
) -> Result<(), ResourceError> {
    let Some(last) = draw_count.checked_sub(1) else {
        return Ok(());
    };
    if draw_count > 1 && stride < record_size {
        return Err(composition(format!(
            "indirect stride {stride} is smaller than a {record_size}-byte record"
        )));
    }
    let last_offset = stride
        .checked_mul(last as u64)
        .and_then(|span| span.checked_add(offset))
        .ok_or(ResourceError::OutOfBounds)?;
    buffer_range(desc, last_offset, record_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> DeviceCapabilities {
        DeviceCapabilities {
            texture_formats: vec![
                TextureFormat::Rgba8Unorm,
                TextureFormat::R32Float,
                TextureFormat::Depth32Float,
            ],
            texture_dimensions: vec![TextureDimension::D2, TextureDimension::Cube],
            vertex_formats: vec![VertexFormat::Float32x3],
            shader_stages: vec![ShaderStage::Vertex, ShaderStage::Fragment],
            max_texture_dimension: 4096,
            max_texture_array_layers: 256,
            max_sample_count: 4,
            max_color_attachments: 4,
            max_vertex_buffers: 2,
            max_anisotropy: 16,
            max_buffer_size: 1 << 20,
        }
    }

    #[test]
    fn test_texture_rejects_unsupported_format() {
        let desc = TextureDescriptor::new_2d(4, 4, TextureFormat::R16Float, TextureUsage::COPY_DST);
        assert!(matches!(texture(&caps(), &desc), Err(ResourceError::Unsupported(_))));
    }

    #[test]
    fn test_texture_checks_initial_data_length() {
        let mut desc =
            TextureDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST);
        desc.data = Some(vec![0; 63]);
        assert!(matches!(texture(&caps(), &desc), Err(ResourceError::InvalidDescriptor(_))));
        desc.data = Some(vec![0; 64]);
        assert_eq!(texture(&caps(), &desc), Ok(()));
    }

    #[test]
    fn test_texture_mip_chain_limit() {
        let mut desc =
            TextureDescriptor::new_2d(256, 64, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST);
        desc.mip_level_count = 9;
        assert_eq!(texture(&caps(), &desc), Ok(()));
        desc.mip_level_count = 10;
        assert!(texture(&caps(), &desc).is_err());
    }

    #[test]
    fn test_cube_texture_needs_six_layers() {
        let mut desc =
            TextureDescriptor::new_2d(16, 16, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST);
        desc.dimension = TextureDimension::Cube;
        assert!(texture(&caps(), &desc).is_err());
        desc.size.depth_or_array_layers = 6;
        assert_eq!(texture(&caps(), &desc), Ok(()));
    }

    #[test]
    fn test_buffer_limits() {
        let mut desc = BufferDescriptor {
            label: None,
            size: 16,
            usage: BufferUsage::VERTEX,
            data: Some(vec![0; 32]),
        };
        assert!(matches!(buffer(&caps(), &desc), Err(ResourceError::InvalidDescriptor(_))));
        desc.data = None;
        desc.size = 2 << 20;
        assert!(matches!(buffer(&caps(), &desc), Err(ResourceError::Unsupported(_))));
    }

    #[test]
    fn test_framebuffer_layout_rejects_depth_in_color_slot() {
        let desc = FramebufferLayoutDescriptor {
            label: None,
            color_attachments: vec![AttachmentLayout::new(TextureFormat::Depth32Float)],
            depth_stencil_attachment: None,
        };
        assert!(matches!(
            framebuffer_layout(&caps(), &desc),
            Err(ResourceError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_descriptor_pool_rejects_value_types() {
        let desc = DescriptorPoolDescriptor {
            label: None,
            max_sets: 4,
            pool_sizes: vec![DescriptorPoolSize {
                ty: UniformType::Float4,
                count: 4,
            }],
            flags: DescriptorPoolFlags::EMPTY,
        };
        assert!(descriptor_pool(&desc).is_err());
    }

    #[test]
    fn test_buffer_range_overflow() {
        let desc = BufferDescriptor {
            label: None,
            size: 64,
            usage: BufferUsage::COPY_DST,
            data: None,
        };
        assert_eq!(buffer_range(&desc, 32, 32), Ok(()));
        assert_eq!(buffer_range(&desc, 33, 32), Err(ResourceError::OutOfBounds));
        assert_eq!(buffer_range(&desc, u64::MAX, 2), Err(ResourceError::OutOfBounds));
    }

    #[test]
    fn test_index_range_covers_offset_and_format() {
        let desc = BufferDescriptor {
            label: None,
            size: 12,
            usage: BufferUsage::INDEX,
            data: None,
        };
        assert_eq!(index_range(&desc, 0, IndexFormat::Uint16, 0, 6), Ok(()));
        assert_eq!(index_range(&desc, 4, IndexFormat::Uint16, 2, 2), Ok(()));
        assert_eq!(
            index_range(&desc, 4, IndexFormat::Uint16, 2, 3),
            Err(ResourceError::OutOfBounds)
        );
        assert_eq!(
            index_range(&desc, 0, IndexFormat::Uint32, 0, 4),
            Err(ResourceError::OutOfBounds)
        );
        assert_eq!(
            index_range(&desc, u64::MAX, IndexFormat::Uint32, u32::MAX, 1),
            Err(ResourceError::OutOfBounds)
        );
    }

    #[test]
    fn test_indirect_range_checks_last_record() {
        let desc = BufferDescriptor {
            label: None,
            size: 32,
            usage: BufferUsage::INDIRECT,
            data: None,
        };
        assert_eq!(indirect_range(&desc, 0, 2, 16, 16), Ok(()));
        assert_eq!(indirect_range(&desc, 0, 3, 16, 16), Err(ResourceError::OutOfBounds));
        assert_eq!(indirect_range(&desc, u64::MAX, 0, 16, 16), Ok(()));
        assert_eq!(
            indirect_range(&desc, u64::MAX - 4, 2, 16, 16),
            Err(ResourceError::OutOfBounds)
        );
        assert_eq!(
            indirect_range(&desc, 0, 2, u64::MAX, 16),
            Err(ResourceError::OutOfBounds)
        );
        assert!(matches!(
            indirect_range(&desc, 0, 2, 8, 16),
            Err(ResourceError::InvalidComposition(_))
        ));
    }
}
