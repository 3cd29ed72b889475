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

//! Host memory standing in for GPU textures and buffers.

use lumen_core::math::{Extent3D, Origin3D};
use lumen_core::renderer::{
    ResourceError, ResourceHandle, TextureDescriptor, TextureDimension, TextureFormat,
};
use std::collections::HashMap;

/// Storage of one texture: every mip level, layers stacked within a level.
#[derive(Debug)]
pub(crate) struct SoftTexture {
    format: TextureFormat,
    levels: Vec<(Extent3D, Vec<u8>)>,
}

impl SoftTexture {
    fn new(desc: &TextureDescriptor) -> Self {
        let bpp = desc.format.bytes_per_texel() as usize;
        let is_3d = desc.dimension == TextureDimension::D3;
        let levels = (0..desc.mip_level_count)
            .map(|level| {
                let extent = desc.size.mip_level_size(level, is_3d);
                let len = extent.width as usize
                    * extent.height as usize
                    * extent.depth_or_array_layers as usize
                    * bpp;
                let bytes = match (&desc.data, level) {
                    (Some(data), 0) => data.clone(),
                    _ => vec![0; len],
                };
                (extent, bytes)
            })
            .collect();
        Self {
            format: desc.format,
            levels,
        }
    }

    pub(crate) fn format(&self) -> TextureFormat {
        self.format
    }

    pub(crate) fn level(&self, level: u32) -> Option<&(Extent3D, Vec<u8>)> {
        self.levels.get(level as usize)
    }

    pub(crate) fn level_mut(&mut self, level: u32) -> Option<&mut (Extent3D, Vec<u8>)> {
        self.levels.get_mut(level as usize)
    }

    /// Byte range of the row starting at `(x, y, z)` spanning `width` texels.
    pub(crate) fn row(&self, extent: Extent3D, x: u32, y: u32, z: u32, width: u32) -> std::ops::Range<usize> {
        let bpp = self.format.bytes_per_texel() as usize;
        let start = ((z as usize * extent.height as usize + y as usize) * extent.width as usize
            + x as usize)
            * bpp;
        start..start + width as usize * bpp
    }
}

/// Every texture and buffer of a device, keyed by handle.
#[derive(Debug, Default)]
pub(crate) struct SoftMemory {
    textures: HashMap<ResourceHandle, SoftTexture>,
    buffers: HashMap<ResourceHandle, Vec<u8>>,
}

impl SoftMemory {
    pub(crate) fn allocate_texture(&mut self, handle: ResourceHandle, desc: &TextureDescriptor) {
        self.textures.insert(handle, SoftTexture::new(desc));
    }

    pub(crate) fn allocate_buffer(&mut self, handle: ResourceHandle, size: u64, data: Option<&[u8]>) {
        let mut bytes = vec![0; size as usize];
        if let Some(data) = data {
            bytes[..data.len()].copy_from_slice(data);
        }
        self.buffers.insert(handle, bytes);
    }

    /// Frees whatever storage `handle` owns. Returns the bytes released.
    pub(crate) fn free(&mut self, handle: ResourceHandle) -> usize {
        let texture = self
            .textures
            .remove(&handle)
            .map_or(0, |t| t.levels.iter().map(|(_, b)| b.len()).sum());
        let buffer = self.buffers.remove(&handle).map_or(0, |b| b.len());
        texture + buffer
    }

    pub(crate) fn texture(&self, handle: ResourceHandle) -> Result<&SoftTexture, ResourceError> {
        self.textures.get(&handle).ok_or(ResourceError::NotFound)
    }

    pub(crate) fn texture_mut(&mut self, handle: ResourceHandle) -> Result<&mut SoftTexture, ResourceError> {
        self.textures.get_mut(&handle).ok_or(ResourceError::NotFound)
    }

    pub(crate) fn buffer(&self, handle: ResourceHandle) -> Result<&[u8], ResourceError> {
        self.buffers
            .get(&handle)
            .map(Vec::as_slice)
            .ok_or(ResourceError::NotFound)
    }

    pub(crate) fn buffer_mut(&mut self, handle: ResourceHandle) -> Result<&mut Vec<u8>, ResourceError> {
        self.buffers.get_mut(&handle).ok_or(ResourceError::NotFound)
    }

    pub(crate) fn write_buffer(
        &mut self,
        handle: ResourceHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let buffer = self.buffer_mut(handle)?;
        let start = offset as usize;
        let end = start
            .checked_add(data.len())
            .filter(|end| *end <= buffer.len())
            .ok_or(ResourceError::OutOfBounds)?;
        buffer[start..end].copy_from_slice(data);
        Ok(())
    }

    pub(crate) fn copy_buffer(
        &mut self,
        src: ResourceHandle,
        src_offset: u64,
        dst: ResourceHandle,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), ResourceError> {
        let (src_offset, dst_offset, size) = (src_offset as usize, dst_offset as usize, size as usize);
        if src == dst {
            let buffer = self.buffer_mut(src)?;
            buffer.copy_within(src_offset..src_offset + size, dst_offset);
            return Ok(());
        }
        let bytes = self.buffer(src)?[src_offset..src_offset + size].to_vec();
        self.buffer_mut(dst)?[dst_offset..dst_offset + size].copy_from_slice(&bytes);
        Ok(())
    }

    /// Copies a texel region; both regions were bounds-checked at record time.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn copy_texture(
        &mut self,
        src: ResourceHandle,
        src_level: u32,
        src_origin: Origin3D,
        dst: ResourceHandle,
        dst_level: u32,
        dst_origin: Origin3D,
        extent: Extent3D,
    ) -> Result<(), ResourceError> {
        let source = self.texture(src)?;
        let (src_extent, src_bytes) = source.level(src_level).ok_or(ResourceError::OutOfBounds)?;
        let mut rows = Vec::with_capacity((extent.height * extent.depth_or_array_layers) as usize);
        for z in 0..extent.depth_or_array_layers {
            for y in 0..extent.height {
                let range = source.row(*src_extent, src_origin.x, src_origin.y + y, src_origin.z + z, extent.width);
                rows.push(src_bytes.get(range).ok_or(ResourceError::OutOfBounds)?.to_vec());
            }
        }
        let target = self.texture_mut(dst)?;
        let dst_extent = target.level(dst_level).ok_or(ResourceError::OutOfBounds)?.0;
        let mut rows = rows.into_iter();
        for z in 0..extent.depth_or_array_layers {
            for y in 0..extent.height {
                let range = target.row(dst_extent, dst_origin.x, dst_origin.y + y, dst_origin.z + z, extent.width);
                let (_, bytes) = target.level_mut(dst_level).ok_or(ResourceError::OutOfBounds)?;
                let row = rows.next().ok_or(ResourceError::OutOfBounds)?;
                bytes
                    .get_mut(range)
                    .ok_or(ResourceError::OutOfBounds)?
                    .copy_from_slice(&row);
            }
        }
        Ok(())
    }

    /// Total bytes held.
    pub(crate) fn allocated_bytes(&self) -> usize {
        let textures: usize = self
            .textures
            .values()
            .flat_map(|t| t.levels.iter().map(|(_, b)| b.len()))
            .sum();
        textures + self.buffers.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::renderer::{ResourceKind, TextureUsage};

    #[test]
    fn test_texture_levels_shrink() {
        let mut desc = TextureDescriptor::new_2d(8, 4, TextureFormat::Rgba8Unorm, TextureUsage::COPY_SRC);
        desc.mip_level_count = 3;
        let handle = ResourceHandle::allocate(ResourceKind::Texture);
        let mut memory = SoftMemory::default();
        memory.allocate_texture(handle, &desc);
        let texture = memory.texture(handle).unwrap();
        assert_eq!(texture.level(1).map(|(_, b)| b.len()), Some(4 * 2 * 4));
        assert_eq!(texture.level(2).map(|(_, b)| b.len()), Some(2 * 4));
        assert_eq!(memory.free(handle), 128 + 32 + 8);
        assert_eq!(memory.allocated_bytes(), 0);
    }

    #[test]
    fn test_buffer_copy_within_same_buffer() {
        let handle = ResourceHandle::allocate(ResourceKind::Buffer);
        let mut memory = SoftMemory::default();
        memory.allocate_buffer(handle, 8, Some(&[1, 2, 3, 4]));
        memory.copy_buffer(handle, 0, handle, 4, 4).unwrap();
        assert_eq!(memory.buffer(handle).unwrap(), &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(memory.write_buffer(handle, 6, &[0; 4]), Err(ResourceError::OutOfBounds));
    }
}
