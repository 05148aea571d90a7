//! Vertex, index, and uniform buffers.
//!
//! Initial contents go through `create_buffer_init`; later writes go through
//! the queue. There is no mapping surface: wgpu maps asynchronously, and
//! whole-range or offset writes cover every update the device needs.

use anyhow::{Result, bail};
use wgpu::util::DeviceExt;

use super::types::{BufferDesc, BufferUsage, IndexFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

pub(crate) struct BufferEntry {
    pub buffer: wgpu::Buffer,
    pub size: u64,
    pub kind: BufferKind,
    pub usage: BufferUsage,
    /// Remembered from the creation desc for index buffers.
    pub index_format: Option<IndexFormat>,
}

fn usage_flags(kind: BufferKind) -> wgpu::BufferUsages {
    let base = match kind {
        BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
        BufferKind::Index => wgpu::BufferUsages::INDEX,
        BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
    };
    base | wgpu::BufferUsages::COPY_DST
}

/// Allocation size for a desc: initial data wins, otherwise the requested
/// size rounded up to copy alignment.
fn allocation_size(desc: &BufferDesc<'_>) -> u64 {
    match desc.data {
        Some(data) => data.len() as u64,
        None => desc.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
    }
}

pub(crate) fn create_buffer(
    device: &wgpu::Device,
    desc: &BufferDesc<'_>,
    kind: BufferKind,
    index_format: Option<IndexFormat>,
) -> Result<BufferEntry> {
    let size = allocation_size(desc);
    if size == 0 {
        bail!("buffer created with neither data nor a size");
    }

    let buffer = match desc.data {
        Some(data) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: data,
            usage: usage_flags(kind),
        }),
        None => device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: usage_flags(kind),
            mapped_at_creation: false,
        }),
    };

    log::debug!("created {kind:?} buffer, {size} bytes, usage {:?}", desc.usage);

    Ok(BufferEntry {
        buffer,
        size,
        kind,
        usage: desc.usage,
        index_format,
    })
}

/// Checks an update against the entry before touching the queue.
fn validate_update(size: u64, usage: BufferUsage, offset: u64, len: usize) -> Result<()> {
    if usage == BufferUsage::Static {
        bail!("static buffers are immutable after creation");
    }
    if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
        bail!("update offset {offset} is not {}-byte aligned", wgpu::COPY_BUFFER_ALIGNMENT);
    }
    if len as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
        bail!("update length {len} is not {}-byte aligned", wgpu::COPY_BUFFER_ALIGNMENT);
    }
    if offset + len as u64 > size {
        bail!("update of {len} bytes at offset {offset} overruns {size}-byte buffer");
    }
    Ok(())
}

pub(crate) fn update_buffer(
    queue: &wgpu::Queue,
    entry: &BufferEntry,
    offset: u64,
    data: &[u8],
) -> Result<()> {
    validate_update(entry.size, entry.usage, offset, data.len())?;
    queue.write_buffer(&entry.buffer, offset, data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_prefers_data_length() {
        let with_data = BufferDesc {
            usage: BufferUsage::Static,
            data: Some(&[0u8; 24]),
            size: 1024,
        };
        assert_eq!(allocation_size(&with_data), 24);

        let sized = BufferDesc {
            usage: BufferUsage::Dynamic,
            data: None,
            size: 10,
        };
        // Rounded up to copy alignment.
        assert_eq!(allocation_size(&sized), 12);
    }

    #[test]
    fn usage_flags_always_allow_upload() {
        for kind in [BufferKind::Vertex, BufferKind::Index, BufferKind::Uniform] {
            assert!(usage_flags(kind).contains(wgpu::BufferUsages::COPY_DST));
        }
        assert!(usage_flags(BufferKind::Index).contains(wgpu::BufferUsages::INDEX));
    }

    #[test]
    fn updates_are_bounds_and_alignment_checked() {
        assert!(validate_update(64, BufferUsage::Dynamic, 0, 64).is_ok());
        assert!(validate_update(64, BufferUsage::Dynamic, 32, 32).is_ok());

        assert!(validate_update(64, BufferUsage::Static, 0, 64).is_err());
        assert!(validate_update(64, BufferUsage::Dynamic, 3, 4).is_err());
        assert!(validate_update(64, BufferUsage::Dynamic, 0, 6).is_err());
        assert!(validate_update(64, BufferUsage::Stream, 32, 36).is_err());
    }
}
