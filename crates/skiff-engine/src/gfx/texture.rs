//! 2D textures.
//!
//! Creation maps the requested format through the conversion tables, uploads
//! tightly packed level-0 texels when provided, and keeps the default view
//! alongside the texture. Depth formats carry no CPU upload path and are
//! only usable as framebuffer attachments.

use anyhow::{Context, Result, bail};
use wgpu::util::DeviceExt;

use super::convert;
use super::types::{TextureDesc, TextureFormat};

pub(crate) struct TextureEntry {
    pub view: wgpu::TextureView,
    pub format: TextureFormat,
    pub wgpu_format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub render_target: bool,
}

impl TextureEntry {
    pub fn is_depth(&self) -> bool {
        self.format.is_depth()
    }
}

/// Bytes a tightly packed level-0 upload must provide.
fn expected_data_len(format: TextureFormat, width: u32, height: u32) -> Option<u64> {
    let texel = convert::texel_size(format)?;
    Some(texel as u64 * width as u64 * height as u64)
}

pub(crate) fn create_texture_2d(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    desc: &TextureDesc<'_>,
    device_features: wgpu::Features,
) -> Result<TextureEntry> {
    if desc.width == 0 || desc.height == 0 {
        bail!("texture created with zero extent {}x{}", desc.width, desc.height);
    }

    let wgpu_format = convert::texture_format(desc.format)
        .with_context(|| format!("format {:?} has no native equivalent", desc.format))?;

    if let Some(feature) = convert::format_feature(desc.format) {
        if !device_features.contains(feature) {
            bail!("format {:?} needs device feature {feature:?}", desc.format);
        }
    }

    let is_depth = desc.format.is_depth();
    let usage = if is_depth {
        if desc.data.is_some() {
            bail!("depth formats have no CPU upload path");
        }
        wgpu::TextureUsages::RENDER_ATTACHMENT
    } else {
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if desc.render_target {
            if !convert::is_color_renderable(desc.format) {
                bail!("format {:?} cannot back a render target", desc.format);
            }
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usage
    };

    let texture_desc = wgpu::TextureDescriptor {
        label: None,
        size: wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu_format,
        usage,
        view_formats: &[],
    };

    let texture = match desc.data {
        Some(data) => {
            let expected = expected_data_len(desc.format, desc.width, desc.height)
                .context("format has no defined texel size")?;
            if data.len() as u64 != expected {
                bail!(
                    "texture data is {} bytes, expected {expected} for {}x{} {:?}",
                    data.len(),
                    desc.width,
                    desc.height,
                    desc.format
                );
            }
            device.create_texture_with_data(
                queue,
                &texture_desc,
                wgpu::util::TextureDataOrder::LayerMajor,
                data,
            )
        }
        None => device.create_texture(&texture_desc),
    };

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    log::debug!(
        "created texture {}x{} {:?}{}",
        desc.width,
        desc.height,
        desc.format,
        if desc.render_target { " (render target)" } else { "" },
    );

    Ok(TextureEntry {
        view,
        format: desc.format,
        wgpu_format,
        width: desc.width,
        height: desc.height,
        render_target: desc.render_target,
    })
}

/// 1x1 opaque white, substituted for texture slots a program expects but the
/// caller never bound.
pub(crate) fn create_fallback_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> TextureEntry {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("fallback white"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &[0xff, 0xff, 0xff, 0xff],
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    TextureEntry {
        view,
        format: TextureFormat::Rgba8Unorm,
        wgpu_format: wgpu::TextureFormat::Rgba8Unorm,
        width: 1,
        height: 1,
        render_target: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_sizes_are_tight() {
        assert_eq!(expected_data_len(TextureFormat::Rgba8Unorm, 4, 4), Some(64));
        assert_eq!(expected_data_len(TextureFormat::R8Unorm, 3, 2), Some(6));
        assert_eq!(
            expected_data_len(TextureFormat::Rgba32Float, 2, 2),
            Some(64)
        );
        assert_eq!(expected_data_len(TextureFormat::Depth16Unorm, 4, 4), None);
    }
}
