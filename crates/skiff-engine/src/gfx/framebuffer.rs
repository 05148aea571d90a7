//! Off-screen framebuffers.
//!
//! A framebuffer is a set of texture attachments rendered to in place of
//! the swapchain. Attachments are stored as handles and resolved when a
//! pass against the framebuffer is assembled, so destroying a texture
//! mid-frame keeps already-recorded passes valid.

use anyhow::{bail, Result};

use super::handle::TextureHandle;
use super::types::{FramebufferDesc, TextureFormat};

pub const MAX_COLOR_TARGETS: usize = 4;

pub(crate) struct FramebufferEntry {
    pub color_targets: [Option<TextureHandle>; MAX_COLOR_TARGETS],
    pub depth_target: Option<TextureHandle>,
}

impl FramebufferEntry {
    pub fn has_any_attachment(&self) -> bool {
        self.depth_target.is_some() || self.color_targets.iter().any(Option::is_some)
    }
}

pub(crate) fn create_framebuffer(desc: &FramebufferDesc) -> Result<FramebufferEntry> {
    if desc.color_targets.len() > MAX_COLOR_TARGETS {
        bail!(
            "framebuffer requests {} color targets, limit is {MAX_COLOR_TARGETS}",
            desc.color_targets.len()
        );
    }
    let mut color_targets = [None; MAX_COLOR_TARGETS];
    for (slot, texture) in desc.color_targets.iter().enumerate() {
        color_targets[slot] = Some(*texture);
    }
    Ok(FramebufferEntry {
        color_targets,
        depth_target: desc.depth_target,
    })
}

/// Resolved attachment shape, checked whenever the attachment set changes.
pub(crate) struct AttachmentInfo {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Completeness rules: at least one attachment, matching extents, depth
/// formats only on the depth slot and color formats only on color slots.
pub(crate) fn validate_attachments(
    colors: &[AttachmentInfo],
    depth: Option<&AttachmentInfo>,
) -> Result<()> {
    if colors.is_empty() && depth.is_none() {
        bail!("framebuffer has no attachments");
    }

    let mut extent: Option<(u32, u32)> = None;
    let mut check_extent = |info: &AttachmentInfo| -> Result<()> {
        match extent {
            None => {
                extent = Some((info.width, info.height));
                Ok(())
            }
            Some((w, h)) if (w, h) == (info.width, info.height) => Ok(()),
            Some((w, h)) => bail!(
                "framebuffer attachment is {}x{}, others are {w}x{h}",
                info.width,
                info.height
            ),
        }
    };

    for info in colors {
        if info.format.is_depth() {
            bail!("depth format {:?} attached as a color target", info.format);
        }
        check_extent(info)?;
    }
    if let Some(info) = depth {
        if !info.format.is_depth() {
            bail!("color format {:?} attached as the depth target", info.format);
        }
        check_extent(info)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(format: TextureFormat, width: u32, height: u32) -> AttachmentInfo {
        AttachmentInfo {
            format,
            width,
            height,
        }
    }

    #[test]
    fn accepts_matching_color_and_depth() {
        let colors = [
            info(TextureFormat::Rgba8Unorm, 256, 128),
            info(TextureFormat::Rgba16Float, 256, 128),
        ];
        let depth = info(TextureFormat::Depth24PlusStencil8, 256, 128);
        assert!(validate_attachments(&colors, Some(&depth)).is_ok());
    }

    #[test]
    fn rejects_mismatched_extents() {
        let colors = [
            info(TextureFormat::Rgba8Unorm, 256, 128),
            info(TextureFormat::Rgba8Unorm, 128, 128),
        ];
        assert!(validate_attachments(&colors, None).is_err());
    }

    #[test]
    fn rejects_swapped_format_roles() {
        let depth_as_color = [info(TextureFormat::Depth16Unorm, 64, 64)];
        assert!(validate_attachments(&depth_as_color, None).is_err());

        let color_as_depth = info(TextureFormat::Rgba8Unorm, 64, 64);
        assert!(validate_attachments(&[], Some(&color_as_depth)).is_err());
    }

    #[test]
    fn rejects_empty_attachment_set() {
        assert!(validate_attachments(&[], None).is_err());
    }

    #[test]
    fn create_caps_color_target_count() {
        let targets: Vec<TextureHandle> =
            (1..=5).map(TextureHandle).collect();
        let desc = FramebufferDesc {
            color_targets: targets,
            depth_target: None,
        };
        assert!(create_framebuffer(&desc).is_err());
    }
}
