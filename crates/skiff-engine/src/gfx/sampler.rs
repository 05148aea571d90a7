//! Sampler objects.

use anyhow::Result;

use super::convert;
use super::types::{SamplerDesc, TextureFilter, TextureWrap};

pub(crate) struct SamplerEntry {
    pub sampler: wgpu::Sampler,
}

/// Filter selection: anisotropic filtering forces linear everywhere (a
/// native API requirement); otherwise the filter tables decide.
fn resolve_filters(
    desc: &SamplerDesc,
) -> (wgpu::FilterMode, wgpu::FilterMode, wgpu::FilterMode, u16) {
    let anisotropic = (desc.min_filter == TextureFilter::AnisotropicAll
        || desc.mag_filter == TextureFilter::AnisotropicAll)
        && desc.max_anisotropy > 0;

    if anisotropic {
        let clamp = desc.max_anisotropy.clamp(1, 16);
        (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            clamp,
        )
    } else {
        let mag = convert::mag_filter(desc.mag_filter);
        let (min, mip) = convert::min_filter(desc.min_filter);
        (mag, min, mip, 1)
    }
}

pub(crate) fn create_sampler(
    device: &wgpu::Device,
    desc: &SamplerDesc,
    device_features: wgpu::Features,
) -> Result<SamplerEntry> {
    let border_supported =
        device_features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);

    let mut uses_border = false;
    let mut resolve_wrap = |wrap: TextureWrap| {
        if wrap == TextureWrap::ClampToBorder && !border_supported {
            log::warn!("clamp-to-border unsupported on this adapter; using clamp-to-edge");
            return wgpu::AddressMode::ClampToEdge;
        }
        if wrap == TextureWrap::ClampToBorder {
            uses_border = true;
        }
        convert::wrap_mode(wrap)
    };

    let address_mode_u = resolve_wrap(desc.wrap_u);
    let address_mode_v = resolve_wrap(desc.wrap_v);
    let address_mode_w = resolve_wrap(desc.wrap_w);

    let border_color = if uses_border {
        let (color, exact) = convert::border_color(desc.border_color);
        if !exact {
            log::warn!(
                "border color {:?} quantized to {color:?}; the native API has three fixed borders",
                desc.border_color
            );
        }
        Some(color)
    } else {
        None
    };

    let (mag_filter, min_filter, mipmap_filter, anisotropy_clamp) = resolve_filters(desc);

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: None,
        address_mode_u,
        address_mode_v,
        address_mode_w,
        mag_filter,
        min_filter,
        mipmap_filter: match mipmap_filter {
            wgpu::FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
            wgpu::FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
        },
        lod_min_clamp: 0.0,
        lod_max_clamp: 32.0,
        compare: None,
        anisotropy_clamp,
        border_color,
    });

    Ok(SamplerEntry { sampler })
}

/// Default linear-repeat sampler substituted for sampler slots a program
/// expects but the caller never bound.
pub(crate) fn create_fallback_sampler(device: &wgpu::Device) -> SamplerEntry {
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("fallback sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        lod_min_clamp: 0.0,
        lod_max_clamp: 32.0,
        compare: None,
        anisotropy_clamp: 1,
        border_color: None,
    });
    SamplerEntry { sampler }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anisotropy_forces_linear_filtering() {
        let desc = SamplerDesc {
            min_filter: TextureFilter::AnisotropicAll,
            mag_filter: TextureFilter::NearestAll,
            max_anisotropy: 8,
            ..Default::default()
        };
        let (mag, min, mip, clamp) = resolve_filters(&desc);
        assert_eq!(mag, wgpu::FilterMode::Linear);
        assert_eq!(min, wgpu::FilterMode::Linear);
        assert_eq!(mip, wgpu::FilterMode::Linear);
        assert_eq!(clamp, 8);
    }

    #[test]
    fn anisotropy_clamps_to_native_range() {
        let desc = SamplerDesc {
            min_filter: TextureFilter::AnisotropicAll,
            max_anisotropy: 64,
            ..Default::default()
        };
        assert_eq!(resolve_filters(&desc).3, 16);
    }

    #[test]
    fn zero_anisotropy_falls_back_to_tables() {
        let desc = SamplerDesc {
            min_filter: TextureFilter::AnisotropicAll,
            mag_filter: TextureFilter::Nearest,
            max_anisotropy: 0,
            ..Default::default()
        };
        let (mag, _, _, clamp) = resolve_filters(&desc);
        assert_eq!(mag, wgpu::FilterMode::Nearest);
        assert_eq!(clamp, 1);
    }
}
