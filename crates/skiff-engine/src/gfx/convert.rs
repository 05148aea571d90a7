//! Translation tables from the description language to wgpu.
//!
//! Every conversion is an exhaustive match. Partial tables return `Option`
//! and callers turn `None` into a creation error; nothing in here logs.

use super::types::{
    CompareFunc, CullMode, FillMode, IndexFormat, PrimitiveTopology, ShaderStage, StencilOp,
    TextureFilter, TextureFormat, TextureWrap, VertexAttribType,
};

pub(crate) fn compare_func(func: CompareFunc) -> wgpu::CompareFunction {
    match func {
        CompareFunc::Never => wgpu::CompareFunction::Never,
        CompareFunc::Less => wgpu::CompareFunction::Less,
        CompareFunc::Equal => wgpu::CompareFunction::Equal,
        CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunc::Greater => wgpu::CompareFunction::Greater,
        CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunc::Always => wgpu::CompareFunction::Always,
    }
}

pub(crate) fn stencil_op(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::IncrSat => wgpu::StencilOperation::IncrementClamp,
        StencilOp::DecrSat => wgpu::StencilOperation::DecrementClamp,
        StencilOp::Invert => wgpu::StencilOperation::Invert,
        StencilOp::Incr => wgpu::StencilOperation::IncrementWrap,
        StencilOp::Decr => wgpu::StencilOperation::DecrementWrap,
    }
}

pub(crate) fn topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveTopology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        PrimitiveTopology::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveTopology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
    }
}

/// Outer `None` marks an unsupported cull mode; inner `None` disables culling.
pub(crate) fn cull_mode(mode: CullMode) -> Option<Option<wgpu::Face>> {
    match mode {
        CullMode::Front => Some(Some(wgpu::Face::Front)),
        CullMode::Back => Some(Some(wgpu::Face::Back)),
        CullMode::FrontAndBack => None,
        CullMode::None => Some(None),
    }
}

pub(crate) fn fill_mode(mode: FillMode) -> wgpu::PolygonMode {
    match mode {
        FillMode::Solid => wgpu::PolygonMode::Fill,
        FillMode::Wireframe => wgpu::PolygonMode::Line,
    }
}

/// `None` for formats wgpu cannot express (all three-component layouts).
pub(crate) fn texture_format(format: TextureFormat) -> Option<wgpu::TextureFormat> {
    match format {
        TextureFormat::Rgb32Float => None,
        TextureFormat::Rgb32Uint => None,
        TextureFormat::Rgb32Sint => None,
        TextureFormat::Rgba32Float => Some(wgpu::TextureFormat::Rgba32Float),
        TextureFormat::Rgba32Uint => Some(wgpu::TextureFormat::Rgba32Uint),
        TextureFormat::Rgba32Sint => Some(wgpu::TextureFormat::Rgba32Sint),
        TextureFormat::Rgba16Float => Some(wgpu::TextureFormat::Rgba16Float),
        TextureFormat::Rgba16Uint => Some(wgpu::TextureFormat::Rgba16Uint),
        TextureFormat::Rgba16Sint => Some(wgpu::TextureFormat::Rgba16Sint),
        TextureFormat::Rgba16Unorm => Some(wgpu::TextureFormat::Rgba16Unorm),
        TextureFormat::Rgba16Snorm => Some(wgpu::TextureFormat::Rgba16Snorm),
        TextureFormat::Rg32Float => Some(wgpu::TextureFormat::Rg32Float),
        TextureFormat::Rg32Uint => Some(wgpu::TextureFormat::Rg32Uint),
        TextureFormat::Rg32Sint => Some(wgpu::TextureFormat::Rg32Sint),
        TextureFormat::Rg16Float => Some(wgpu::TextureFormat::Rg16Float),
        TextureFormat::R32Float => Some(wgpu::TextureFormat::R32Float),
        TextureFormat::R32Uint => Some(wgpu::TextureFormat::R32Uint),
        TextureFormat::R32Sint => Some(wgpu::TextureFormat::R32Sint),
        TextureFormat::R16Float => Some(wgpu::TextureFormat::R16Float),
        TextureFormat::Rgba8Unorm => Some(wgpu::TextureFormat::Rgba8Unorm),
        TextureFormat::Rgba8UnormSrgb => Some(wgpu::TextureFormat::Rgba8UnormSrgb),
        TextureFormat::Rgba8Snorm => Some(wgpu::TextureFormat::Rgba8Snorm),
        TextureFormat::Rgba8Uint => Some(wgpu::TextureFormat::Rgba8Uint),
        TextureFormat::Rgba8Sint => Some(wgpu::TextureFormat::Rgba8Sint),
        TextureFormat::R8Unorm => Some(wgpu::TextureFormat::R8Unorm),
        TextureFormat::R8Snorm => Some(wgpu::TextureFormat::R8Snorm),
        TextureFormat::Depth32FloatStencil8 => Some(wgpu::TextureFormat::Depth32FloatStencil8),
        TextureFormat::Depth24PlusStencil8 => Some(wgpu::TextureFormat::Depth24PlusStencil8),
        TextureFormat::Depth16Unorm => Some(wgpu::TextureFormat::Depth16Unorm),
    }
}

/// Bytes per texel for upload row pitch. Depth formats have no CPU upload
/// path and return `None`.
pub(crate) fn texel_size(format: TextureFormat) -> Option<u32> {
    match format {
        TextureFormat::Rgb32Float | TextureFormat::Rgb32Uint | TextureFormat::Rgb32Sint => {
            Some(12)
        }
        TextureFormat::Rgba32Float | TextureFormat::Rgba32Uint | TextureFormat::Rgba32Sint => {
            Some(16)
        }
        TextureFormat::Rgba16Float
        | TextureFormat::Rgba16Uint
        | TextureFormat::Rgba16Sint
        | TextureFormat::Rgba16Unorm
        | TextureFormat::Rgba16Snorm => Some(8),
        TextureFormat::Rg32Float | TextureFormat::Rg32Uint | TextureFormat::Rg32Sint => Some(8),
        TextureFormat::Rg16Float => Some(4),
        TextureFormat::R32Float | TextureFormat::R32Uint | TextureFormat::R32Sint => Some(4),
        TextureFormat::R16Float => Some(2),
        TextureFormat::Rgba8Unorm
        | TextureFormat::Rgba8UnormSrgb
        | TextureFormat::Rgba8Snorm
        | TextureFormat::Rgba8Uint
        | TextureFormat::Rgba8Sint => Some(4),
        TextureFormat::R8Unorm | TextureFormat::R8Snorm => Some(1),
        TextureFormat::Depth32FloatStencil8
        | TextureFormat::Depth24PlusStencil8
        | TextureFormat::Depth16Unorm => None,
    }
}

pub(crate) fn wrap_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::ClampToBorder => wgpu::AddressMode::ClampToBorder,
    }
}

pub(crate) fn mag_filter(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Linear
        | TextureFilter::LinearAll
        | TextureFilter::AnisotropicAll
        | TextureFilter::LinearMipNearest => wgpu::FilterMode::Linear,
        TextureFilter::Nearest
        | TextureFilter::NearestAll
        | TextureFilter::NearestMipLinear => wgpu::FilterMode::Nearest,
    }
}

/// Minification filter and mip blend, in that order.
pub(crate) fn min_filter(filter: TextureFilter) -> (wgpu::FilterMode, wgpu::FilterMode) {
    match filter {
        TextureFilter::Linear => (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear),
        TextureFilter::Nearest => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Nearest),
        TextureFilter::LinearAll => (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear),
        TextureFilter::NearestAll => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Nearest),
        TextureFilter::AnisotropicAll => (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear),
        TextureFilter::LinearMipNearest => (wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest),
        TextureFilter::NearestMipLinear => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Linear),
    }
}

pub(crate) fn index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

/// Vertex attribute format for a scalar type, component count, and
/// normalization flag. `None` when wgpu has no matching layout (notably all
/// three-component 8/16-bit forms and normalized 32-bit integers).
pub(crate) fn vertex_format(
    ty: VertexAttribType,
    components: u32,
    normalized: bool,
) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as V;

    let format = match (ty, components, normalized) {
        (VertexAttribType::Byte, 1, true) => V::Snorm8,
        (VertexAttribType::Byte, 2, true) => V::Snorm8x2,
        (VertexAttribType::Byte, 4, true) => V::Snorm8x4,
        (VertexAttribType::Byte, 1, false) => V::Sint8,
        (VertexAttribType::Byte, 2, false) => V::Sint8x2,
        (VertexAttribType::Byte, 4, false) => V::Sint8x4,

        (VertexAttribType::UnsignedByte, 1, true) => V::Unorm8,
        (VertexAttribType::UnsignedByte, 2, true) => V::Unorm8x2,
        (VertexAttribType::UnsignedByte, 4, true) => V::Unorm8x4,
        (VertexAttribType::UnsignedByte, 1, false) => V::Uint8,
        (VertexAttribType::UnsignedByte, 2, false) => V::Uint8x2,
        (VertexAttribType::UnsignedByte, 4, false) => V::Uint8x4,

        (VertexAttribType::Int16, 1, true) => V::Snorm16,
        (VertexAttribType::Int16, 2, true) => V::Snorm16x2,
        (VertexAttribType::Int16, 4, true) => V::Snorm16x4,
        (VertexAttribType::Int16, 1, false) => V::Sint16,
        (VertexAttribType::Int16, 2, false) => V::Sint16x2,
        (VertexAttribType::Int16, 4, false) => V::Sint16x4,

        (VertexAttribType::Uint16, 1, true) => V::Unorm16,
        (VertexAttribType::Uint16, 2, true) => V::Unorm16x2,
        (VertexAttribType::Uint16, 4, true) => V::Unorm16x4,
        (VertexAttribType::Uint16, 1, false) => V::Uint16,
        (VertexAttribType::Uint16, 2, false) => V::Uint16x2,
        (VertexAttribType::Uint16, 4, false) => V::Uint16x4,

        (VertexAttribType::Int32, 1, false) => V::Sint32,
        (VertexAttribType::Int32, 2, false) => V::Sint32x2,
        (VertexAttribType::Int32, 3, false) => V::Sint32x3,
        (VertexAttribType::Int32, 4, false) => V::Sint32x4,

        (VertexAttribType::Uint32, 1, false) => V::Uint32,
        (VertexAttribType::Uint32, 2, false) => V::Uint32x2,
        (VertexAttribType::Uint32, 3, false) => V::Uint32x3,
        (VertexAttribType::Uint32, 4, false) => V::Uint32x4,

        // Floats ignore the normalized flag.
        (VertexAttribType::Float, 1, _) => V::Float32,
        (VertexAttribType::Float, 2, _) => V::Float32x2,
        (VertexAttribType::Float, 3, _) => V::Float32x3,
        (VertexAttribType::Float, 4, _) => V::Float32x4,

        _ => return None,
    };

    Some(format)
}

/// Whether a color format can back a render-target attachment.
///
/// Snorm layouts are sampleable but not renderable on the native API;
/// three-component layouts never reach this check (creation rejects them).
pub(crate) fn is_color_renderable(format: TextureFormat) -> bool {
    !matches!(
        format,
        TextureFormat::Rgba8Snorm
            | TextureFormat::R8Snorm
            | TextureFormat::Rgba16Snorm
            | TextureFormat::Rgb32Float
            | TextureFormat::Rgb32Uint
            | TextureFormat::Rgb32Sint
    ) && !format.is_depth()
}

/// Device feature a format needs beyond the baseline, if any.
pub(crate) fn format_feature(format: TextureFormat) -> Option<wgpu::Features> {
    match format {
        TextureFormat::Rgba16Unorm | TextureFormat::Rgba16Snorm => {
            Some(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM)
        }
        TextureFormat::Depth32FloatStencil8 => Some(wgpu::Features::DEPTH32FLOAT_STENCIL8),
        _ => None,
    }
}

/// Nearest of the three fixed border colors wgpu offers. The second value is
/// false when the requested color was not matched exactly.
pub(crate) fn border_color(rgba: [f32; 4]) -> (wgpu::SamplerBorderColor, bool) {
    let candidates = [
        (wgpu::SamplerBorderColor::TransparentBlack, [0.0, 0.0, 0.0, 0.0]),
        (wgpu::SamplerBorderColor::OpaqueBlack, [0.0, 0.0, 0.0, 1.0]),
        (wgpu::SamplerBorderColor::OpaqueWhite, [1.0, 1.0, 1.0, 1.0]),
    ];

    let dist = |a: [f32; 4], b: [f32; 4]| -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum()
    };

    let mut best = candidates[0];
    let mut best_dist = dist(rgba, best.1);
    for cand in &candidates[1..] {
        let d = dist(rgba, cand.1);
        if d < best_dist {
            best = *cand;
            best_dist = d;
        }
    }

    (best.0, best_dist == 0.0)
}

/// Visibility flags for the stages the native API runs. `None` for stages
/// it does not have.
pub(crate) fn shader_visibility(stage: ShaderStage) -> Option<wgpu::ShaderStages> {
    match stage {
        ShaderStage::Vertex => Some(wgpu::ShaderStages::VERTEX),
        ShaderStage::Fragment => Some(wgpu::ShaderStages::FRAGMENT),
        ShaderStage::Compute => Some(wgpu::ShaderStages::COMPUTE),
        ShaderStage::Geometry | ShaderStage::TessControl | ShaderStage::TessEval => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stencil_wrap_and_saturate_map_apart() {
        assert_eq!(
            stencil_op(StencilOp::IncrSat),
            wgpu::StencilOperation::IncrementClamp
        );
        assert_eq!(
            stencil_op(StencilOp::Incr),
            wgpu::StencilOperation::IncrementWrap
        );
        assert_eq!(
            stencil_op(StencilOp::DecrSat),
            wgpu::StencilOperation::DecrementClamp
        );
        assert_eq!(
            stencil_op(StencilOp::Decr),
            wgpu::StencilOperation::DecrementWrap
        );
    }

    #[test]
    fn front_and_back_culling_is_unsupported() {
        assert_eq!(cull_mode(CullMode::Back), Some(Some(wgpu::Face::Back)));
        assert_eq!(cull_mode(CullMode::None), Some(None));
        assert_eq!(cull_mode(CullMode::FrontAndBack), None);
    }

    #[test]
    fn three_component_texture_formats_are_unsupported() {
        assert_eq!(texture_format(TextureFormat::Rgb32Float), None);
        assert_eq!(texture_format(TextureFormat::Rgb32Uint), None);
        assert_eq!(
            texture_format(TextureFormat::Rgba8Unorm),
            Some(wgpu::TextureFormat::Rgba8Unorm)
        );
        assert_eq!(
            texture_format(TextureFormat::Depth24PlusStencil8),
            Some(wgpu::TextureFormat::Depth24PlusStencil8)
        );
    }

    #[test]
    fn texel_sizes_match_formats() {
        assert_eq!(texel_size(TextureFormat::Rgba8Unorm), Some(4));
        assert_eq!(texel_size(TextureFormat::Rgba32Float), Some(16));
        assert_eq!(texel_size(TextureFormat::R8Unorm), Some(1));
        assert_eq!(texel_size(TextureFormat::Depth16Unorm), None);
    }

    #[test]
    fn vertex_formats_cover_the_native_grid() {
        assert_eq!(
            vertex_format(VertexAttribType::Float, 3, false),
            Some(wgpu::VertexFormat::Float32x3)
        );
        assert_eq!(
            vertex_format(VertexAttribType::UnsignedByte, 4, true),
            Some(wgpu::VertexFormat::Unorm8x4)
        );
        assert_eq!(
            vertex_format(VertexAttribType::Uint32, 2, false),
            Some(wgpu::VertexFormat::Uint32x2)
        );
        // No three-component 8-bit layout, no normalized 32-bit integers.
        assert_eq!(vertex_format(VertexAttribType::Byte, 3, true), None);
        assert_eq!(vertex_format(VertexAttribType::Int32, 2, true), None);
    }

    #[test]
    fn filter_triples_follow_the_selection() {
        assert_eq!(mag_filter(TextureFilter::NearestMipLinear), wgpu::FilterMode::Nearest);
        assert_eq!(
            min_filter(TextureFilter::LinearMipNearest),
            (wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest)
        );
        assert_eq!(
            min_filter(TextureFilter::AnisotropicAll),
            (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear)
        );
    }

    #[test]
    fn border_colors_quantize_to_nearest() {
        let (c, exact) = border_color([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(c, wgpu::SamplerBorderColor::OpaqueWhite);
        assert!(exact);

        let (c, exact) = border_color([0.9, 0.8, 0.95, 1.0]);
        assert_eq!(c, wgpu::SamplerBorderColor::OpaqueWhite);
        assert!(!exact);

        let (c, _) = border_color([0.0, 0.0, 0.0, 0.1]);
        assert_eq!(c, wgpu::SamplerBorderColor::TransparentBlack);
    }

    #[test]
    fn snorm_and_depth_formats_are_not_color_renderable() {
        assert!(is_color_renderable(TextureFormat::Rgba8Unorm));
        assert!(is_color_renderable(TextureFormat::Rgba16Float));
        assert!(is_color_renderable(TextureFormat::R32Uint));
        assert!(!is_color_renderable(TextureFormat::Rgba8Snorm));
        assert!(!is_color_renderable(TextureFormat::Depth16Unorm));
    }

    #[test]
    fn gated_formats_name_their_feature() {
        assert_eq!(
            format_feature(TextureFormat::Depth32FloatStencil8),
            Some(wgpu::Features::DEPTH32FLOAT_STENCIL8)
        );
        assert_eq!(
            format_feature(TextureFormat::Rgba16Unorm),
            Some(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM)
        );
        assert_eq!(format_feature(TextureFormat::Rgba8Unorm), None);
    }

    #[test]
    fn only_native_stages_get_visibility() {
        assert!(shader_visibility(ShaderStage::Vertex).is_some());
        assert!(shader_visibility(ShaderStage::Fragment).is_some());
        assert!(shader_visibility(ShaderStage::Geometry).is_none());
        assert!(shader_visibility(ShaderStage::TessEval).is_none());
    }
}
