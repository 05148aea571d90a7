//! API-agnostic enums and creation descriptors.
//!
//! These types describe resources without reference to the native API. The
//! translation tables live in [`super::convert`]; a few combinations are
//! representable here but rejected there because the native API cannot
//! express them.

use std::ops::{BitOr, BitOrAssign};

use super::handle::{BufferHandle, InputLayoutHandle, TextureHandle};

/// Uniform-buffer slots addressable through `bind_uniform_buffer`.
pub const MAX_UNIFORM_SLOTS: usize = 8;

/// Texture/sampler slots addressable through `bind_texture` / `bind_sampler_state`.
pub const MAX_TEXTURE_SLOTS: usize = 8;

/// Shader pipeline stage.
///
/// Geometry and tessellation stages exist for completeness of the
/// description language; the device rejects them at shader creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEval,
    Compute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    Points,
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
}

impl PrimitiveTopology {
    /// Strip topologies need a pipeline-level index format when drawn indexed.
    pub fn is_strip(self) -> bool {
        matches!(self, Self::TriangleStrip | Self::LineStrip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    Front,
    Back,
    /// Legal in the description language, rejected at state creation.
    FrontAndBack,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrSat,
    DecrSat,
    Invert,
    Incr,
    Decr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Which aspects of the bound framebuffer a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearTarget(u32);

impl ClearTarget {
    pub const COLOR: Self = Self(1);
    pub const DEPTH: Self = Self(1 << 1);
    pub const STENCIL: Self = Self(1 << 2);
    pub const ALL: Self = Self(1 | 1 << 1 | 1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ClearTarget {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ClearTarget {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Texel formats understood by the description language.
///
/// Three-component formats are carried for completeness; the native API has
/// no equivalents and texture creation rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgb32Float,
    Rgb32Uint,
    Rgb32Sint,
    Rgba32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba16Float,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Unorm,
    Rgba16Snorm,
    Rg32Float,
    Rg32Uint,
    Rg32Sint,
    Rg16Float,
    R32Float,
    R32Uint,
    R32Sint,
    R16Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    R8Unorm,
    R8Snorm,
    Depth32FloatStencil8,
    Depth24PlusStencil8,
    Depth16Unorm,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Self::Depth32FloatStencil8 | Self::Depth24PlusStencil8 | Self::Depth16Unorm
        )
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Self::Depth32FloatStencil8 | Self::Depth24PlusStencil8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Combined minification/magnification/mip filter selection.
///
/// The short names follow the usual convention: `Linear`/`Nearest` select the
/// base filter with linear mip blending, the `*All` variants force every
/// filter, and the two `*Mip*` variants mix base and mip filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Linear,
    Nearest,
    LinearAll,
    NearestAll,
    AnisotropicAll,
    LinearMipNearest,
    NearestMipLinear,
}

/// Expected update frequency for a buffer.
///
/// The native API does not distinguish these; the value is kept for
/// diagnostics and validation (`Static` buffers reject updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// Scalar type of a vertex attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribType {
    Byte,
    UnsignedByte,
    Int16,
    Int32,
    Uint16,
    Uint32,
    Float,
}

/// Contents and usage of a vertex or uniform buffer at creation.
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub usage: BufferUsage,
    /// Initial contents. When absent, `size` bytes are allocated zeroed.
    pub data: Option<&'a [u8]>,
    /// Allocation size; ignored when `data` is present (its length wins).
    pub size: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexBufferDesc<'a> {
    pub buffer: BufferDesc<'a>,
    pub format: IndexFormat,
}

/// One vertex attribute within an input layout.
///
/// Attributes receive shader locations in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct VertexElement {
    pub ty: VertexAttribType,
    /// Component count, 1 to 4.
    pub components: u32,
    /// Integer types map to normalized float formats when set.
    pub normalized: bool,
    /// Byte offset from the start of the vertex.
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct InputLayoutDesc<'a> {
    pub elements: &'a [VertexElement],
    /// Byte stride between consecutive vertices.
    pub vertex_stride: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexArrayDesc {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    pub layout: InputLayoutHandle,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Tightly packed level-0 texels. Depth formats must pass `None`.
    pub data: Option<&'a [u8]>,
    /// Requests RENDER_ATTACHMENT usage so the texture can back a framebuffer.
    pub render_target: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub wrap_u: TextureWrap,
    pub wrap_v: TextureWrap,
    pub wrap_w: TextureWrap,
    /// Used only when a wrap mode is `ClampToBorder`. The native API exposes
    /// three fixed border colors; the nearest one is chosen.
    pub border_color: [f32; 4],
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    /// Upper bound when either filter is `AnisotropicAll`; clamped to 1..=16.
    pub max_anisotropy: u16,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            wrap_u: TextureWrap::Repeat,
            wrap_v: TextureWrap::Repeat,
            wrap_w: TextureWrap::Repeat,
            border_color: [0.0; 4],
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            max_anisotropy: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RasterizerDesc {
    pub cull_mode: CullMode,
    pub fill_mode: FillMode,
    /// Counter-clockwise winding marks the front face when set.
    pub front_ccw: bool,
    /// Carried from the description language; the device has no scissor-rect
    /// operation, so this has no effect on draws.
    pub scissor: bool,
    /// Carried for completeness; surfaces are single-sampled.
    pub multisample: bool,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            fill_mode: FillMode::Solid,
            front_ccw: true,
            scissor: false,
            multisample: false,
        }
    }
}

/// Per-face stencil behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceDesc {
    pub func: CompareFunc,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DepthStencilDesc {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunc,
    pub stencil_test: bool,
    pub stencil_read_mask: u32,
    pub stencil_write_mask: u32,
    /// Reference value compared by the stencil funcs.
    pub stencil_ref: u32,
    pub front: StencilFaceDesc,
    pub back: StencilFaceDesc,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            depth_func: CompareFunc::Less,
            stencil_test: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            stencil_ref: 0,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}

/// Bundle creating rasterizer and depth/stencil state plus the topology in
/// one call. The contained states are owned by the pipeline state and are
/// destroyed with it.
#[derive(Debug, Clone, Copy)]
pub struct PipelineStateDesc {
    pub rasterizer: RasterizerDesc,
    pub depth_stencil: DepthStencilDesc,
    pub topology: PrimitiveTopology,
}

impl Default for PipelineStateDesc {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerDesc::default(),
            depth_stencil: DepthStencilDesc::default(),
            topology: PrimitiveTopology::Triangles,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FramebufferDesc {
    pub color_targets: Vec<TextureHandle>,
    pub depth_target: Option<TextureHandle>,
}

/// Viewport rectangle in framebuffer pixels, y-down from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_target_flags_combine() {
        let t = ClearTarget::COLOR | ClearTarget::DEPTH;
        assert!(t.contains(ClearTarget::COLOR));
        assert!(t.contains(ClearTarget::DEPTH));
        assert!(!t.contains(ClearTarget::STENCIL));
        assert!(ClearTarget::ALL.contains(t));
    }

    #[test]
    fn depth_formats_classify() {
        assert!(TextureFormat::Depth24PlusStencil8.is_depth());
        assert!(TextureFormat::Depth24PlusStencil8.has_stencil());
        assert!(TextureFormat::Depth16Unorm.is_depth());
        assert!(!TextureFormat::Depth16Unorm.has_stencil());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
    }

    #[test]
    fn strip_topologies() {
        assert!(PrimitiveTopology::TriangleStrip.is_strip());
        assert!(PrimitiveTopology::LineStrip.is_strip());
        assert!(!PrimitiveTopology::Triangles.is_strip());
    }
}
