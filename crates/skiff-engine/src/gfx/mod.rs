//! The render device: resource tables, bound state, and deferred draws.
//!
//! Everything GPU-facing goes through [`RenderDevice`]. Creation returns an
//! opaque handle, binds update tracked state, and draws snapshot that state
//! into a command list the runtime replays into native render passes at the
//! end of the frame.

mod buffer;
mod commands;
mod convert;
mod device;
mod framebuffer;
mod handle;
mod layout;
mod pipeline;
mod reflect;
mod registry;
mod replay;
mod sampler;
mod shader;
mod state;
mod texture;
mod types;

pub use device::RenderDevice;
pub use framebuffer::MAX_COLOR_TARGETS;
pub use handle::{
    BufferHandle, DepthStencilStateHandle, FramebufferHandle, InputLayoutHandle,
    PipelineStateHandle, ProgramHandle, RasterizerStateHandle, SamplerHandle, ShaderHandle,
    TextureHandle, VertexArrayHandle,
};
pub use types::{
    BufferDesc, BufferUsage, ClearTarget, CompareFunc, CullMode, DepthStencilDesc, FillMode,
    FramebufferDesc, IndexBufferDesc, IndexFormat, InputLayoutDesc, MAX_TEXTURE_SLOTS,
    MAX_UNIFORM_SLOTS, PipelineStateDesc, PrimitiveTopology, RasterizerDesc, SamplerDesc,
    ShaderStage, StencilFaceDesc, StencilOp, TextureDesc, TextureFilter, TextureFormat,
    TextureWrap, VertexArrayDesc, VertexAttribType, VertexElement, Viewport,
};

pub(crate) use replay::DefaultFramebuffer;
