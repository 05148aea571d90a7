//! Opaque resource handles.
//!
//! Handles are plain ids into the device's resource tables. Id 0 is never
//! allocated, and ids are not reused after destruction, so a stale handle
//! can only ever miss a lookup.

macro_rules! resource_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw id, mainly useful for logging.
            pub fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

resource_handle!(
    /// A compiled shader module for a single stage.
    ShaderHandle
);
resource_handle!(
    /// A linked set of shader stages plus its reflected binding layout.
    ProgramHandle
);
resource_handle!(
    /// A vertex, index, or uniform buffer.
    BufferHandle
);
resource_handle!(
    /// A vertex attribute layout shared by pipelines.
    InputLayoutHandle
);
resource_handle!(
    /// A vertex buffer / index buffer / layout bundle.
    VertexArrayHandle
);
resource_handle!(
    /// A 2D texture and its default view.
    TextureHandle
);
resource_handle!(
    /// A sampler object.
    SamplerHandle
);
resource_handle!(
    /// Immutable rasterizer configuration.
    RasterizerStateHandle
);
resource_handle!(
    /// Immutable depth/stencil configuration.
    DepthStencilStateHandle
);
resource_handle!(
    /// A rasterizer + depth/stencil + topology bundle.
    PipelineStateHandle
);
resource_handle!(
    /// An offscreen render target set.
    FramebufferHandle
);
