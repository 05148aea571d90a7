//! Recorded commands and the bound-state snapshot they capture.
//!
//! Bind calls mutate [`BoundState`] immediately; draws clone the slice of
//! it they consume into a [`DrawSnapshot`] so a later rebind cannot change
//! a draw already recorded. The whole list is replayed into native passes
//! at the end of the frame, then reset.

use super::handle::{
    BufferHandle, DepthStencilStateHandle, FramebufferHandle, PipelineStateHandle,
    ProgramHandle, RasterizerStateHandle, SamplerHandle, TextureHandle, VertexArrayHandle,
};
use super::types::{
    ClearTarget, PrimitiveTopology, Viewport, MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS,
};

/// A uniform-buffer slot binding. `size: None` binds through to the end of
/// the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UniformBinding {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub size: Option<u64>,
}

/// Everything bind calls set. Persists across draws and frames until
/// rebound or the bound resource is destroyed.
pub(crate) struct BoundState {
    pub program: Option<ProgramHandle>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub framebuffer: Option<FramebufferHandle>,
    pub pipeline_state: Option<PipelineStateHandle>,
    pub rasterizer: Option<RasterizerStateHandle>,
    pub depth_stencil: Option<DepthStencilStateHandle>,
    pub topology: PrimitiveTopology,
    pub viewport: Option<Viewport>,
    pub uniform_buffers: [Option<UniformBinding>; MAX_UNIFORM_SLOTS],
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_SLOTS],
    pub samplers: [Option<SamplerHandle>; MAX_TEXTURE_SLOTS],
}

impl Default for BoundState {
    fn default() -> Self {
        Self {
            program: None,
            vertex_array: None,
            framebuffer: None,
            pipeline_state: None,
            rasterizer: None,
            depth_stencil: None,
            topology: PrimitiveTopology::Triangles,
            viewport: None,
            uniform_buffers: [None; MAX_UNIFORM_SLOTS],
            textures: [None; MAX_TEXTURE_SLOTS],
            samplers: [None; MAX_TEXTURE_SLOTS],
        }
    }
}

impl BoundState {
    /// Capture the state a draw consumes. `None` when no program or no
    /// vertex array is bound; such draws are skipped.
    pub fn snapshot(&self) -> Option<DrawSnapshot> {
        Some(DrawSnapshot {
            program: self.program?,
            vertex_array: self.vertex_array?,
            framebuffer: self.framebuffer,
            rasterizer: self.rasterizer,
            depth_stencil: self.depth_stencil,
            topology: self.topology,
            uniform_buffers: self.uniform_buffers,
            textures: self.textures,
            samplers: self.samplers,
        })
    }

    pub fn unbind_program(&mut self, handle: ProgramHandle) {
        if self.program == Some(handle) {
            self.program = None;
        }
    }

    pub fn unbind_vertex_array(&mut self, handle: VertexArrayHandle) {
        if self.vertex_array == Some(handle) {
            self.vertex_array = None;
        }
    }

    pub fn unbind_framebuffer(&mut self, handle: FramebufferHandle) {
        if self.framebuffer == Some(handle) {
            self.framebuffer = None;
        }
    }

    pub fn unbind_pipeline_state(&mut self, handle: PipelineStateHandle) {
        if self.pipeline_state == Some(handle) {
            self.pipeline_state = None;
        }
    }

    pub fn unbind_rasterizer(&mut self, handle: RasterizerStateHandle) {
        if self.rasterizer == Some(handle) {
            self.rasterizer = None;
        }
    }

    pub fn unbind_depth_stencil(&mut self, handle: DepthStencilStateHandle) {
        if self.depth_stencil == Some(handle) {
            self.depth_stencil = None;
        }
    }

    pub fn unbind_buffer(&mut self, handle: BufferHandle) {
        for slot in &mut self.uniform_buffers {
            if slot.is_some_and(|b| b.buffer == handle) {
                *slot = None;
            }
        }
    }

    pub fn unbind_texture(&mut self, handle: TextureHandle) {
        for slot in &mut self.textures {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }

    pub fn unbind_sampler(&mut self, handle: SamplerHandle) {
        for slot in &mut self.samplers {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }
}

/// The subset of [`BoundState`] one draw consumes, frozen at record time.
#[derive(Debug, Clone)]
pub(crate) struct DrawSnapshot {
    pub program: ProgramHandle,
    pub vertex_array: VertexArrayHandle,
    pub framebuffer: Option<FramebufferHandle>,
    pub rasterizer: Option<RasterizerStateHandle>,
    pub depth_stencil: Option<DepthStencilStateHandle>,
    pub topology: PrimitiveTopology,
    pub uniform_buffers: [Option<UniformBinding>; MAX_UNIFORM_SLOTS],
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_SLOTS],
    pub samplers: [Option<SamplerHandle>; MAX_TEXTURE_SLOTS],
}

pub(crate) enum GfxCommand {
    Clear {
        framebuffer: Option<FramebufferHandle>,
        targets: ClearTarget,
        color: [f32; 4],
    },
    SetViewport(Viewport),
    Draw {
        state: DrawSnapshot,
        first_vertex: u32,
        vertex_count: u32,
    },
    DrawIndexed {
        state: DrawSnapshot,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
}

#[derive(Default)]
pub(crate) struct CommandList {
    commands: Vec<GfxCommand>,
}

impl CommandList {
    pub fn record(&mut self, command: GfxCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[GfxCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Empty the list for the next frame, keeping the allocation.
    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_requires_program_and_vertex_array() {
        let mut state = BoundState::default();
        assert!(state.snapshot().is_none());

        state.program = Some(ProgramHandle(1));
        assert!(state.snapshot().is_none());

        state.vertex_array = Some(VertexArrayHandle(1));
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.program, ProgramHandle(1));
        assert_eq!(snap.framebuffer, None);
    }

    #[test]
    fn snapshot_is_immune_to_later_binds() {
        let mut state = BoundState::default();
        state.program = Some(ProgramHandle(1));
        state.vertex_array = Some(VertexArrayHandle(1));
        state.textures[2] = Some(TextureHandle(7));

        let snap = state.snapshot().unwrap();
        state.textures[2] = Some(TextureHandle(9));

        assert_eq!(snap.textures[2], Some(TextureHandle(7)));
    }

    #[test]
    fn unbind_clears_every_slot_holding_the_handle() {
        let mut state = BoundState::default();
        let binding = UniformBinding {
            buffer: BufferHandle(3),
            offset: 0,
            size: None,
        };
        state.uniform_buffers[0] = Some(binding);
        state.uniform_buffers[5] = Some(binding);
        state.uniform_buffers[1] = Some(UniformBinding {
            buffer: BufferHandle(4),
            offset: 0,
            size: None,
        });

        state.unbind_buffer(BufferHandle(3));
        assert!(state.uniform_buffers[0].is_none());
        assert!(state.uniform_buffers[5].is_none());
        assert!(state.uniform_buffers[1].is_some());
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut list = CommandList::default();
        for _ in 0..16 {
            list.record(GfxCommand::SetViewport(Viewport::new(4, 4)));
        }
        let cap = list.commands.capacity();
        list.reset();
        assert!(list.is_empty());
        assert_eq!(list.commands.capacity(), cap);
    }
}
