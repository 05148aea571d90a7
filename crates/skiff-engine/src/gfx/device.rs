//! The render device facade.
//!
//! `RenderDevice` owns every resource registry, the bound state, the
//! recorded command list, and the pipeline/bind-group caches. Creation and
//! destruction talk to the native device immediately; binds mutate
//! [`BoundState`]; draws and clears record commands that are replayed into
//! native passes when the frame ends (see `replay`).
//!
//! Destruction retires entries to a frame-garbage list instead of dropping
//! them, so draws recorded before the destroy still resolve during replay.
//! The garbage drops after the frame's submit.

use anyhow::{bail, Result};

use super::buffer::{self, BufferEntry, BufferKind};
use super::commands::{BoundState, CommandList, GfxCommand, UniformBinding};
use super::framebuffer::{self, AttachmentInfo, FramebufferEntry, MAX_COLOR_TARGETS};
use super::handle::{
    BufferHandle, DepthStencilStateHandle, FramebufferHandle, InputLayoutHandle,
    PipelineStateHandle, ProgramHandle, RasterizerStateHandle, SamplerHandle, ShaderHandle,
    TextureHandle, VertexArrayHandle,
};
use super::layout::{self, InputLayoutEntry, VertexArrayEntry};
use super::pipeline::PipelineCaches;
use super::registry::ResourceTable;
use super::sampler::{self, SamplerEntry};
use super::shader::{self, ProgramEntry, ShaderEntry};
use super::state::{self, DepthStencilStateEntry, PipelineStateEntry, RasterizerStateEntry};
use super::texture::{self, TextureEntry};
use super::types::{
    BufferDesc, ClearTarget, DepthStencilDesc, FramebufferDesc, IndexBufferDesc,
    InputLayoutDesc, PipelineStateDesc, PrimitiveTopology, RasterizerDesc, SamplerDesc,
    ShaderStage, TextureDesc, VertexArrayDesc, Viewport, MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS,
};

pub struct RenderDevice {
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
    pub(super) features: wgpu::Features,
    limits: wgpu::Limits,
    pub(super) surface_format: wgpu::TextureFormat,
    /// `None` when the runtime was configured without a default depth buffer.
    pub(super) surface_depth_format: Option<wgpu::TextureFormat>,

    pub(super) shaders: ResourceTable<ShaderEntry>,
    pub(super) programs: ResourceTable<ProgramEntry>,
    pub(super) buffers: ResourceTable<BufferEntry>,
    pub(super) layouts: ResourceTable<InputLayoutEntry>,
    pub(super) vertex_arrays: ResourceTable<VertexArrayEntry>,
    pub(super) textures: ResourceTable<TextureEntry>,
    pub(super) samplers: ResourceTable<SamplerEntry>,
    pub(super) rasterizers: ResourceTable<RasterizerStateEntry>,
    pub(super) depth_stencils: ResourceTable<DepthStencilStateEntry>,
    pub(super) pipeline_states: ResourceTable<PipelineStateEntry>,
    pub(super) framebuffers: ResourceTable<FramebufferEntry>,

    pub(super) bound: BoundState,
    pub(super) commands: CommandList,
    pub(super) caches: PipelineCaches,
    /// Viewport in effect when the command list was last reset; replay
    /// seeds its tracking from it so the value persists across frames.
    pub(super) frame_start_viewport: Option<Viewport>,

    pub(super) default_rasterizer: RasterizerStateEntry,
    pub(super) default_depth_stencil: DepthStencilStateEntry,
    pub(super) fallback_texture: TextureEntry,
    pub(super) fallback_sampler: SamplerEntry,
}

impl RenderDevice {
    pub(crate) fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        surface_depth_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self> {
        let features = device.features();
        let limits = device.limits();
        let fallback_texture = texture::create_fallback_texture(&device, &queue);
        let fallback_sampler = sampler::create_fallback_sampler(&device);
        let default_rasterizer =
            state::create_rasterizer_state(&RasterizerDesc::default(), features)?;
        let default_depth_stencil = DepthStencilStateEntry {
            desc: DepthStencilDesc::default(),
        };

        log::debug!(
            "render device ready (surface {surface_format:?}, depth {surface_depth_format:?})"
        );

        Ok(Self {
            device,
            queue,
            features,
            limits,
            surface_format,
            surface_depth_format,
            shaders: ResourceTable::new(),
            programs: ResourceTable::new(),
            buffers: ResourceTable::new(),
            layouts: ResourceTable::new(),
            vertex_arrays: ResourceTable::new(),
            textures: ResourceTable::new(),
            samplers: ResourceTable::new(),
            rasterizers: ResourceTable::new(),
            depth_stencils: ResourceTable::new(),
            pipeline_states: ResourceTable::new(),
            framebuffers: ResourceTable::new(),
            bound: BoundState::default(),
            commands: CommandList::default(),
            caches: PipelineCaches::default(),
            frame_start_viewport: None,
            default_rasterizer,
            default_depth_stencil,
            fallback_texture,
            fallback_sampler,
        })
    }

    /// Required alignment for offsets passed to `bind_uniform_buffer_range`.
    pub fn uniform_buffer_alignment(&self) -> u64 {
        u64::from(self.limits.min_uniform_buffer_offset_alignment)
    }

    // ---- shaders and programs ----

    pub fn create_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderHandle> {
        let entry = shader::compile_shader(&self.device, source, stage)?;
        Ok(ShaderHandle(self.shaders.insert(entry)))
    }

    pub fn destroy_shader(&mut self, handle: ShaderHandle) {
        if !self.shaders.retire(handle.raw()) {
            log::warn!("destroy_shader: unknown handle {}", handle.raw());
        }
    }

    /// Link shaders into a program. The shaders may be destroyed afterwards;
    /// the program keeps its own references to the compiled modules.
    pub fn create_shader_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle> {
        let mut entries: Vec<&ShaderEntry> = Vec::with_capacity(shaders.len());
        for handle in shaders {
            match self.shaders.get(handle.raw()) {
                Some(entry) => entries.push(entry),
                None => bail!("create_shader_program: unknown shader handle {}", handle.raw()),
            }
        }
        let program = shader::link_program(&self.device, &entries)?;
        Ok(ProgramHandle(self.programs.insert(program)))
    }

    pub fn destroy_shader_program(&mut self, handle: ProgramHandle) {
        if self.programs.retire(handle.raw()) {
            self.caches.evict_program(handle.raw());
            self.bound.unbind_program(handle);
        } else {
            log::warn!("destroy_shader_program: unknown handle {}", handle.raw());
        }
    }

    // ---- buffers ----

    pub fn create_vertex_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle> {
        let entry = buffer::create_buffer(&self.device, desc, BufferKind::Vertex, None)?;
        Ok(BufferHandle(self.buffers.insert(entry)))
    }

    pub fn create_index_buffer(&mut self, desc: &IndexBufferDesc) -> Result<BufferHandle> {
        let entry =
            buffer::create_buffer(&self.device, &desc.buffer, BufferKind::Index, Some(desc.format))?;
        Ok(BufferHandle(self.buffers.insert(entry)))
    }

    pub fn create_uniform_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle> {
        let entry = buffer::create_buffer(&self.device, desc, BufferKind::Uniform, None)?;
        Ok(BufferHandle(self.buffers.insert(entry)))
    }

    pub fn destroy_vertex_buffer(&mut self, handle: BufferHandle) {
        self.destroy_buffer(handle, "destroy_vertex_buffer");
    }

    pub fn destroy_index_buffer(&mut self, handle: BufferHandle) {
        self.destroy_buffer(handle, "destroy_index_buffer");
    }

    pub fn destroy_uniform_buffer(&mut self, handle: BufferHandle) {
        self.destroy_buffer(handle, "destroy_uniform_buffer");
    }

    fn destroy_buffer(&mut self, handle: BufferHandle, op: &str) {
        if self.buffers.retire(handle.raw()) {
            self.caches.evict_buffer(handle.raw());
            self.bound.unbind_buffer(handle);
        } else {
            log::warn!("{op}: unknown handle {}", handle.raw());
        }
    }

    /// Overwrite `data.len()` bytes at `offset`. The buffer must be
    /// `Dynamic` or `Stream`; offset and length keep the native 4-byte
    /// copy alignment.
    pub fn update_buffer(&mut self, handle: BufferHandle, offset: u64, data: &[u8]) -> Result<()> {
        let Some(entry) = self.buffers.get(handle.raw()) else {
            bail!("update_buffer: unknown handle {}", handle.raw());
        };
        buffer::update_buffer(&self.queue, entry, offset, data)
    }

    // ---- input layouts and vertex arrays ----

    pub fn create_input_layout(&mut self, desc: &InputLayoutDesc) -> Result<InputLayoutHandle> {
        let entry = layout::create_input_layout(desc)?;
        Ok(InputLayoutHandle(self.layouts.insert(entry)))
    }

    pub fn destroy_input_layout(&mut self, handle: InputLayoutHandle) {
        if self.layouts.retire(handle.raw()) {
            self.caches.evict_layout(handle.raw());
        } else {
            log::warn!("destroy_input_layout: unknown handle {}", handle.raw());
        }
    }

    pub fn create_vertex_array(&mut self, desc: &VertexArrayDesc) -> Result<VertexArrayHandle> {
        let Some(vertex) = self.buffers.get(desc.vertex_buffer.raw()) else {
            bail!("create_vertex_array: unknown vertex buffer {}", desc.vertex_buffer.raw());
        };
        if vertex.kind != BufferKind::Vertex {
            bail!(
                "create_vertex_array: buffer {} is a {:?} buffer, not a vertex buffer",
                desc.vertex_buffer.raw(),
                vertex.kind
            );
        }
        if let Some(index) = desc.index_buffer {
            let Some(entry) = self.buffers.get(index.raw()) else {
                bail!("create_vertex_array: unknown index buffer {}", index.raw());
            };
            if entry.kind != BufferKind::Index {
                bail!(
                    "create_vertex_array: buffer {} is a {:?} buffer, not an index buffer",
                    index.raw(),
                    entry.kind
                );
            }
        }
        if !self.layouts.contains(desc.layout.raw()) {
            bail!("create_vertex_array: unknown input layout {}", desc.layout.raw());
        }

        let entry = VertexArrayEntry {
            vertex_buffer: desc.vertex_buffer,
            index_buffer: desc.index_buffer,
            layout: desc.layout,
        };
        Ok(VertexArrayHandle(self.vertex_arrays.insert(entry)))
    }

    pub fn destroy_vertex_array(&mut self, handle: VertexArrayHandle) {
        if self.vertex_arrays.retire(handle.raw()) {
            self.bound.unbind_vertex_array(handle);
        } else {
            log::warn!("destroy_vertex_array: unknown handle {}", handle.raw());
        }
    }

    // ---- textures and samplers ----

    pub fn create_texture_2d(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        let entry = texture::create_texture_2d(&self.device, &self.queue, desc, self.features)?;
        Ok(TextureHandle(self.textures.insert(entry)))
    }

    pub fn destroy_texture_2d(&mut self, handle: TextureHandle) {
        if self.textures.retire(handle.raw()) {
            self.caches.evict_texture(handle.raw());
            self.bound.unbind_texture(handle);
        } else {
            log::warn!("destroy_texture_2d: unknown handle {}", handle.raw());
        }
    }

    pub fn create_sampler_state(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        let entry = sampler::create_sampler(&self.device, desc, self.features)?;
        Ok(SamplerHandle(self.samplers.insert(entry)))
    }

    pub fn destroy_sampler_state(&mut self, handle: SamplerHandle) {
        if self.samplers.retire(handle.raw()) {
            self.caches.evict_sampler(handle.raw());
            self.bound.unbind_sampler(handle);
        } else {
            log::warn!("destroy_sampler_state: unknown handle {}", handle.raw());
        }
    }

    // ---- framebuffers ----

    pub fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        let entry = framebuffer::create_framebuffer(desc)?;
        if entry.has_any_attachment() {
            self.validate_framebuffer(&entry)?;
        }
        Ok(FramebufferHandle(self.framebuffers.insert(entry)))
    }

    pub fn destroy_framebuffer(&mut self, handle: FramebufferHandle) {
        // Attachments are caller-owned textures and are left alone.
        if self.framebuffers.retire(handle.raw()) {
            self.bound.unbind_framebuffer(handle);
        } else {
            log::warn!("destroy_framebuffer: unknown handle {}", handle.raw());
        }
    }

    pub fn attach_render_target(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
        slot: u32,
    ) -> Result<()> {
        if slot as usize >= MAX_COLOR_TARGETS {
            bail!("attach_render_target: slot {slot} out of range (max {MAX_COLOR_TARGETS})");
        }
        let Some(tex) = self.textures.get(texture.raw()) else {
            bail!("attach_render_target: unknown texture {}", texture.raw());
        };
        if !tex.render_target {
            bail!(
                "attach_render_target: texture {} was not created as a render target",
                texture.raw()
            );
        }
        let Some(entry) = self.framebuffers.get_mut(framebuffer.raw()) else {
            bail!("attach_render_target: unknown framebuffer {}", framebuffer.raw());
        };
        entry.color_targets[slot as usize] = Some(texture);

        self.revalidate_framebuffer(framebuffer);
        Ok(())
    }

    pub fn attach_depth_stencil_target(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<()> {
        let Some(tex) = self.textures.get(texture.raw()) else {
            bail!("attach_depth_stencil_target: unknown texture {}", texture.raw());
        };
        if !tex.is_depth() {
            bail!(
                "attach_depth_stencil_target: texture {} has color format {:?}",
                texture.raw(),
                tex.format
            );
        }
        let Some(entry) = self.framebuffers.get_mut(framebuffer.raw()) else {
            bail!("attach_depth_stencil_target: unknown framebuffer {}", framebuffer.raw());
        };
        entry.depth_target = Some(texture);

        self.revalidate_framebuffer(framebuffer);
        Ok(())
    }

    /// Completeness check against the live texture tables.
    fn validate_framebuffer(&self, entry: &FramebufferEntry) -> Result<()> {
        let mut colors = Vec::new();
        for handle in entry.color_targets.iter().flatten() {
            let Some(tex) = self.textures.get(handle.raw()) else {
                bail!("framebuffer references destroyed texture {}", handle.raw());
            };
            if !tex.render_target {
                bail!(
                    "framebuffer color target {} was not created as a render target",
                    handle.raw()
                );
            }
            colors.push(AttachmentInfo {
                format: tex.format,
                width: tex.width,
                height: tex.height,
            });
        }
        let depth = match entry.depth_target {
            Some(handle) => {
                let Some(tex) = self.textures.get(handle.raw()) else {
                    bail!("framebuffer references destroyed texture {}", handle.raw());
                };
                Some(AttachmentInfo {
                    format: tex.format,
                    width: tex.width,
                    height: tex.height,
                })
            }
            None => None,
        };
        framebuffer::validate_attachments(&colors, depth.as_ref())
    }

    /// Attachment sets are allowed to pass through incomplete shapes while
    /// being built up; incompleteness is logged here and enforced at draw.
    fn revalidate_framebuffer(&self, handle: FramebufferHandle) {
        if let Some(entry) = self.framebuffers.get(handle.raw()) {
            if let Err(err) = self.validate_framebuffer(entry) {
                log::warn!("framebuffer {} is incomplete: {err:#}", handle.raw());
            }
        }
    }

    // ---- state objects ----

    pub fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerDesc,
    ) -> Result<RasterizerStateHandle> {
        let entry = state::create_rasterizer_state(desc, self.features)?;
        Ok(RasterizerStateHandle(self.rasterizers.insert(entry)))
    }

    pub fn destroy_rasterizer_state(&mut self, handle: RasterizerStateHandle) {
        if self.rasterizers.retire(handle.raw()) {
            self.caches.evict_state(handle.raw());
            self.bound.unbind_rasterizer(handle);
        } else {
            log::warn!("destroy_rasterizer_state: unknown handle {}", handle.raw());
        }
    }

    pub fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilDesc,
    ) -> Result<DepthStencilStateHandle> {
        let entry = DepthStencilStateEntry { desc: *desc };
        Ok(DepthStencilStateHandle(self.depth_stencils.insert(entry)))
    }

    pub fn destroy_depth_stencil_state(&mut self, handle: DepthStencilStateHandle) {
        if self.depth_stencils.retire(handle.raw()) {
            self.caches.evict_state(handle.raw());
            self.bound.unbind_depth_stencil(handle);
        } else {
            log::warn!("destroy_depth_stencil_state: unknown handle {}", handle.raw());
        }
    }

    /// Create the rasterizer and depth-stencil states described inline and
    /// bundle them with the topology under one handle.
    pub fn create_pipeline_state(
        &mut self,
        desc: &PipelineStateDesc,
    ) -> Result<PipelineStateHandle> {
        let rasterizer = self.create_rasterizer_state(&desc.rasterizer)?;
        let depth_stencil = self.create_depth_stencil_state(&desc.depth_stencil)?;
        let entry = PipelineStateEntry {
            rasterizer,
            depth_stencil,
            topology: desc.topology,
        };
        Ok(PipelineStateHandle(self.pipeline_states.insert(entry)))
    }

    /// Destroys the contained rasterizer and depth-stencil states as well.
    pub fn destroy_pipeline_state(&mut self, handle: PipelineStateHandle) {
        let Some(entry) = self.pipeline_states.get(handle.raw()) else {
            log::warn!("destroy_pipeline_state: unknown handle {}", handle.raw());
            return;
        };
        let rasterizer = entry.rasterizer;
        let depth_stencil = entry.depth_stencil;

        self.pipeline_states.retire(handle.raw());
        self.bound.unbind_pipeline_state(handle);
        self.destroy_rasterizer_state(rasterizer);
        self.destroy_depth_stencil_state(depth_stencil);
    }

    // ---- binds ----
    //
    // Binding an invalid handle warns and leaves the previous binding.

    pub fn bind_shader_program(&mut self, handle: ProgramHandle) {
        if self.programs.contains(handle.raw()) {
            self.bound.program = Some(handle);
        } else {
            log::warn!("bind_shader_program: unknown handle {}", handle.raw());
        }
    }

    pub fn bind_vertex_array(&mut self, handle: VertexArrayHandle) {
        if self.vertex_arrays.contains(handle.raw()) {
            self.bound.vertex_array = Some(handle);
        } else {
            log::warn!("bind_vertex_array: unknown handle {}", handle.raw());
        }
    }

    /// `None` targets the window surface.
    pub fn bind_framebuffer(&mut self, handle: Option<FramebufferHandle>) {
        match handle {
            None => self.bound.framebuffer = None,
            Some(h) if self.framebuffers.contains(h.raw()) => {
                self.bound.framebuffer = Some(h);
            }
            Some(h) => log::warn!("bind_framebuffer: unknown handle {}", h.raw()),
        }
    }

    pub fn bind_texture(&mut self, slot: u32, handle: TextureHandle) {
        if slot as usize >= MAX_TEXTURE_SLOTS {
            log::warn!("bind_texture: slot {slot} out of range");
            return;
        }
        if !self.textures.contains(handle.raw()) {
            log::warn!("bind_texture: unknown handle {}", handle.raw());
            return;
        }
        self.bound.textures[slot as usize] = Some(handle);
    }

    pub fn bind_sampler_state(&mut self, slot: u32, handle: SamplerHandle) {
        if slot as usize >= MAX_TEXTURE_SLOTS {
            log::warn!("bind_sampler_state: slot {slot} out of range");
            return;
        }
        if !self.samplers.contains(handle.raw()) {
            log::warn!("bind_sampler_state: unknown handle {}", handle.raw());
            return;
        }
        self.bound.samplers[slot as usize] = Some(handle);
    }

    pub fn bind_uniform_buffer(&mut self, slot: u32, handle: BufferHandle) {
        self.bind_uniform_range(slot, handle, 0, None, "bind_uniform_buffer");
    }

    /// Bind `size` bytes starting at `offset`. The offset must be a multiple
    /// of [`Self::uniform_buffer_alignment`].
    pub fn bind_uniform_buffer_range(
        &mut self,
        slot: u32,
        handle: BufferHandle,
        offset: u64,
        size: u64,
    ) {
        if size == 0 {
            log::warn!("bind_uniform_buffer_range: zero size");
            return;
        }
        self.bind_uniform_range(slot, handle, offset, Some(size), "bind_uniform_buffer_range");
    }

    fn bind_uniform_range(
        &mut self,
        slot: u32,
        handle: BufferHandle,
        offset: u64,
        size: Option<u64>,
        op: &str,
    ) {
        if slot as usize >= MAX_UNIFORM_SLOTS {
            log::warn!("{op}: slot {slot} out of range");
            return;
        }
        let Some(entry) = self.buffers.get(handle.raw()) else {
            log::warn!("{op}: unknown handle {}", handle.raw());
            return;
        };
        if entry.kind != BufferKind::Uniform {
            log::warn!("{op}: buffer {} is a {:?} buffer", handle.raw(), entry.kind);
            return;
        }
        if offset % self.uniform_buffer_alignment() != 0 {
            log::warn!(
                "{op}: offset {offset} not aligned to {}",
                self.uniform_buffer_alignment()
            );
            return;
        }
        match size {
            Some(size) if offset + size > entry.size => {
                log::warn!(
                    "{op}: range ends at {}, buffer size is {}",
                    offset + size,
                    entry.size
                );
                return;
            }
            None if offset >= entry.size => {
                log::warn!("{op}: offset {offset} is past the end of the buffer");
                return;
            }
            _ => {}
        }
        self.bound.uniform_buffers[slot as usize] = Some(UniformBinding {
            buffer: handle,
            offset,
            size,
        });
    }

    pub fn bind_rasterizer_state(&mut self, handle: RasterizerStateHandle) {
        if self.rasterizers.contains(handle.raw()) {
            self.bound.rasterizer = Some(handle);
        } else {
            log::warn!("bind_rasterizer_state: unknown handle {}", handle.raw());
        }
    }

    pub fn bind_depth_stencil_state(&mut self, handle: DepthStencilStateHandle) {
        if self.depth_stencils.contains(handle.raw()) {
            self.bound.depth_stencil = Some(handle);
        } else {
            log::warn!("bind_depth_stencil_state: unknown handle {}", handle.raw());
        }
    }

    /// Expands to the three contained binds.
    pub fn bind_pipeline_state(&mut self, handle: PipelineStateHandle) {
        let Some(entry) = self.pipeline_states.get(handle.raw()) else {
            log::warn!("bind_pipeline_state: unknown handle {}", handle.raw());
            return;
        };
        let rasterizer = entry.rasterizer;
        let depth_stencil = entry.depth_stencil;
        let topology = entry.topology;

        self.bound.pipeline_state = Some(handle);
        self.bound.rasterizer = Some(rasterizer);
        self.bound.depth_stencil = Some(depth_stencil);
        self.bound.topology = topology;
    }

    // ---- recorded operations ----

    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.bound.topology = topology;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.bound.viewport = Some(viewport);
        self.commands.record(GfxCommand::SetViewport(viewport));
    }

    /// Clear the currently bound framebuffer (or the surface). The depth
    /// buffer clears to 1.0 and the stencil buffer to 0.
    pub fn clear(&mut self, targets: ClearTarget, color: [f32; 4]) {
        if targets.is_empty() {
            return;
        }
        self.commands.record(GfxCommand::Clear {
            framebuffer: self.bound.framebuffer,
            targets,
            color,
        });
    }

    pub fn draw(&mut self, first_vertex: u32, vertex_count: u32) {
        let Some(state) = self.bound.snapshot() else {
            log::warn!("draw: no program or no vertex array bound; skipping");
            return;
        };
        self.commands.record(GfxCommand::Draw {
            state,
            first_vertex,
            vertex_count,
        });
    }

    pub fn draw_indexed(&mut self, index_count: u32) {
        self.draw_indexed_base_vertex(index_count, 0, 0);
    }

    pub fn draw_indexed_base_vertex(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    ) {
        let Some(state) = self.bound.snapshot() else {
            log::warn!("draw_indexed: no program or no vertex array bound; skipping");
            return;
        };
        let has_index_buffer = self
            .vertex_arrays
            .get(state.vertex_array.raw())
            .is_some_and(|va| va.index_buffer.is_some());
        if !has_index_buffer {
            log::warn!("draw_indexed: bound vertex array has no index buffer; skipping");
            return;
        }
        self.commands.record(GfxCommand::DrawIndexed {
            state,
            index_count,
            first_index,
            base_vertex,
        });
    }

    // ---- frame lifecycle (driven by the runtime) ----

    pub(crate) fn begin_frame(&mut self) {
        self.commands.reset();
        self.frame_start_viewport = self.bound.viewport;
    }

    /// Runs after the frame's submit; frame garbage is safe to drop.
    pub(crate) fn end_frame(&mut self) {
        // Replay may have rebuilt cache entries for resources destroyed
        // earlier in the frame. Those keys can never be produced again, so
        // drop them together with the retired entries.
        for id in self.programs.retired_ids() {
            self.caches.evict_program(id);
        }
        for id in self.layouts.retired_ids() {
            self.caches.evict_layout(id);
        }
        for id in self.rasterizers.retired_ids() {
            self.caches.evict_state(id);
        }
        for id in self.depth_stencils.retired_ids() {
            self.caches.evict_state(id);
        }
        for id in self.buffers.retired_ids() {
            self.caches.evict_buffer(id);
        }
        for id in self.textures.retired_ids() {
            self.caches.evict_texture(id);
        }
        for id in self.samplers.retired_ids() {
            self.caches.evict_sampler(id);
        }

        self.shaders.purge();
        self.programs.purge();
        self.buffers.purge();
        self.layouts.purge();
        self.vertex_arrays.purge();
        self.textures.purge();
        self.samplers.purge();
        self.rasterizers.purge();
        self.depth_stencils.purge();
        self.pipeline_states.purge();
        self.framebuffers.purge();
    }
}
