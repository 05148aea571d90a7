//! Frame replay: recorded commands become native render passes.
//!
//! The command list is walked in order and cut into pass segments. A draw
//! whose snapshot targets a different framebuffer than the open pass closes
//! it; a clear always closes it. A clear folds into the next segment's load
//! ops when that segment renders to the same framebuffer, otherwise it runs
//! as a small standalone pass. Anything that no longer resolves at replay
//! time (destroyed resources, incomplete framebuffers, missing bindings) is
//! skipped with a warning; a bad draw never fails the frame.

use anyhow::{Context, Result, bail};

use super::buffer::BufferEntry;
use super::commands::{DrawSnapshot, GfxCommand};
use super::convert;
use super::device::RenderDevice;
use super::framebuffer::{self, AttachmentInfo, FramebufferEntry};
use super::handle::{BufferHandle, FramebufferHandle};
use super::layout::{InputLayoutEntry, VertexArrayEntry};
use super::pipeline::{
    self, BindGroupKey, BindGroupKeyEntry, DEFAULT_STATE_ID, PipelineCaches, PipelineKey,
    PipelineTargets,
};
use super::registry::ResourceTable;
use super::sampler::SamplerEntry;
use super::shader::ProgramEntry;
use super::state::{DepthStencilStateEntry, RasterizerStateEntry};
use super::texture::TextureEntry;
use super::types::{ClearTarget, IndexFormat, Viewport};

/// Id used in bind-group keys for the device's built-in fallback texture
/// and sampler. Table ids start at 1, so 0 never collides.
const FALLBACK_ID: u32 = 0;

/// The window surface plus the engine-owned depth buffer; what draws with
/// no framebuffer bound render into.
pub(crate) struct DefaultFramebuffer<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: Option<&'a wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
}

impl RenderDevice {
    /// Replays the frame's recorded commands into `encoder`.
    ///
    /// Runs between the app's frame callback and the queue submit.
    pub(crate) fn replay(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface: &DefaultFramebuffer<'_>,
    ) {
        let segments = build_segments(self.commands.commands(), self.frame_start_viewport);
        if segments.is_empty() {
            return;
        }

        let tables = ReplayTables {
            device: &self.device,
            programs: &self.programs,
            buffers: &self.buffers,
            layouts: &self.layouts,
            vertex_arrays: &self.vertex_arrays,
            textures: &self.textures,
            samplers: &self.samplers,
            rasterizers: &self.rasterizers,
            depth_stencils: &self.depth_stencils,
            default_rasterizer: &self.default_rasterizer,
            default_depth_stencil: &self.default_depth_stencil,
            fallback_texture: &self.fallback_texture,
            fallback_sampler: &self.fallback_sampler,
        };

        for segment in &segments {
            let targets = match resolve_targets(
                segment.framebuffer,
                &self.framebuffers,
                tables.textures,
                surface,
                self.surface_format,
                self.surface_depth_format,
            ) {
                Ok(targets) => targets,
                Err(err) => {
                    log::warn!("render pass skipped: {err:#}");
                    continue;
                }
            };

            let mut pass = begin_pass(encoder, &targets, segment.clear);
            if let Some(viewport) = segment.viewport {
                apply_viewport(&mut pass, viewport, targets.width, targets.height);
            }

            let mut track = BindTracker::default();
            for item in &segment.items {
                match item {
                    SegmentItem::Viewport(viewport) => {
                        apply_viewport(&mut pass, *viewport, targets.width, targets.height);
                    }
                    SegmentItem::Draw { state, call } => {
                        if let Err(err) = encode_draw(
                            &mut pass,
                            &tables,
                            &mut self.caches,
                            state,
                            *call,
                            &targets,
                            &mut track,
                        ) {
                            log::warn!("draw skipped: {err:#}");
                        }
                    }
                }
            }
        }
    }
}

// ---- pass segmentation ----

/// A recorded clear waiting for the pass it will fold into.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingClear {
    framebuffer: Option<FramebufferHandle>,
    targets: ClearTarget,
    color: [f32; 4],
}

impl PendingClear {
    /// Back-to-back clears of one target collapse; the later color wins.
    fn merge(&mut self, targets: ClearTarget, color: [f32; 4]) {
        self.targets |= targets;
        if targets.contains(ClearTarget::COLOR) {
            self.color = color;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DrawCall {
    Arrays {
        first_vertex: u32,
        vertex_count: u32,
    },
    Indexed {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
}

enum SegmentItem<'c> {
    Viewport(Viewport),
    Draw {
        state: &'c DrawSnapshot,
        call: DrawCall,
    },
}

/// One native render pass worth of commands.
struct Segment<'c> {
    framebuffer: Option<FramebufferHandle>,
    clear: Option<(ClearTarget, [f32; 4])>,
    /// Viewport in effect when the pass opens; re-applied on every break.
    viewport: Option<Viewport>,
    items: Vec<SegmentItem<'c>>,
}

impl Segment<'_> {
    fn clear_only(clear: PendingClear) -> Self {
        Self {
            framebuffer: clear.framebuffer,
            clear: Some((clear.targets, clear.color)),
            viewport: None,
            items: Vec::new(),
        }
    }

    #[cfg(test)]
    fn draw_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, SegmentItem::Draw { .. }))
            .count()
    }
}

/// Cuts the command stream into pass segments.
fn build_segments<'c>(
    commands: &'c [GfxCommand],
    start_viewport: Option<Viewport>,
) -> Vec<Segment<'c>> {
    let mut segments = Vec::new();
    let mut viewport = start_viewport;
    let mut pending_clear: Option<PendingClear> = None;
    let mut open: Option<Segment<'c>> = None;

    for command in commands {
        match command {
            GfxCommand::SetViewport(new_viewport) => {
                viewport = Some(*new_viewport);
                if let Some(segment) = open.as_mut() {
                    segment.items.push(SegmentItem::Viewport(*new_viewport));
                }
            }
            GfxCommand::Clear {
                framebuffer,
                targets,
                color,
            } => {
                if let Some(segment) = open.take() {
                    segments.push(segment);
                }
                match pending_clear.as_mut() {
                    Some(pending) if pending.framebuffer == *framebuffer => {
                        pending.merge(*targets, *color);
                    }
                    _ => {
                        if let Some(previous) = pending_clear.take() {
                            segments.push(Segment::clear_only(previous));
                        }
                        pending_clear = Some(PendingClear {
                            framebuffer: *framebuffer,
                            targets: *targets,
                            color: *color,
                        });
                    }
                }
            }
            GfxCommand::Draw {
                state,
                first_vertex,
                vertex_count,
            } => push_draw(
                &mut segments,
                &mut open,
                &mut pending_clear,
                viewport,
                state,
                DrawCall::Arrays {
                    first_vertex: *first_vertex,
                    vertex_count: *vertex_count,
                },
            ),
            GfxCommand::DrawIndexed {
                state,
                index_count,
                first_index,
                base_vertex,
            } => push_draw(
                &mut segments,
                &mut open,
                &mut pending_clear,
                viewport,
                state,
                DrawCall::Indexed {
                    index_count: *index_count,
                    first_index: *first_index,
                    base_vertex: *base_vertex,
                },
            ),
        }
    }

    if let Some(segment) = open.take() {
        segments.push(segment);
    }
    // A clear nothing drew after still has to land.
    if let Some(pending) = pending_clear.take() {
        segments.push(Segment::clear_only(pending));
    }
    segments
}

fn push_draw<'c>(
    segments: &mut Vec<Segment<'c>>,
    open: &mut Option<Segment<'c>>,
    pending_clear: &mut Option<PendingClear>,
    viewport: Option<Viewport>,
    state: &'c DrawSnapshot,
    call: DrawCall,
) {
    let same_target = open
        .as_ref()
        .is_some_and(|segment| segment.framebuffer == state.framebuffer);
    if !same_target {
        if let Some(segment) = open.take() {
            segments.push(segment);
        }
        let clear = match pending_clear.take() {
            Some(pending) if pending.framebuffer == state.framebuffer => {
                Some((pending.targets, pending.color))
            }
            Some(pending) => {
                segments.push(Segment::clear_only(pending));
                None
            }
            None => None,
        };
        *open = Some(Segment {
            framebuffer: state.framebuffer,
            clear,
            viewport,
            items: Vec::new(),
        });
    }
    if let Some(segment) = open.as_mut() {
        segment.items.push(SegmentItem::Draw { state, call });
    }
}

// ---- target resolution ----

/// Attachment views and formats a segment renders into.
struct ResolvedTargets<'a> {
    color_views: Vec<&'a wgpu::TextureView>,
    color_formats: Vec<wgpu::TextureFormat>,
    depth_view: Option<&'a wgpu::TextureView>,
    depth_format: Option<wgpu::TextureFormat>,
    width: u32,
    height: u32,
}

fn has_stencil(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Stencil8
            | wgpu::TextureFormat::Depth24PlusStencil8
            | wgpu::TextureFormat::Depth32FloatStencil8
    )
}

/// Resolves a segment's framebuffer, re-checking completeness against
/// whatever the attachments are now. `None` targets the default framebuffer.
fn resolve_targets<'a>(
    framebuffer: Option<FramebufferHandle>,
    framebuffers: &'a ResourceTable<FramebufferEntry>,
    textures: &'a ResourceTable<TextureEntry>,
    surface: &DefaultFramebuffer<'a>,
    surface_format: wgpu::TextureFormat,
    surface_depth_format: Option<wgpu::TextureFormat>,
) -> Result<ResolvedTargets<'a>> {
    let Some(handle) = framebuffer else {
        return Ok(ResolvedTargets {
            color_views: vec![surface.color],
            color_formats: vec![surface_format],
            depth_view: surface.depth,
            depth_format: surface_depth_format,
            width: surface.width,
            height: surface.height,
        });
    };

    let Some(entry) = framebuffers.resolve(handle.raw()) else {
        bail!("framebuffer {} no longer exists", handle.raw());
    };

    let mut color_views = Vec::new();
    let mut color_formats = Vec::new();
    let mut color_infos = Vec::new();
    for target in entry.color_targets.iter().flatten() {
        let Some(texture) = textures.resolve(target.raw()) else {
            bail!(
                "framebuffer {} color attachment {} no longer exists",
                handle.raw(),
                target.raw()
            );
        };
        color_views.push(&texture.view);
        color_formats.push(texture.wgpu_format);
        color_infos.push(AttachmentInfo {
            format: texture.format,
            width: texture.width,
            height: texture.height,
        });
    }

    let mut depth_view = None;
    let mut depth_format = None;
    let mut depth_info = None;
    if let Some(target) = entry.depth_target {
        let Some(texture) = textures.resolve(target.raw()) else {
            bail!(
                "framebuffer {} depth attachment {} no longer exists",
                handle.raw(),
                target.raw()
            );
        };
        depth_view = Some(&texture.view);
        depth_format = Some(texture.wgpu_format);
        depth_info = Some(AttachmentInfo {
            format: texture.format,
            width: texture.width,
            height: texture.height,
        });
    }

    framebuffer::validate_attachments(&color_infos, depth_info.as_ref())
        .with_context(|| format!("framebuffer {} is incomplete", handle.raw()))?;

    let (width, height) = color_infos
        .first()
        .or(depth_info.as_ref())
        .map(|info| (info.width, info.height))
        .context("framebuffer has no attachments")?;

    Ok(ResolvedTargets {
        color_views,
        color_formats,
        depth_view,
        depth_format,
        width,
        height,
    })
}

// ---- pass encoding ----

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    targets: &ResolvedTargets<'_>,
    clear: Option<(ClearTarget, [f32; 4])>,
) -> wgpu::RenderPass<'e> {
    let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = targets
        .color_views
        .iter()
        .map(|&view| {
            let load = match clear {
                Some((flags, color)) if flags.contains(ClearTarget::COLOR) => {
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(color[0]),
                        g: f64::from(color[1]),
                        b: f64::from(color[2]),
                        a: f64::from(color[3]),
                    })
                }
                _ => wgpu::LoadOp::Load,
            };
            Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })
        })
        .collect();

    let depth_stencil_attachment = targets.depth_view.map(|view| {
        let depth_load = match clear {
            Some((flags, _)) if flags.contains(ClearTarget::DEPTH) => wgpu::LoadOp::Clear(1.0),
            _ => wgpu::LoadOp::Load,
        };
        let stencil_ops = targets
            .depth_format
            .is_some_and(has_stencil)
            .then(|| {
                let load = match clear {
                    Some((flags, _)) if flags.contains(ClearTarget::STENCIL) => {
                        wgpu::LoadOp::Clear(0)
                    }
                    _ => wgpu::LoadOp::Load,
                };
                wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                }
            });
        wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops,
        }
    });

    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: None,
        color_attachments: &color_attachments,
        depth_stencil_attachment,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

/// Clamped to the target so a stale viewport never trips native validation.
fn apply_viewport(pass: &mut wgpu::RenderPass<'_>, viewport: Viewport, width: u32, height: u32) {
    let x = viewport.x.min(width);
    let y = viewport.y.min(height);
    let w = viewport.width.min(width - x);
    let h = viewport.height.min(height - y);
    if w == 0 || h == 0 {
        return;
    }
    pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
}

// ---- draw encoding ----

/// Immutable device state threaded through draw encoding.
struct ReplayTables<'d> {
    device: &'d wgpu::Device,
    programs: &'d ResourceTable<ProgramEntry>,
    buffers: &'d ResourceTable<BufferEntry>,
    layouts: &'d ResourceTable<InputLayoutEntry>,
    vertex_arrays: &'d ResourceTable<VertexArrayEntry>,
    textures: &'d ResourceTable<TextureEntry>,
    samplers: &'d ResourceTable<SamplerEntry>,
    rasterizers: &'d ResourceTable<RasterizerStateEntry>,
    depth_stencils: &'d ResourceTable<DepthStencilStateEntry>,
    default_rasterizer: &'d RasterizerStateEntry,
    default_depth_stencil: &'d DepthStencilStateEntry,
    fallback_texture: &'d TextureEntry,
    fallback_sampler: &'d SamplerEntry,
}

/// Redundant-set elimination within one pass.
#[derive(Default)]
struct BindTracker {
    pipeline: Option<PipelineKey>,
    groups: [Option<BindGroupKey>; 2],
    vertex_buffer: Option<BufferHandle>,
    index: Option<(BufferHandle, IndexFormat)>,
}

fn encode_draw(
    pass: &mut wgpu::RenderPass<'_>,
    tables: &ReplayTables<'_>,
    caches: &mut PipelineCaches,
    state: &DrawSnapshot,
    call: DrawCall,
    targets: &ResolvedTargets<'_>,
    track: &mut BindTracker,
) -> Result<()> {
    let Some(vertex_array) = tables.vertex_arrays.resolve(state.vertex_array.raw()) else {
        bail!("vertex array {} no longer exists", state.vertex_array.raw());
    };
    let Some(program) = tables.programs.resolve(state.program.raw()) else {
        bail!("program {} no longer exists", state.program.raw());
    };
    let Some(layout) = tables.layouts.resolve(vertex_array.layout.raw()) else {
        bail!("input layout {} no longer exists", vertex_array.layout.raw());
    };
    let Some(vertex_buffer) = tables.buffers.resolve(vertex_array.vertex_buffer.raw()) else {
        bail!(
            "vertex buffer {} no longer exists",
            vertex_array.vertex_buffer.raw()
        );
    };

    let index = match vertex_array.index_buffer {
        Some(handle) => {
            let Some(entry) = tables.buffers.resolve(handle.raw()) else {
                bail!("index buffer {} no longer exists", handle.raw());
            };
            let Some(format) = entry.index_format else {
                bail!("buffer {} was not created as an index buffer", handle.raw());
            };
            Some((handle, entry, format))
        }
        None => None,
    };

    let (rasterizer_id, rasterizer) = match state.rasterizer {
        Some(handle) => match tables.rasterizers.resolve(handle.raw()) {
            Some(entry) => (handle.raw(), entry),
            None => bail!("rasterizer state {} no longer exists", handle.raw()),
        },
        None => (DEFAULT_STATE_ID, tables.default_rasterizer),
    };
    let (depth_stencil_id, depth_stencil) = match state.depth_stencil {
        Some(handle) => match tables.depth_stencils.resolve(handle.raw()) {
            Some(entry) => (handle.raw(), entry),
            None => bail!("depth-stencil state {} no longer exists", handle.raw()),
        },
        None => (DEFAULT_STATE_ID, tables.default_depth_stencil),
    };

    let strip_index = if state.topology.is_strip() {
        index.as_ref().map(|(_, _, format)| *format)
    } else {
        None
    };

    let key = PipelineKey {
        program: state.program.raw(),
        layout: vertex_array.layout.raw(),
        rasterizer: rasterizer_id,
        depth_stencil: depth_stencil_id,
        topology: state.topology,
        strip_index,
        color_formats: targets.color_formats.clone(),
        depth_format: targets.depth_format,
        sample_count: 1,
    };
    if track.pipeline.as_ref() != Some(&key) {
        if caches.pipeline(&key).is_none() {
            let pipeline_targets = PipelineTargets {
                color_formats: key.color_formats.clone(),
                depth_format: key.depth_format,
                sample_count: key.sample_count,
            };
            let built = pipeline::build_render_pipeline(
                tables.device,
                program,
                layout,
                rasterizer,
                depth_stencil,
                state.topology,
                strip_index,
                &pipeline_targets,
            )?;
            caches.insert_pipeline(key.clone(), built);
        }
        let Some(pipeline) = caches.pipeline(&key) else {
            bail!("pipeline missing from the cache after insert");
        };
        pass.set_pipeline(pipeline);
        track.pipeline = Some(key);
        // A pipeline swap may change group layouts; force group rebinds.
        track.groups = [None, None];
    }

    for group in 0..program.group_layouts.len() {
        let group_key = build_group_key(state, program, group as u32)?;
        if track.groups[group].as_ref() == Some(&group_key) {
            continue;
        }
        if caches.bind_group(&group_key).is_none() {
            let built = create_bind_group(tables, program, state, group)?;
            caches.insert_bind_group(group_key.clone(), built);
        }
        let Some(bind_group) = caches.bind_group(&group_key) else {
            bail!("bind group missing from the cache after insert");
        };
        pass.set_bind_group(group as u32, bind_group, &[]);
        track.groups[group] = Some(group_key);
    }

    if track.vertex_buffer != Some(vertex_array.vertex_buffer) {
        pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(..));
        track.vertex_buffer = Some(vertex_array.vertex_buffer);
    }

    match call {
        DrawCall::Arrays {
            first_vertex,
            vertex_count,
        } => {
            pass.draw(first_vertex..first_vertex + vertex_count, 0..1);
        }
        DrawCall::Indexed {
            index_count,
            first_index,
            base_vertex,
        } => {
            let Some((handle, entry, format)) = index else {
                bail!("indexed draw but the vertex array has no index buffer");
            };
            if track.index != Some((handle, format)) {
                pass.set_index_buffer(entry.buffer.slice(..), convert::index_format(format));
                track.index = Some((handle, format));
            }
            pass.draw_indexed(first_index..first_index + index_count, base_vertex, 0..1);
        }
    }

    Ok(())
}

/// The cache key for one bind group of one draw. Group 0 carries uniform
/// buffer ranges; group 1 carries texture/sampler pairs with the fallback
/// id standing in for unbound slots.
fn build_group_key(
    state: &DrawSnapshot,
    program: &ProgramEntry,
    group: u32,
) -> Result<BindGroupKey> {
    let mut entries = Vec::new();
    if group == 0 {
        for binding in &program.reflection.uniforms {
            let Some(bound) = state.uniform_buffers[binding.slot as usize] else {
                bail!(
                    "program wants a uniform buffer in slot {} ('{}') but none is bound",
                    binding.slot,
                    binding.name
                );
            };
            entries.push(BindGroupKeyEntry::UniformBuffer {
                binding: binding.slot,
                buffer: bound.buffer.raw(),
                offset: bound.offset,
                size: bound.size,
            });
        }
    } else {
        for binding in &program.reflection.textures {
            let texture = state.textures[binding.slot as usize]
                .map_or(FALLBACK_ID, |handle| handle.raw());
            entries.push(BindGroupKeyEntry::Texture {
                binding: binding.slot * 2,
                texture,
            });
        }
        for binding in &program.reflection.samplers {
            let sampler = state.samplers[binding.slot as usize]
                .map_or(FALLBACK_ID, |handle| handle.raw());
            entries.push(BindGroupKeyEntry::Sampler {
                binding: binding.slot * 2 + 1,
                sampler,
            });
        }
    }
    Ok(BindGroupKey {
        program: state.program.raw(),
        group,
        entries,
    })
}

fn create_bind_group(
    tables: &ReplayTables<'_>,
    program: &ProgramEntry,
    state: &DrawSnapshot,
    group: usize,
) -> Result<wgpu::BindGroup> {
    let mut entries: Vec<wgpu::BindGroupEntry> = Vec::new();
    if group == 0 {
        for binding in &program.reflection.uniforms {
            let Some(bound) = state.uniform_buffers[binding.slot as usize] else {
                bail!(
                    "program wants a uniform buffer in slot {} ('{}') but none is bound",
                    binding.slot,
                    binding.name
                );
            };
            let Some(entry) = tables.buffers.resolve(bound.buffer.raw()) else {
                bail!("uniform buffer {} no longer exists", bound.buffer.raw());
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding.slot,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &entry.buffer,
                    offset: bound.offset,
                    size: bound.size.and_then(wgpu::BufferSize::new),
                }),
            });
        }
    } else {
        for binding in &program.reflection.textures {
            let texture = match state.textures[binding.slot as usize] {
                Some(handle) => {
                    let Some(entry) = tables.textures.resolve(handle.raw()) else {
                        bail!("texture {} no longer exists", handle.raw());
                    };
                    if entry.is_depth() {
                        bail!("texture {} is a depth texture and cannot be sampled", handle.raw());
                    }
                    entry
                }
                None => {
                    log::debug!(
                        "texture slot {} ('{}') is unbound; sampling the fallback",
                        binding.slot,
                        binding.name
                    );
                    tables.fallback_texture
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding.slot * 2,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        for binding in &program.reflection.samplers {
            let sampler = match state.samplers[binding.slot as usize] {
                Some(handle) => match tables.samplers.resolve(handle.raw()) {
                    Some(entry) => entry,
                    None => bail!("sampler {} no longer exists", handle.raw()),
                },
                None => {
                    log::debug!(
                        "sampler slot {} ('{}') is unbound; using the fallback",
                        binding.slot,
                        binding.name
                    );
                    tables.fallback_sampler
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding.slot * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&sampler.sampler),
            });
        }
    }

    Ok(tables.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout: &program.group_layouts[group],
        entries: &entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::handle::{ProgramHandle, VertexArrayHandle};
    use crate::gfx::types::{MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS, PrimitiveTopology};

    fn snapshot(framebuffer: Option<FramebufferHandle>) -> DrawSnapshot {
        DrawSnapshot {
            program: ProgramHandle(1),
            vertex_array: VertexArrayHandle(1),
            framebuffer,
            rasterizer: None,
            depth_stencil: None,
            topology: PrimitiveTopology::Triangles,
            uniform_buffers: [None; MAX_UNIFORM_SLOTS],
            textures: [None; MAX_TEXTURE_SLOTS],
            samplers: [None; MAX_TEXTURE_SLOTS],
        }
    }

    fn draw(framebuffer: Option<FramebufferHandle>) -> GfxCommand {
        GfxCommand::Draw {
            state: snapshot(framebuffer),
            first_vertex: 0,
            vertex_count: 3,
        }
    }

    fn clear(
        framebuffer: Option<FramebufferHandle>,
        targets: ClearTarget,
        color: [f32; 4],
    ) -> GfxCommand {
        GfxCommand::Clear {
            framebuffer,
            targets,
            color,
        }
    }

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    #[test]
    fn draws_to_one_target_share_a_pass() {
        let fb = FramebufferHandle(7);
        let commands = vec![draw(None), draw(None), draw(Some(fb)), draw(None)];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].framebuffer, None);
        assert_eq!(segments[0].draw_count(), 2);
        assert_eq!(segments[1].framebuffer, Some(fb));
        assert_eq!(segments[1].draw_count(), 1);
        assert_eq!(segments[2].framebuffer, None);
    }

    #[test]
    fn clear_folds_into_the_next_pass_on_the_same_target() {
        let commands = vec![clear(None, ClearTarget::ALL, RED), draw(None)];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].clear, Some((ClearTarget::ALL, RED)));
        assert_eq!(segments[0].draw_count(), 1);
    }

    #[test]
    fn clear_for_another_target_runs_standalone() {
        let fb = FramebufferHandle(3);
        let commands = vec![clear(Some(fb), ClearTarget::COLOR, RED), draw(None)];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].framebuffer, Some(fb));
        assert_eq!(segments[0].clear, Some((ClearTarget::COLOR, RED)));
        assert_eq!(segments[0].draw_count(), 0);
        assert_eq!(segments[1].framebuffer, None);
        assert_eq!(segments[1].clear, None);
    }

    #[test]
    fn trailing_clear_gets_its_own_pass() {
        let commands = vec![draw(None), clear(None, ClearTarget::DEPTH, RED)];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].draw_count(), 1);
        assert_eq!(segments[0].clear, None);
        assert_eq!(segments[1].clear, Some((ClearTarget::DEPTH, RED)));
        assert_eq!(segments[1].draw_count(), 0);
    }

    #[test]
    fn clear_closes_the_open_pass() {
        let commands = vec![draw(None), clear(None, ClearTarget::COLOR, RED), draw(None)];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].clear, None);
        assert_eq!(segments[1].clear, Some((ClearTarget::COLOR, RED)));
        assert_eq!(segments[1].draw_count(), 1);
    }

    #[test]
    fn back_to_back_clears_merge_with_the_later_color_winning() {
        let commands = vec![
            clear(None, ClearTarget::COLOR, RED),
            clear(None, ClearTarget::COLOR | ClearTarget::DEPTH, BLUE),
            draw(None),
        ];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].clear,
            Some((ClearTarget::COLOR | ClearTarget::DEPTH, BLUE))
        );
    }

    #[test]
    fn depth_only_clear_keeps_the_earlier_color() {
        let commands = vec![
            clear(None, ClearTarget::COLOR, RED),
            clear(None, ClearTarget::DEPTH, BLUE),
            draw(None),
        ];
        let segments = build_segments(&commands, None);

        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].clear,
            Some((ClearTarget::COLOR | ClearTarget::DEPTH, RED))
        );
    }

    #[test]
    fn viewport_seeds_the_first_pass_and_carries_across_breaks() {
        let fb = FramebufferHandle(2);
        let seed = Viewport::new(800, 600);
        let mid = Viewport::new(400, 300);
        let commands = vec![draw(None), GfxCommand::SetViewport(mid), draw(Some(fb))];
        let segments = build_segments(&commands, Some(seed));

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].viewport, Some(seed));
        assert!(segments[0]
            .items
            .iter()
            .any(|item| matches!(item, SegmentItem::Viewport(v) if *v == mid)));
        assert_eq!(segments[1].viewport, Some(mid));
    }

    #[test]
    fn empty_command_list_yields_no_segments() {
        assert!(build_segments(&[], Some(Viewport::new(4, 4))).is_empty());
    }
}
