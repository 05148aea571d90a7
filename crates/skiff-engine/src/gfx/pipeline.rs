//! Render-pipeline and bind-group caches.
//!
//! Native pipelines are immutable, so every distinct combination of
//! program, vertex layout, fixed-function state, and target formats needs
//! its own pipeline object. Keys are built from resource ids; ids are
//! never reused, which makes an id a stable stand-in for the object's
//! contents. Entries are evicted when a referenced resource is destroyed.

use std::collections::HashMap;

use anyhow::{bail, Result};

use super::convert;
use super::layout::InputLayoutEntry;
use super::shader::ProgramEntry;
use super::state::{DepthStencilStateEntry, RasterizerStateEntry};
use super::types::{IndexFormat, PrimitiveTopology};

/// Sentinel id for the device's built-in default state objects.
pub(crate) const DEFAULT_STATE_ID: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: u32,
    pub layout: u32,
    pub rasterizer: u32,
    pub depth_stencil: u32,
    pub topology: PrimitiveTopology,
    pub strip_index: Option<IndexFormat>,
    pub color_formats: Vec<wgpu::TextureFormat>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

impl PipelineKey {
    fn references_program(&self, id: u32) -> bool {
        self.program == id
    }

    fn references_layout(&self, id: u32) -> bool {
        self.layout == id
    }

    fn references_state(&self, id: u32) -> bool {
        self.rasterizer == id || self.depth_stencil == id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum BindGroupKeyEntry {
    UniformBuffer {
        binding: u32,
        buffer: u32,
        offset: u64,
        size: Option<u64>,
    },
    Texture {
        binding: u32,
        texture: u32,
    },
    Sampler {
        binding: u32,
        sampler: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BindGroupKey {
    pub program: u32,
    pub group: u32,
    pub entries: Vec<BindGroupKeyEntry>,
}

impl BindGroupKey {
    fn references_program(&self, id: u32) -> bool {
        self.program == id
    }

    fn references_buffer(&self, id: u32) -> bool {
        self.entries.iter().any(|e| {
            matches!(e, BindGroupKeyEntry::UniformBuffer { buffer, .. } if *buffer == id)
        })
    }

    fn references_texture(&self, id: u32) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, BindGroupKeyEntry::Texture { texture, .. } if *texture == id))
    }

    fn references_sampler(&self, id: u32) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, BindGroupKeyEntry::Sampler { sampler, .. } if *sampler == id))
    }
}

/// Both caches, owned by the device. Hits skip native object creation;
/// misses assemble the object and insert it.
#[derive(Default)]
pub(crate) struct PipelineCaches {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bind_groups: HashMap<BindGroupKey, wgpu::BindGroup>,
}

impl PipelineCaches {
    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn insert_pipeline(&mut self, key: PipelineKey, pipeline: wgpu::RenderPipeline) {
        self.pipelines.insert(key, pipeline);
    }

    pub fn bind_group(&self, key: &BindGroupKey) -> Option<&wgpu::BindGroup> {
        self.bind_groups.get(key)
    }

    pub fn insert_bind_group(&mut self, key: BindGroupKey, group: wgpu::BindGroup) {
        self.bind_groups.insert(key, group);
    }

    pub fn evict_program(&mut self, id: u32) {
        self.pipelines.retain(|k, _| !k.references_program(id));
        self.bind_groups.retain(|k, _| !k.references_program(id));
    }

    pub fn evict_layout(&mut self, id: u32) {
        self.pipelines.retain(|k, _| !k.references_layout(id));
    }

    pub fn evict_state(&mut self, id: u32) {
        self.pipelines.retain(|k, _| !k.references_state(id));
    }

    pub fn evict_buffer(&mut self, id: u32) {
        self.bind_groups.retain(|k, _| !k.references_buffer(id));
    }

    pub fn evict_texture(&mut self, id: u32) {
        self.bind_groups.retain(|k, _| !k.references_texture(id));
    }

    pub fn evict_sampler(&mut self, id: u32) {
        self.bind_groups.retain(|k, _| !k.references_sampler(id));
    }
}

/// Target shape a pipeline renders into.
pub(crate) struct PipelineTargets {
    pub color_formats: Vec<wgpu::TextureFormat>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

pub(crate) fn build_render_pipeline(
    device: &wgpu::Device,
    program: &ProgramEntry,
    layout: &InputLayoutEntry,
    rasterizer: &RasterizerStateEntry,
    depth_stencil: &DepthStencilStateEntry,
    topology: PrimitiveTopology,
    strip_index: Option<IndexFormat>,
    targets: &PipelineTargets,
) -> Result<wgpu::RenderPipeline> {
    let Some(vertex) = program.vertex.as_ref() else {
        bail!("program has no vertex stage; cannot draw with it");
    };

    let color_targets: Vec<Option<wgpu::ColorTargetState>> = targets
        .color_formats
        .iter()
        .map(|format| {
            Some(wgpu::ColorTargetState {
                format: *format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();

    let buffers = [layout.buffer_layout()];
    let fragment = program.fragment.as_ref().map(|stage| wgpu::FragmentState {
        module: &stage.module,
        entry_point: Some(&stage.entry_point),
        compilation_options: Default::default(),
        targets: &color_targets,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: None,
        layout: Some(&program.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex.module,
            entry_point: Some(&vertex.entry_point),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        primitive: wgpu::PrimitiveState {
            topology: convert::topology(topology),
            strip_index_format: strip_index.map(convert::index_format),
            front_face: rasterizer.front_face,
            cull_mode: rasterizer.cull,
            unclipped_depth: false,
            polygon_mode: rasterizer.polygon_mode,
            conservative: false,
        },
        depth_stencil: targets
            .depth_format
            .map(|format| depth_stencil.to_wgpu(format)),
        multisample: wgpu::MultisampleState {
            count: targets.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment,
        multiview_mask: None,
        cache: None,
    });

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(program: u32, rasterizer: u32) -> PipelineKey {
        PipelineKey {
            program,
            layout: 1,
            rasterizer,
            depth_stencil: DEFAULT_STATE_ID,
            topology: PrimitiveTopology::Triangles,
            strip_index: None,
            color_formats: vec![wgpu::TextureFormat::Bgra8Unorm],
            depth_format: Some(wgpu::TextureFormat::Depth24PlusStencil8),
            sample_count: 1,
        }
    }

    #[test]
    fn keys_distinguish_state_and_targets() {
        let base = key(1, 2);
        assert_eq!(base, key(1, 2));
        assert_ne!(base, key(1, 3));

        let mut no_depth = key(1, 2);
        no_depth.depth_format = None;
        assert_ne!(base, no_depth);

        let mut strip = key(1, 2);
        strip.topology = PrimitiveTopology::TriangleStrip;
        strip.strip_index = Some(IndexFormat::Uint16);
        assert_ne!(base, strip);
    }

    #[test]
    fn state_eviction_matches_either_state_id() {
        assert!(key(1, 7).references_state(7));
        let mut k = key(1, 2);
        k.depth_stencil = 9;
        assert!(k.references_state(9));
        assert!(!k.references_state(4));
    }

    #[test]
    fn bind_group_key_reference_checks() {
        let k = BindGroupKey {
            program: 3,
            group: 0,
            entries: vec![
                BindGroupKeyEntry::UniformBuffer {
                    binding: 0,
                    buffer: 11,
                    offset: 0,
                    size: None,
                },
                BindGroupKeyEntry::Texture {
                    binding: 2,
                    texture: 5,
                },
                BindGroupKeyEntry::Sampler {
                    binding: 3,
                    sampler: 6,
                },
            ],
        };
        assert!(k.references_program(3));
        assert!(k.references_buffer(11));
        assert!(!k.references_buffer(5));
        assert!(k.references_texture(5));
        assert!(k.references_sampler(6));
        assert!(!k.references_sampler(5));
    }

    #[test]
    fn uniform_range_is_part_of_the_key() {
        let entry = |offset| BindGroupKeyEntry::UniformBuffer {
            binding: 0,
            buffer: 1,
            offset,
            size: Some(256),
        };
        let a = BindGroupKey {
            program: 1,
            group: 0,
            entries: vec![entry(0)],
        };
        let b = BindGroupKey {
            program: 1,
            group: 0,
            entries: vec![entry(256)],
        };
        assert_ne!(a, b);
    }
}
