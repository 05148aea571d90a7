//! Shader modules and linked programs.
//!
//! A shader is one WGSL module compiled for a single stage. A program links
//! the stages together, merges their reflected bindings into one interface,
//! and owns the bind group layouts plus the pipeline layout derived from it.
//!
//! Binding convention: group 0 holds uniform buffers, one API slot per
//! `@binding` index. Group 1 holds texture/sampler pairs, texture slot `s`
//! at `@binding(2*s)` and its sampler at `@binding(2*s + 1)`.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};

use super::convert;
use super::reflect::{BindingClass, ShaderReflection, reflect_wgsl};
use super::types::{MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS, ShaderStage};

pub(crate) struct ShaderEntry {
    pub module: wgpu::ShaderModule,
    pub stage: ShaderStage,
    pub entry_point: String,
    pub reflection: ShaderReflection,
}

/// Module + entry point pair consumed by pipeline assembly.
#[derive(Clone)]
pub(crate) struct StageRef {
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
}

/// One API-facing slot of the merged program interface.
#[derive(Debug, Clone)]
pub(crate) struct SlotBinding {
    pub slot: u32,
    pub visibility: wgpu::ShaderStages,
    pub name: String,
}

/// Merged binding interface of a linked program.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgramReflection {
    pub uniforms: Vec<SlotBinding>,
    pub textures: Vec<SlotBinding>,
    pub samplers: Vec<SlotBinding>,
}

impl ProgramReflection {
    pub fn uniform_slot(&self, slot: u32) -> Option<&SlotBinding> {
        self.uniforms.iter().find(|b| b.slot == slot)
    }

    pub fn texture_slot(&self, slot: u32) -> Option<&SlotBinding> {
        self.textures.iter().find(|b| b.slot == slot)
    }

    pub fn sampler_slot(&self, slot: u32) -> Option<&SlotBinding> {
        self.samplers.iter().find(|b| b.slot == slot)
    }
}

pub(crate) struct ProgramEntry {
    pub vertex: Option<StageRef>,
    pub fragment: Option<StageRef>,
    pub compute: Option<StageRef>,
    pub reflection: ProgramReflection,
    /// Group layouts indexed by group number; unused groups get empty layouts.
    pub group_layouts: Vec<wgpu::BindGroupLayout>,
    pub pipeline_layout: wgpu::PipelineLayout,
}

/// Compiles WGSL for one stage and reflects its bindings.
///
/// The module is compiled under a validation error scope so a bad source
/// surfaces as an error here rather than a process-level panic later.
pub(crate) fn compile_shader(
    device: &wgpu::Device,
    source: &str,
    stage: ShaderStage,
) -> Result<ShaderEntry> {
    if convert::shader_visibility(stage).is_none() {
        bail!("shader stage {stage:?} is not supported by the native API");
    }

    let reflection = reflect_wgsl(source);
    let entry_point = match stage {
        ShaderStage::Vertex => reflection.vertex_entry.clone(),
        ShaderStage::Fragment => reflection.fragment_entry.clone(),
        ShaderStage::Compute => reflection.compute_entry.clone(),
        _ => None,
    }
    .with_context(|| format!("shader source has no entry point for stage {stage:?}"))?;

    let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: None,
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(error_scope.pop()) {
        bail!("shader compilation failed: {err}");
    }

    Ok(ShaderEntry {
        module,
        stage,
        entry_point,
        reflection,
    })
}

/// Links shader entries into a program: stage mix validation, binding merge,
/// and layout creation.
pub(crate) fn link_program(
    device: &wgpu::Device,
    shaders: &[&ShaderEntry],
) -> Result<ProgramEntry> {
    if shaders.is_empty() {
        bail!("a program needs at least one shader");
    }

    let has_compute = shaders.iter().any(|s| s.stage == ShaderStage::Compute);
    if has_compute && shaders.len() > 1 {
        bail!("a compute shader cannot be combined with other stages");
    }

    let mut vertex = None;
    let mut fragment = None;
    let mut compute = None;
    for shader in shaders {
        let stage_ref = StageRef {
            module: shader.module.clone(),
            entry_point: shader.entry_point.clone(),
        };
        let slot = match shader.stage {
            ShaderStage::Vertex => &mut vertex,
            ShaderStage::Fragment => &mut fragment,
            ShaderStage::Compute => &mut compute,
            other => bail!("shader stage {other:?} is not supported by the native API"),
        };
        if slot.is_some() {
            bail!("duplicate {:?} stage in program", shader.stage);
        }
        *slot = Some(stage_ref);
    }
    if vertex.is_none() && compute.is_none() {
        bail!("a render program needs a vertex stage");
    }

    let stages: Vec<(ShaderStage, &ShaderReflection)> = shaders
        .iter()
        .map(|s| (s.stage, &s.reflection))
        .collect();
    let reflection = merge_reflections(&stages)?;
    let (group_layouts, pipeline_layout) = build_layouts(device, &reflection)?;

    log::debug!(
        "linked program: {} uniform, {} texture, {} sampler slot(s)",
        reflection.uniforms.len(),
        reflection.textures.len(),
        reflection.samplers.len(),
    );

    Ok(ProgramEntry {
        vertex,
        fragment,
        compute,
        reflection,
        group_layouts,
        pipeline_layout,
    })
}

fn merge_reflections(
    stages: &[(ShaderStage, &ShaderReflection)],
) -> Result<ProgramReflection> {
    struct Merged {
        class: BindingClass,
        visibility: wgpu::ShaderStages,
        name: String,
    }

    // BTreeMap keeps slots ordered for stable layout entry order.
    let mut merged: BTreeMap<(u32, u32), Merged> = BTreeMap::new();

    for &(stage, reflection) in stages {
        let visibility = convert::shader_visibility(stage)
            .context("unsupported stage slipped past shader creation")?;

        for decl in &reflection.bindings {
            match decl.class {
                BindingClass::Storage => {
                    bail!("binding '{}' is a storage resource; not bindable here", decl.name)
                }
                BindingClass::Unknown => {
                    bail!("binding '{}' has an unrecognized type", decl.name)
                }
                _ => {}
            }

            match merged.entry((decl.group, decl.binding)) {
                std::collections::btree_map::Entry::Vacant(v) => {
                    v.insert(Merged {
                        class: decl.class,
                        visibility,
                        name: decl.name.clone(),
                    });
                }
                std::collections::btree_map::Entry::Occupied(mut o) => {
                    if o.get().class != decl.class {
                        bail!(
                            "binding {}:{} declared as different resource kinds across stages",
                            decl.group,
                            decl.binding
                        );
                    }
                    o.get_mut().visibility |= visibility;
                }
            }
        }
    }

    let mut reflection = ProgramReflection::default();
    for ((group, binding), m) in merged {
        match group {
            0 => {
                if m.class != BindingClass::Uniform {
                    bail!("group 0 is reserved for uniform buffers ('{}')", m.name);
                }
                if binding as usize >= MAX_UNIFORM_SLOTS {
                    bail!("uniform slot {binding} exceeds the {MAX_UNIFORM_SLOTS}-slot limit");
                }
                reflection.uniforms.push(SlotBinding {
                    slot: binding,
                    visibility: m.visibility,
                    name: m.name,
                });
            }
            1 => {
                let slot = binding / 2;
                if slot as usize >= MAX_TEXTURE_SLOTS {
                    bail!("texture slot {slot} exceeds the {MAX_TEXTURE_SLOTS}-slot limit");
                }
                let even = binding % 2 == 0;
                match (m.class, even) {
                    (BindingClass::Texture, true) => reflection.textures.push(SlotBinding {
                        slot,
                        visibility: m.visibility,
                        name: m.name,
                    }),
                    (BindingClass::Sampler, false) => reflection.samplers.push(SlotBinding {
                        slot,
                        visibility: m.visibility,
                        name: m.name,
                    }),
                    (BindingClass::Texture, false) => bail!(
                        "texture '{}' must sit at an even @binding (textures at 2*slot)",
                        m.name
                    ),
                    (BindingClass::Sampler, true) => bail!(
                        "sampler '{}' must sit at an odd @binding (samplers at 2*slot + 1)",
                        m.name
                    ),
                    _ => bail!("group 1 holds only textures and samplers ('{}')", m.name),
                }
            }
            other => bail!("resource group {other} is outside the understood range (0..=1)"),
        }
    }

    Ok(reflection)
}

fn build_layouts(
    device: &wgpu::Device,
    reflection: &ProgramReflection,
) -> Result<(Vec<wgpu::BindGroupLayout>, wgpu::PipelineLayout)> {
    let mut uniform_entries = Vec::new();
    for u in &reflection.uniforms {
        uniform_entries.push(wgpu::BindGroupLayoutEntry {
            binding: u.slot,
            visibility: u.visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }

    let mut resource_entries = Vec::new();
    for t in &reflection.textures {
        resource_entries.push(wgpu::BindGroupLayoutEntry {
            binding: t.slot * 2,
            visibility: t.visibility,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
    }
    for s in &reflection.samplers {
        resource_entries.push(wgpu::BindGroupLayoutEntry {
            binding: s.slot * 2 + 1,
            visibility: s.visibility,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    let group_count = if resource_entries.is_empty() {
        if uniform_entries.is_empty() { 0 } else { 1 }
    } else {
        2
    };

    let mut group_layouts = Vec::with_capacity(group_count);
    for group in 0..group_count {
        let entries: &[wgpu::BindGroupLayoutEntry] = match group {
            0 => &uniform_entries,
            _ => &resource_entries,
        };
        group_layouts.push(device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries,
            },
        ));
    }

    let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: None,
        bind_group_layouts: &layout_refs,
        immediate_size: 0,
    });

    Ok((group_layouts, pipeline_layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::reflect::BindingDecl;

    fn decl(group: u32, binding: u32, class: BindingClass, name: &str) -> BindingDecl {
        BindingDecl {
            group,
            binding,
            class,
            name: name.to_string(),
        }
    }

    fn reflection(bindings: Vec<BindingDecl>) -> ShaderReflection {
        ShaderReflection {
            bindings,
            ..Default::default()
        }
    }

    #[test]
    fn merge_routes_slots_by_group_and_parity() {
        let vs = reflection(vec![decl(0, 0, BindingClass::Uniform, "scene")]);
        let fs = reflection(vec![
            decl(1, 0, BindingClass::Texture, "albedo_tex"),
            decl(1, 1, BindingClass::Sampler, "albedo_smp"),
            decl(1, 2, BindingClass::Texture, "detail_tex"),
        ]);

        let merged = merge_reflections(&[
            (ShaderStage::Vertex, &vs),
            (ShaderStage::Fragment, &fs),
        ])
        .unwrap();

        assert_eq!(merged.uniforms.len(), 1);
        assert_eq!(merged.uniforms[0].slot, 0);
        assert_eq!(merged.uniforms[0].visibility, wgpu::ShaderStages::VERTEX);

        let tex_slots: Vec<u32> = merged.textures.iter().map(|t| t.slot).collect();
        assert_eq!(tex_slots, vec![0, 1]);
        assert_eq!(merged.samplers.len(), 1);
        assert_eq!(merged.samplers[0].slot, 0);
    }

    #[test]
    fn merge_unions_visibility_for_shared_bindings() {
        let vs = reflection(vec![decl(0, 2, BindingClass::Uniform, "shared")]);
        let fs = reflection(vec![decl(0, 2, BindingClass::Uniform, "shared")]);

        let merged = merge_reflections(&[
            (ShaderStage::Vertex, &vs),
            (ShaderStage::Fragment, &fs),
        ])
        .unwrap();

        assert_eq!(merged.uniforms.len(), 1);
        assert_eq!(
            merged.uniforms[0].visibility,
            wgpu::ShaderStages::VERTEX_FRAGMENT
        );
    }

    #[test]
    fn merge_rejects_class_conflicts() {
        let vs = reflection(vec![decl(0, 0, BindingClass::Uniform, "x")]);
        let fs = reflection(vec![decl(0, 0, BindingClass::Texture, "x")]);

        let err = merge_reflections(&[
            (ShaderStage::Vertex, &vs),
            (ShaderStage::Fragment, &fs),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn merge_rejects_misplaced_resources() {
        // A texture in the uniform group.
        let bad_group = reflection(vec![decl(0, 1, BindingClass::Texture, "t")]);
        assert!(merge_reflections(&[(ShaderStage::Fragment, &bad_group)]).is_err());

        // A sampler at an even binding.
        let bad_parity = reflection(vec![decl(1, 0, BindingClass::Sampler, "s")]);
        assert!(merge_reflections(&[(ShaderStage::Fragment, &bad_parity)]).is_err());

        // A group beyond the understood range.
        let bad_range = reflection(vec![decl(2, 0, BindingClass::Uniform, "u")]);
        assert!(merge_reflections(&[(ShaderStage::Vertex, &bad_range)]).is_err());
    }

    #[test]
    fn merge_rejects_storage_and_slot_overflow() {
        let storage = reflection(vec![decl(0, 0, BindingClass::Storage, "data")]);
        assert!(merge_reflections(&[(ShaderStage::Vertex, &storage)]).is_err());

        let overflow = reflection(vec![decl(
            0,
            MAX_UNIFORM_SLOTS as u32,
            BindingClass::Uniform,
            "u",
        )]);
        assert!(merge_reflections(&[(ShaderStage::Vertex, &overflow)]).is_err());
    }
}
