//! Rasterizer, depth-stencil, and pipeline state objects.
//!
//! Rasterizer state is resolved to native values at creation. Depth-stencil
//! state keeps its description and is lowered once the depth attachment
//! format is known, at pipeline assembly.

use anyhow::{bail, Result};

use super::convert;
use super::handle::{DepthStencilStateHandle, RasterizerStateHandle};
use super::types::{DepthStencilDesc, PrimitiveTopology, RasterizerDesc};

pub(crate) struct RasterizerStateEntry {
    pub cull: Option<wgpu::Face>,
    pub polygon_mode: wgpu::PolygonMode,
    pub front_face: wgpu::FrontFace,
}

pub(crate) fn create_rasterizer_state(
    desc: &RasterizerDesc,
    device_features: wgpu::Features,
) -> Result<RasterizerStateEntry> {
    let Some(cull) = convert::cull_mode(desc.cull_mode) else {
        bail!("cull mode {:?} is not supported", desc.cull_mode);
    };

    let polygon_mode = match convert::fill_mode(desc.fill_mode) {
        wgpu::PolygonMode::Line
            if !device_features.contains(wgpu::Features::POLYGON_MODE_LINE) =>
        {
            log::warn!("wireframe fill unsupported on this adapter; using solid fill");
            wgpu::PolygonMode::Fill
        }
        mode => mode,
    };

    let front_face = if desc.front_ccw {
        wgpu::FrontFace::Ccw
    } else {
        wgpu::FrontFace::Cw
    };

    Ok(RasterizerStateEntry {
        cull,
        polygon_mode,
        front_face,
    })
}

pub(crate) struct DepthStencilStateEntry {
    pub desc: DepthStencilDesc,
}

impl DepthStencilStateEntry {
    /// Lower to the native state against a concrete depth attachment.
    ///
    /// A disabled depth test also disables writes; the draw bypasses the
    /// depth buffer entirely.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        let d = &self.desc;
        let (depth_compare, depth_write_enabled) = if d.depth_test {
            (convert::compare_func(d.depth_func), d.depth_write)
        } else {
            (wgpu::CompareFunction::Always, false)
        };

        let stencil = if d.stencil_test {
            wgpu::StencilState {
                front: face_state(&d.front),
                back: face_state(&d.back),
                read_mask: d.stencil_read_mask,
                write_mask: d.stencil_write_mask,
            }
        } else {
            wgpu::StencilState::default()
        };

        wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil,
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

fn face_state(face: &super::types::StencilFaceDesc) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: convert::compare_func(face.func),
        fail_op: convert::stencil_op(face.fail_op),
        depth_fail_op: convert::stencil_op(face.depth_fail_op),
        pass_op: convert::stencil_op(face.pass_op),
    }
}

/// A pipeline state object bundles rasterizer state, depth-stencil state,
/// and the primitive topology. The two state objects are owned: they are
/// created alongside the pipeline state and retired with it.
pub(crate) struct PipelineStateEntry {
    pub rasterizer: RasterizerStateHandle,
    pub depth_stencil: DepthStencilStateHandle,
    pub topology: PrimitiveTopology,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::types::{CompareFunc, CullMode, FillMode, StencilFaceDesc, StencilOp};

    #[test]
    fn rasterizer_rejects_front_and_back_cull() {
        let desc = RasterizerDesc {
            cull_mode: CullMode::FrontAndBack,
            ..Default::default()
        };
        assert!(create_rasterizer_state(&desc, wgpu::Features::empty()).is_err());
    }

    #[test]
    fn wireframe_degrades_without_feature() {
        let desc = RasterizerDesc {
            fill_mode: FillMode::Wireframe,
            ..Default::default()
        };
        let entry = create_rasterizer_state(&desc, wgpu::Features::empty()).unwrap();
        assert_eq!(entry.polygon_mode, wgpu::PolygonMode::Fill);

        let entry =
            create_rasterizer_state(&desc, wgpu::Features::POLYGON_MODE_LINE).unwrap();
        assert_eq!(entry.polygon_mode, wgpu::PolygonMode::Line);
    }

    #[test]
    fn disabled_depth_test_masks_writes() {
        let entry = DepthStencilStateEntry {
            desc: DepthStencilDesc {
                depth_test: false,
                depth_write: true,
                ..Default::default()
            },
        };
        let state = entry.to_wgpu(wgpu::TextureFormat::Depth24PlusStencil8);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
        assert!(!state.depth_write_enabled);
    }

    #[test]
    fn stencil_faces_map_through_tables() {
        let entry = DepthStencilStateEntry {
            desc: DepthStencilDesc {
                stencil_test: true,
                stencil_read_mask: 0x0f,
                stencil_write_mask: 0xf0,
                front: StencilFaceDesc {
                    func: CompareFunc::Equal,
                    fail_op: StencilOp::Keep,
                    depth_fail_op: StencilOp::IncrSat,
                    pass_op: StencilOp::Replace,
                },
                ..Default::default()
            },
        };
        let state = entry.to_wgpu(wgpu::TextureFormat::Depth24PlusStencil8);
        assert_eq!(state.stencil.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(
            state.stencil.front.depth_fail_op,
            wgpu::StencilOperation::IncrementClamp
        );
        assert_eq!(state.stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.stencil.read_mask, 0x0f);
        assert_eq!(state.stencil.write_mask, 0xf0);
    }
}
