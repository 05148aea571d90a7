//! Vertex input layouts and vertex-array pairings.

use anyhow::{bail, Result};

use super::convert;
use super::handle::{BufferHandle, InputLayoutHandle};
use super::types::InputLayoutDesc;

/// An input layout baked down to native vertex attributes. Shader
/// locations are assigned in element order, starting at zero.
#[derive(Debug)]
pub(crate) struct InputLayoutEntry {
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub stride: u64,
}

impl InputLayoutEntry {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// A vertex buffer, optional index buffer, and the layout describing the
/// vertex stream. Handles are resolved at draw time so that buffers may
/// be destroyed and the array retired independently.
pub(crate) struct VertexArrayEntry {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    pub layout: InputLayoutHandle,
}

pub(crate) fn create_input_layout(desc: &InputLayoutDesc) -> Result<InputLayoutEntry> {
    if desc.elements.is_empty() {
        bail!("input layout has no elements");
    }
    if desc.vertex_stride == 0 {
        bail!("input layout has zero vertex stride");
    }

    let stride = desc.vertex_stride;
    let mut attributes = Vec::with_capacity(desc.elements.len());
    for (index, element) in desc.elements.iter().enumerate() {
        let Some(format) =
            convert::vertex_format(element.ty, element.components, element.normalized)
        else {
            bail!(
                "input layout element {index}: no native format for {:?} x{} (normalized: {})",
                element.ty,
                element.components,
                element.normalized
            );
        };
        let offset = element.offset;
        if offset + format.size() > stride {
            bail!(
                "input layout element {index}: offset {offset} plus {:?} size exceeds stride {stride}",
                format
            );
        }
        attributes.push(wgpu::VertexAttribute {
            format,
            offset,
            shader_location: index as u32,
        });
    }

    Ok(InputLayoutEntry { attributes, stride })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::types::{VertexAttribType, VertexElement};

    #[test]
    fn locations_follow_element_order() {
        let elements = [
            VertexElement {
                ty: VertexAttribType::Float,
                components: 3,
                normalized: false,
                offset: 0,
            },
            VertexElement {
                ty: VertexAttribType::Float,
                components: 2,
                normalized: false,
                offset: 12,
            },
            VertexElement {
                ty: VertexAttribType::UnsignedByte,
                components: 4,
                normalized: true,
                offset: 20,
            },
        ];
        let layout = create_input_layout(&InputLayoutDesc {
            elements: &elements,
            vertex_stride: 24,
        })
        .unwrap();

        assert_eq!(layout.stride, 24);
        let locations: Vec<u32> = layout
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, [0, 1, 2]);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].format, wgpu::VertexFormat::Unorm8x4);
    }

    #[test]
    fn rejects_attribute_past_stride() {
        let elements = [VertexElement {
            ty: VertexAttribType::Float,
            components: 4,
            normalized: false,
            offset: 8,
        }];
        let err = create_input_layout(&InputLayoutDesc {
            elements: &elements,
            vertex_stride: 16,
        })
        .unwrap_err();
        assert!(err.to_string().contains("exceeds stride"));
    }

    #[test]
    fn rejects_unmappable_element() {
        let elements = [VertexElement {
            ty: VertexAttribType::Byte,
            components: 3,
            normalized: true,
            offset: 0,
        }];
        assert!(
            create_input_layout(&InputLayoutDesc {
                elements: &elements,
                vertex_stride: 4,
            })
            .is_err()
        );
    }
}
