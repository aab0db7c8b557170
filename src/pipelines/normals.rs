//! Debug visualization that draws every vertex normal as a short yellow line.
//!
//! The line segments are generated on the CPU from the mesh vertices and
//! uploaded once per model, then drawn as a LineList with the same instance
//! buffer as the lit pass so the lines follow the model transform.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::model::{ModelVertex, Vertex, VertexLayoutBuilder};
use crate::pipelines::{PipelineLayouts, PipelineParams, depth_default, mk_render_pipeline};
use crate::shader::Shader;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

/// Two vertices per input vertex: the surface point and the point one
/// `length` along its normal. Zero-length normals produce a degenerate
/// segment rather than a NaN.
pub fn generate_normal_lines(vertices: &[ModelVertex], length: f32) -> Vec<LineVertex> {
    let mut lines = Vec::with_capacity(vertices.len() * 2);
    for vertex in vertices {
        let position = Vector3::from(vertex.position);
        let normal = Vector3::from(vertex.normal);
        let tip = if normal.magnitude2() > 0.0 {
            position + normal.normalize() * length
        } else {
            position
        };
        lines.push(LineVertex {
            position: vertex.position,
        });
        lines.push(LineVertex {
            position: tip.into(),
        });
    }
    lines
}

pub fn mk_normal_line_buffer(device: &wgpu::Device, lines: &[LineVertex]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("normal line buffer"),
        contents: bytemuck::cast_slice(lines),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

pub fn mk_normals_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("normals pipeline layout"),
        bind_group_layouts: &[layouts.camera, layouts.light],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("normals.wgsl"), "normals.wgsl")?;
    let builder = VertexLayoutBuilder::new().push(wgpu::VertexFormat::Float32x3);
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "normals pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(depth_default()),
            vertex_layouts: &[builder.layout(wgpu::VertexStepMode::Vertex), InstanceRaw::desc()],
            topology: wgpu::PrimitiveTopology::LineList,
            cull_mode: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(position: [f32; 3], normal: [f32; 3]) -> ModelVertex {
        ModelVertex {
            position,
            normal,
            tex_coords: [0.0, 0.0],
        }
    }

    #[test]
    fn two_line_vertices_per_mesh_vertex() {
        let vertices = vec![
            vertex([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            vertex([1.0, 2.0, 3.0], [1.0, 0.0, 0.0]),
        ];
        let lines = generate_normal_lines(&vertices, 0.4);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(lines[1].position, [0.0, 0.4, 0.0]);
        assert_eq!(lines[2].position, [1.0, 2.0, 3.0]);
        assert_eq!(lines[3].position, [1.4, 2.0, 3.0]);
    }

    #[test]
    fn unnormalized_normals_still_yield_unit_scaled_tips() {
        let vertices = vec![vertex([0.0, 0.0, 0.0], [0.0, 0.0, 10.0])];
        let lines = generate_normal_lines(&vertices, 0.5);
        assert!((lines[1].position[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_normal_produces_degenerate_segment() {
        let vertices = vec![vertex([2.0, 0.0, 0.0], [0.0, 0.0, 0.0])];
        let lines = generate_normal_lines(&vertices, 0.4);
        assert_eq!(lines[0].position, lines[1].position);
    }
}
