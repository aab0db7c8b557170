//! Cubemap background drawn after the opaque geometry.
//!
//! The depth test is LessEqual against a vertex shader that pins the cube to
//! the far plane (z = w), so the sky only fills pixels nothing else touched.
//! The view matrix arrives with its translation stripped
//! (`CameraUniform::skybox_view_proj`) so the box never moves relative to
//! the viewer.

use wgpu::util::DeviceExt;

use crate::data_structures::model::VertexLayoutBuilder;
use crate::data_structures::texture::Texture;
use crate::pipelines::{PipelineLayouts, PipelineParams, mk_render_pipeline};
use crate::shader::Shader;

/// Unit cube as 36 position-only vertices, wound to face inward.
#[rustfmt::skip]
pub const SKYBOX_VERTICES: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

pub fn mk_skybox_vertex_buffer(device: &wgpu::Device) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("skybox vertex buffer"),
        contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

fn skybox_depth() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: false,
        // The cube sits exactly on the far plane, Less alone would reject it.
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn mk_skybox_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("skybox pipeline layout"),
        bind_group_layouts: &[layouts.camera, layouts.cubemap],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("skybox.wgsl"), "skybox.wgsl")?;
    let builder = VertexLayoutBuilder::new().push(wgpu::VertexFormat::Float32x3);
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "skybox pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(skybox_depth()),
            vertex_layouts: &[builder.layout(wgpu::VertexStepMode::Vertex)],
            topology: wgpu::PrimitiveTopology::TriangleList,
            // The viewer sits inside the cube.
            cull_mode: None,
        },
    ))
}
