//! The Phong-lit pass for textured models.
//!
//! Besides color and depth this pass also marks every covered pixel in
//! the stencil buffer, which the outline pass relies on.

use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::model::{ModelVertex, Vertex};
use crate::pipelines::{PipelineLayouts, PipelineParams, depth_marking_stencil, mk_render_pipeline};
use crate::shader::Shader;

pub fn mk_phong_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("phong pipeline layout"),
        bind_group_layouts: &[layouts.material, layouts.camera, layouts.light],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("phong.wgsl"), "phong.wgsl")?;
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "phong pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(depth_marking_stencil()),
            vertex_layouts: &[ModelVertex::desc(), InstanceRaw::desc()],
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
        },
    ))
}
