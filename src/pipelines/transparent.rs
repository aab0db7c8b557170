//! Alpha-blended pass for translucent sprites.
//!
//! Blending is order-dependent, so the caller sorts instances back to front
//! before writing the instance buffer (see `crate::scene::sorted_back_to_front`).
//! Depth testing stays on but depth writes are off, otherwise the nearest
//! sprite would occlude the ones blended behind it.

use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::model::{ModelVertex, Vertex};
use crate::data_structures::texture::Texture;
use crate::pipelines::{PipelineLayouts, PipelineParams, mk_render_pipeline};
use crate::shader::Shader;

fn transparent_depth() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("transparent pipeline layout"),
        bind_group_layouts: &[layouts.material, layouts.camera, layouts.light],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(
        device,
        include_str!("transparent.wgsl"),
        "transparent.wgsl",
    )?;
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "transparent pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_stencil: Some(transparent_depth()),
            vertex_layouts: &[ModelVertex::desc(), InstanceRaw::desc()],
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Quads must stay visible from both sides.
            cull_mode: None,
        },
    ))
}
