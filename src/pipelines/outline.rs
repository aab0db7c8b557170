//! The second half of the stencil outline technique.
//!
//! The lit pass marks every covered pixel in the stencil buffer; this pass
//! redraws the model slightly scaled up, flat-colored, only where the
//! stencil was NOT marked. The visible difference is the silhouette ring.

use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::model::{ModelVertex, Vertex};
use crate::data_structures::texture::Texture;
use crate::pipelines::{PipelineLayouts, PipelineParams, mk_render_pipeline};
use crate::shader::Shader;

fn outline_stencil() -> wgpu::DepthStencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::NotEqual,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op: wgpu::StencilOperation::Keep,
    };
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        // The ring must show through geometry that already wrote depth.
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xFF,
            write_mask: 0x00,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn mk_outline_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("outline pipeline layout"),
        bind_group_layouts: &[layouts.camera, layouts.light],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("outline.wgsl"), "outline.wgsl")?;
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "outline pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(outline_stencil()),
            vertex_layouts: &[ModelVertex::desc(), InstanceRaw::desc()],
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
        },
    ))
}
