//! Final screen pass: the offscreen color target is stretched over the
//! surface with a fullscreen triangle and run through a selectable effect.

use wgpu::util::DeviceExt;

use crate::pipelines::{PipelineLayouts, PipelineParams, mk_render_pipeline};
use crate::shader::Shader;

/// Effect selector, written to a uniform as `u32`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PostEffect {
    #[default]
    None = 0,
    Invert = 1,
    Grayscale = 2,
    Sharpen = 3,
}

impl PostEffect {
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Invert,
            Self::Invert => Self::Grayscale,
            Self::Grayscale => Self::Sharpen,
            Self::Sharpen => Self::None,
        }
    }

    pub fn as_uniform(self) -> [u32; 4] {
        // Padded to 16 bytes for uniform buffer alignment.
        [self as u32, 0, 0, 0]
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("post bind group layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

pub fn mk_effect_buffer(device: &wgpu::Device, effect: PostEffect) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("post effect buffer"),
        contents: bytemuck::cast_slice(&effect.as_uniform()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Rebuilt whenever the offscreen target is recreated on resize.
pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    color_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    effect_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("post bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(color_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: effect_buffer.as_entire_binding(),
            },
        ],
    })
}

pub fn mk_post_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("post pipeline layout"),
        bind_group_layouts: &[layouts.post],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("post.wgsl"), "post.wgsl")?;
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "post pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: None,
            vertex_layouts: &[],
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_effect_and_wraps() {
        let mut effect = PostEffect::None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            effect = effect.cycle();
            seen.push(effect);
        }
        assert_eq!(
            seen,
            vec![
                PostEffect::Invert,
                PostEffect::Grayscale,
                PostEffect::Sharpen,
                PostEffect::None,
            ]
        );
    }

    #[test]
    fn uniform_encoding_matches_discriminants() {
        assert_eq!(PostEffect::None.as_uniform()[0], 0);
        assert_eq!(PostEffect::Invert.as_uniform()[0], 1);
        assert_eq!(PostEffect::Grayscale.as_uniform()[0], 2);
        assert_eq!(PostEffect::Sharpen.as_uniform()[0], 3);
    }
}
