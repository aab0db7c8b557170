//! Render pipeline definitions, one module per pass.
//!
//! - `phong` is the Blinn-Phong lit pass for textured models
//! - `light` holds the light rig uniform plus the emissive marker pass
//! - `outline` is the second half of the stencil outline technique
//! - `transparent` is the alpha-blended pass for sorted sprites
//! - `skybox` draws the cubemap background with a relaxed depth test
//! - `normals` visualizes vertex normals as line segments
//! - `post` resolves the off-screen color target through a screen effect

use anyhow::Result;

use crate::data_structures::texture::Texture;
use crate::shader::Shader;

pub mod light;
pub mod normals;
pub mod outline;
pub mod phong;
pub mod post;
pub mod skybox;
pub mod transparent;

/// Everything that varies between the passes of this renderer.
pub struct PipelineParams<'a> {
    pub label: &'a str,
    pub layout: &'a wgpu::PipelineLayout,
    pub color_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    shader: &Shader,
    params: PipelineParams,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(params.label),
        layout: Some(params.layout),
        vertex: wgpu::VertexState {
            module: &shader.module,
            entry_point: Some("vs_main"),
            buffers: params.vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader.module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: params.color_format,
                blend: params.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: params.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: params.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: params.depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Depth testing with writes enabled and the stencil left alone.
pub fn depth_default() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Depth testing that also marks covered pixels in the stencil buffer.
///
/// Used by the lit pass so the outline pass can later draw only where the
/// model did not.
pub fn depth_marking_stencil() -> wgpu::DepthStencilState {
    let face = wgpu::StencilFaceState {
        compare: wgpu::CompareFunction::Always,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Replace,
        pass_op: wgpu::StencilOperation::Replace,
    };
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xFF,
            write_mask: 0xFF,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

/// The collection of pipelines built once at context creation.
///
/// Bind group layouts are created once and shared between the pipelines,
/// which is what makes the per-draw binds cheap lookups rather than
/// per-frame layout resolution.
pub struct PipelineSet {
    pub phong: wgpu::RenderPipeline,
    pub light: wgpu::RenderPipeline,
    pub outline: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
    pub normals: wgpu::RenderPipeline,
    pub post: wgpu::RenderPipeline,
}

pub struct PipelineLayouts<'a> {
    pub material: &'a wgpu::BindGroupLayout,
    pub camera: &'a wgpu::BindGroupLayout,
    pub light: &'a wgpu::BindGroupLayout,
    pub cubemap: &'a wgpu::BindGroupLayout,
    pub post: &'a wgpu::BindGroupLayout,
}

impl PipelineSet {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        layouts: &PipelineLayouts,
    ) -> Result<Self> {
        Ok(Self {
            phong: phong::mk_phong_pipeline(device, config, layouts)?,
            light: light::mk_light_pipeline(device, config, layouts)?,
            outline: outline::mk_outline_pipeline(device, config, layouts)?,
            transparent: transparent::mk_transparent_pipeline(device, config, layouts)?,
            skybox: skybox::mk_skybox_pipeline(device, config, layouts)?,
            normals: normals::mk_normals_pipeline(device, config, layouts)?,
            post: post::mk_post_pipeline(device, config, layouts)?,
        })
    }
}
