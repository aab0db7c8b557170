//! Off-screen render target for the main scene pass.
//!
//! The scene is drawn into this color plus depth/stencil pair, then the post
//! pass samples the color attachment onto the surface. Both textures are
//! recreated on resize so they always match the surface extent.

use anyhow::{Result, bail};

use crate::data_structures::texture::Texture;

pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub depth: Texture,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            bail!(
                "offscreen target needs a non-zero extent, got {}x{}",
                config.width,
                config.height
            );
        }
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen color texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("offscreen color sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let depth = Texture::create_depth_texture(
            device,
            [config.width, config.height],
            "offscreen depth texture",
        );
        Ok(Self {
            color,
            color_view,
            sampler,
            depth,
            width: config.width,
            height: config.height,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Result<()> {
        *self = Self::new(device, config)?;
        Ok(())
    }
}
