//! GPU context: device, surface and the shared per-frame resources.

use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::camera::{self, CameraResources, Projection};
use crate::offscreen::OffscreenTarget;
use crate::pipelines::light::LightResources;
use crate::pipelines::post::{self, PostEffect};
use crate::pipelines::{PipelineLayouts, PipelineSet};
use crate::resources::texture::{cubemap_bind_group_layout, material_bind_group_layout};

pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lights: LightResources,
    pub pipelines: PipelineSet,
    pub material_layout: wgpu::BindGroupLayout,
    pub cubemap_layout: wgpu::BindGroupLayout,
    pub offscreen: OffscreenTarget,
    pub post_layout: wgpu::BindGroupLayout,
    pub post_effect_buffer: wgpu::Buffer,
    pub post_bind_group: wgpu::BindGroup,
    pub clear_color: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an sRGB surface; a linear one would wash the
        // colors out.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Three units back from the origin, looking down -z at the scene.
        let camera = camera::Camera::new((0.0, 0.0, 3.0), cgmath::Deg(0.0), cgmath::Deg(0.0));
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 100.0);
        let controller = camera::CameraController::new(2.5, 0.4);
        let mut camera = CameraResources::new(&device, camera, controller);
        camera.uniform.update_view_proj(&camera.camera, &projection);
        camera.write(&queue);

        let lights = LightResources::new(&device);

        let material_layout = material_bind_group_layout(&device);
        let cubemap_layout = cubemap_bind_group_layout(&device);
        let post_layout = post::mk_bind_group_layout(&device);

        let pipelines = PipelineSet::new(
            &device,
            &config,
            &PipelineLayouts {
                material: &material_layout,
                camera: &camera.bind_group_layout,
                light: &lights.bind_group_layout,
                cubemap: &cubemap_layout,
                post: &post_layout,
            },
        )?;

        let offscreen = OffscreenTarget::new(&device, &config)?;
        let post_effect_buffer = post::mk_effect_buffer(&device, PostEffect::None);
        let post_bind_group = post::mk_bind_group(
            &device,
            &post_layout,
            &offscreen.color_view,
            &offscreen.sampler,
            &post_effect_buffer,
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            lights,
            pipelines,
            material_layout,
            cubemap_layout,
            offscreen,
            post_layout,
            post_effect_buffer,
            post_bind_group,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
        })
    }

    /// Reconfigure the surface and rebuild everything tied to its extent.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.offscreen.resize(&self.device, &self.config)?;
        // The post pass samples the offscreen color view, which was just
        // replaced.
        self.post_bind_group = post::mk_bind_group(
            &self.device,
            &self.post_layout,
            &self.offscreen.color_view,
            &self.offscreen.sampler,
            &self.post_effect_buffer,
        );
        Ok(())
    }

    pub fn set_post_effect(&self, effect: PostEffect) {
        self.queue.write_buffer(
            &self.post_effect_buffer,
            0,
            bytemuck::cast_slice(&effect.as_uniform()),
        );
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.offscreen.depth.view
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
