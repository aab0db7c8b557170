//! Window setup and the main event loop.
//!
//! Each redraw applies the accumulated input to the camera, advances the
//! light rig, rewrites the uniforms and sprite ordering, then records two
//! passes: the scene into the off-screen target and the post effect onto
//! the surface.

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::context::Context;
use crate::scene::Scene;

struct AppState {
    ctx: Context,
    scene: Scene,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let scene = Scene::new(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            &ctx.cubemap_layout,
        )?;
        Ok(Self { ctx, scene })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Err(e) = self.ctx.resize(width, height) {
            log::error!("resize to {width}x{height} failed: {e}");
        }
    }

    fn update(&mut self, dt: Duration) {
        let ctx = &mut self.ctx;
        ctx.camera
            .controller
            .update(&mut ctx.camera.camera, &mut ctx.projection, dt);
        ctx.camera
            .uniform
            .update_view_proj(&ctx.camera.camera, &ctx.projection);
        ctx.camera.write(&ctx.queue);

        // The spotlight is a head lamp: it rides on the camera.
        let position = ctx.camera.camera.position();
        let forward = ctx.camera.camera.forward();
        ctx.lights
            .uniform
            .follow_camera(position.into(), forward.into());
        ctx.lights.uniform.orbit_point_lights(dt);
        ctx.lights.write(&ctx.queue);

        self.scene.prepare(&ctx.queue, position);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.ctx.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        self.scene.render(
            &mut encoder,
            &self.ctx.offscreen.color_view,
            self.ctx.depth_view(),
            &self.ctx.pipelines,
            &self.ctx.camera.bind_group,
            &self.ctx.lights.bind_group,
            self.ctx.clear_color,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.ctx.pipelines.post);
            pass.set_bind_group(0, &self.ctx.post_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

pub struct App {
    state: Option<AppState>,
    async_runtime: tokio::runtime::Runtime,
    last_time: Instant,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            state: None,
            async_runtime: tokio::runtime::Runtime::new()?,
            last_time: Instant::now(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes().with_title("lustre");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        match self.async_runtime.block_on(AppState::new(window)) {
            Ok(state) => {
                self.last_time = Instant::now();
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };
                state.ctx.camera.controller.handle_scroll(amount);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    PhysicalKey::Code(KeyCode::KeyO) => {
                        state.scene.outline_enabled = !state.scene.outline_enabled;
                    }
                    PhysicalKey::Code(KeyCode::KeyN) => {
                        state.scene.normals_enabled = !state.scene.normals_enabled;
                    }
                    PhysicalKey::Code(KeyCode::KeyP) => {
                        state.scene.effect = state.scene.effect.cycle();
                        state.ctx.set_post_effect(state.scene.effect);
                    }
                    _ => (),
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.update(dt);
                match state.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("unable to render: {e}");
                    }
                }
                state.ctx.window.request_redraw();
            }
            _ => (),
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: could not initialize logger: {e}");
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
