//! Camera, projection and input controller.
//!
//! The camera is a plain value object: position plus yaw/pitch orientation.
//! Every mutator recomputes the derived forward/up vectors and the view
//! matrix before returning, so the matrices are never stale. Field of view
//! lives on [`Projection`] and is clamped by the controller, not the
//! projection itself.

use cgmath::{
    Deg, Euler, InnerSpace, Matrix4, Point3, Quaternion, Vector3, perspective,
};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pitch is kept strictly inside the poles so the up vector stays defined.
pub const PITCH_LIMIT: Deg<f32> = Deg(89.0);
pub const MIN_FOV: Deg<f32> = Deg(1.0);
pub const MAX_FOV: Deg<f32> = Deg(45.0);

/// cgmath produces OpenGL clip space (z in -1..1); wgpu wants z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Clamp a field of view to the supported zoom range.
pub fn clamp_fov(fov: Deg<f32>) -> Deg<f32> {
    Deg(fov.0.clamp(MIN_FOV.0, MAX_FOV.0))
}

/// First-person camera with eagerly recomputed view matrix.
#[derive(Debug)]
pub struct Camera {
    position: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    forward: Vector3<f32>,
    up: Vector3<f32>,
    view: Matrix4<f32>,
}

impl Camera {
    pub fn new(position: impl Into<Point3<f32>>, yaw: Deg<f32>, pitch: Deg<f32>) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw,
            pitch,
            forward: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            view: Matrix4::from_scale(1.0),
        };
        camera.recalculate_direction();
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.recalculate_direction();
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
        self.recalculate_direction();
    }

    pub fn set_yaw(&mut self, yaw: Deg<f32>) {
        self.yaw = yaw;
        self.recalculate_direction();
    }

    pub fn set_pitch(&mut self, pitch: Deg<f32>) {
        self.pitch = pitch;
        self.recalculate_direction();
    }

    // Forward/up follow from a quaternion built out of pitch and yaw; the
    // view matrix is rebuilt in the same step so it can never lag a mutation.
    fn recalculate_direction(&mut self) {
        let q = Quaternion::from(Euler::new(self.pitch, self.yaw, Deg(0.0)));
        self.forward = (q * -Vector3::unit_z()).normalize();
        self.up = (q * Vector3::unit_y()).normalize();
        self.view = Matrix4::look_to_rh(self.position, self.forward, self.up);
    }
}

/// Perspective projection; recomputed on resize and on every fov change.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Deg<f32>,
    znear: f32,
    zfar: f32,
    matrix: Matrix4<f32>,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: Deg<f32>, znear: f32, zfar: f32) -> Self {
        let mut projection = Self {
            aspect: width as f32 / height as f32,
            fovy,
            znear,
            zfar,
            matrix: Matrix4::from_scale(1.0),
        };
        projection.recalculate();
        projection
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.recalculate();
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    /// Set the vertical field of view. Callers clamp; see [`clamp_fov`].
    pub fn set_fovy(&mut self, fovy: Deg<f32>) {
        self.fovy = fovy;
        self.recalculate();
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    fn recalculate(&mut self) {
        self.matrix =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }
}

/// The camera state as the shaders see it.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    // View-projection with the camera translation stripped, so the skybox
    // follows the eye instead of being walked through.
    skybox_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::from_scale(1.0).into(),
            skybox_view_proj: Matrix4::from_scale(1.0).into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.matrix() * camera.view()).into();
        let mut rotation_only = camera.view();
        rotation_only.w = cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        self.skybox_view_proj = (projection.matrix() * rotation_only).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// WASD / mouse-look / scroll-zoom controller.
///
/// Input events only accumulate; the accumulated amounts are applied to the
/// camera once per frame in [`update`](Self::update) scaled by dt.
#[derive(Debug)]
pub struct CameraController {
    speed: f32,
    sensitivity: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_left: 0.0,
            amount_right: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
        }
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            let amount = if event.state == ElementState::Pressed {
                1.0
            } else {
                0.0
            };
            match event.physical_key {
                PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                    self.amount_forward = amount;
                }
                PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                    self.amount_backward = amount;
                }
                PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                    self.amount_left = amount;
                }
                PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                    self.amount_right = amount;
                }
                _ => (),
            }
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    /// Apply the accumulated input to camera and projection.
    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let dt = dt.as_secs_f32();

        let forward = camera.forward();
        let right = forward.cross(camera.up()).normalize();
        let step = self.speed * dt;
        let delta = forward * (self.amount_forward - self.amount_backward) * step
            + right * (self.amount_right - self.amount_left) * step;
        camera.translate(delta);

        camera.set_yaw(camera.yaw() - Deg(self.rotate_horizontal) * self.sensitivity);
        let pitch = camera.pitch() - Deg(self.rotate_vertical) * self.sensitivity;
        camera.set_pitch(Deg(pitch.0.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0)));
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;

        if self.scroll != 0.0 {
            projection.set_fovy(clamp_fov(projection.fovy() - Deg(self.scroll)));
            self.scroll = 0.0;
        }
    }
}

/// Camera state bundled with its GPU-side resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, controller: CameraController) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = camera_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_is_unit_length_across_pitch_range() {
        for pitch in (-89..=89).step_by(1) {
            for yaw in [-180.0f32, -90.0, -45.0, 0.0, 33.3, 90.0, 179.0] {
                let camera = Camera::new((0.0, 0.0, 3.0), Deg(yaw), Deg(pitch as f32));
                let len = camera.forward().magnitude();
                assert!(
                    (len - 1.0).abs() < 1e-5,
                    "forward length {len} at yaw {yaw} pitch {pitch}"
                );
            }
        }
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = Camera::new((0.0, 0.0, 3.0), Deg(0.0), Deg(0.0));
        let f = camera.forward();
        assert!(f.x.abs() < 1e-6 && f.y.abs() < 1e-6);
        assert!((f.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn view_matrix_tracks_mutations_immediately() {
        let mut camera = Camera::new((0.0, 0.0, 3.0), Deg(0.0), Deg(0.0));
        let before = camera.view();
        camera.translate(Vector3::new(1.0, 0.0, 0.0));
        assert_ne!(before, camera.view());
        let before = camera.view();
        camera.set_yaw(Deg(45.0));
        assert_ne!(before, camera.view());
    }

    #[test]
    fn fov_reads_back_clamped() {
        let mut projection = Projection::new(960, 540, Deg(45.0), 0.01, 100.0);
        projection.set_fovy(clamp_fov(Deg(0.2)));
        assert_eq!(projection.fovy(), Deg(1.0));
        projection.set_fovy(clamp_fov(Deg(80.0)));
        assert_eq!(projection.fovy(), Deg(45.0));
        projection.set_fovy(clamp_fov(Deg(30.0)));
        assert_eq!(projection.fovy(), Deg(30.0));
    }

    #[test]
    fn controller_clamps_pitch_at_the_poles() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut projection = Projection::new(960, 540, Deg(45.0), 0.01, 100.0);
        let mut controller = CameraController::new(2.5, 1.0);
        controller.handle_mouse(0.0, -500.0);
        controller.update(&mut camera, &mut projection, Duration::from_millis(16));
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        assert!((camera.forward().magnitude() - 1.0).abs() < 1e-5);
    }
}
