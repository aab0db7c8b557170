//! The scene light rig and the emissive marker pass.
//!
//! One directional light, four attenuated point lights and a spotlight
//! that follows the camera, packed into a single uniform buffer shared by
//! the lit passes. The marker pipeline renders a small emissive cube at
//! each point light position.

use cgmath::{Deg, Quaternion, Rotation3};
use wgpu::util::DeviceExt;

use crate::data_structures::model::{ModelVertex, Vertex};
use crate::pipelines::{PipelineLayouts, PipelineParams, depth_default, mk_render_pipeline};
use crate::shader::Shader;

pub const NUM_POINT_LIGHTS: usize = 4;

/// Ambient/diffuse/specular sun light.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    _p0: f32,
    pub ambient: [f32; 3],
    _p1: f32,
    pub diffuse: [f32; 3],
    _p2: f32,
    pub specular: [f32; 3],
    _p3: f32,
}

/// Point light with constant/linear/quadratic distance attenuation.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    pub constant: f32,
    pub color: [f32; 3],
    pub linear: f32,
    pub quadratic: f32,
    _p: [f32; 3],
}

/// Camera-following spotlight with a soft inner/outer cone.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLight {
    pub position: [f32; 3],
    pub cut_off: f32,
    pub direction: [f32; 3],
    pub outer_cut_off: f32,
    pub ambient: [f32; 3],
    _p0: f32,
    pub diffuse: [f32; 3],
    _p1: f32,
    pub specular: [f32; 3],
    _p2: f32,
}

/// The whole rig as the shaders see it. Field order and padding must match
/// the `Lights` struct in the WGSL sources.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub directional: DirectionalLight,
    pub point: [PointLight; NUM_POINT_LIGHTS],
    pub spot: SpotLight,
    pub shininess: f32,
    _p: [f32; 3],
}

impl LightsUniform {
    /// The demo rig: white key light plus three tinted fill lights.
    pub fn new() -> Self {
        let positions = [
            [0.7, 0.2, 2.0],
            [2.3, -3.3, -4.0],
            [-4.0, 2.0, -12.0],
            [0.0, 0.0, -3.0],
        ];
        let colors: [[f32; 3]; NUM_POINT_LIGHTS] = [
            [1.0, 1.0, 1.0],
            [0.7, 0.8, 0.9],
            [1.0, 0.0, 0.2],
            [0.0, 1.0, 0.0],
        ];
        let mut point = [PointLight {
            position: [0.0; 3],
            constant: 1.0,
            color: [0.0; 3],
            linear: 0.09,
            quadratic: 0.032,
            _p: [0.0; 3],
        }; NUM_POINT_LIGHTS];
        for i in 0..NUM_POINT_LIGHTS {
            point[i].position = positions[i];
            point[i].color = colors[i];
        }

        Self {
            directional: DirectionalLight {
                direction: [-0.2, -1.0, -0.3],
                _p0: 0.0,
                ambient: [0.2; 3],
                _p1: 0.0,
                diffuse: [0.5; 3],
                _p2: 0.0,
                specular: [1.0; 3],
                _p3: 0.0,
            },
            point,
            spot: SpotLight {
                position: [0.0; 3],
                cut_off: Deg(12.5f32).0.to_radians().cos(),
                direction: [0.0, 0.0, -1.0],
                outer_cut_off: Deg(17.5f32).0.to_radians().cos(),
                ambient: [0.2; 3],
                _p0: 0.0,
                diffuse: [0.5; 3],
                _p1: 0.0,
                specular: [1.0; 3],
                _p2: 0.0,
            },
            shininess: 32.0,
            _p: [0.0; 3],
        }
    }

    /// Keep the spotlight glued to the camera.
    pub fn follow_camera(&mut self, position: [f32; 3], direction: [f32; 3]) {
        self.spot.position = position;
        self.spot.direction = direction;
    }

    /// Orbit the point lights around the scene's vertical axis.
    pub fn orbit_point_lights(&mut self, dt: std::time::Duration) {
        let rotation =
            Quaternion::from_axis_angle((0.0, 1.0, 0.0).into(), Deg(20.0 * dt.as_secs_f32()));
        for light in &mut self.point {
            let position: cgmath::Vector3<f32> = light.position.into();
            light.position = (rotation * position).into();
        }
    }
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Light rig bundled with its GPU-side resources.
pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("lights bind group"),
        });
        Self {
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

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("lights_bind_group_layout"),
    })
}

/// Emissive cube markers, one instance per point light. The vertex stage
/// reads positions and colors straight from the lights uniform via the
/// instance index, so no instance buffer is involved.
pub fn mk_light_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &PipelineLayouts,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("light marker pipeline layout"),
        bind_group_layouts: &[layouts.camera, layouts.light],
        push_constant_ranges: &[],
    });
    let shader = Shader::from_wgsl(device, include_str!("light.wgsl"), "light.wgsl")?;
    Ok(mk_render_pipeline(
        device,
        &shader,
        PipelineParams {
            label: "light marker pipeline",
            layout: &layout,
            color_format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            depth_stencil: Some(depth_default()),
            vertex_layouts: &[ModelVertex::desc()],
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl_expectations() {
        assert_eq!(std::mem::size_of::<DirectionalLight>(), 64);
        assert_eq!(std::mem::size_of::<PointLight>(), 48);
        assert_eq!(std::mem::size_of::<SpotLight>(), 80);
        assert_eq!(
            std::mem::size_of::<LightsUniform>(),
            64 + NUM_POINT_LIGHTS * 48 + 80 + 16
        );
    }

    #[test]
    fn spot_cone_is_cosine_encoded() {
        let rig = LightsUniform::new();
        assert!(rig.spot.cut_off > rig.spot.outer_cut_off);
        assert!((rig.spot.cut_off - 12.5f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn orbit_preserves_light_height_and_radius() {
        let mut rig = LightsUniform::new();
        let before: cgmath::Vector3<f32> = rig.point[1].position.into();
        rig.orbit_point_lights(std::time::Duration::from_secs(1));
        let after: cgmath::Vector3<f32> = rig.point[1].position.into();
        assert!((before.y - after.y).abs() < 1e-5);
        use cgmath::InnerSpace;
        assert!((before.magnitude() - after.magnitude()).abs() < 1e-4);
        assert_ne!(before, after);
    }
}
