//! The demo scene: two lit crates, four orbiting light markers, translucent
//! sprites, a skybox and the optional debug overlays.
//!
//! All GPU resources are created once in [`Scene::new`]; per-frame work is
//! limited to re-sorting the sprite instances and rewriting their instance
//! buffer in [`Scene::prepare`].

use anyhow::Result;
use cgmath::{MetricSpace, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::instance::Instance;
use crate::data_structures::model::{DrawLight, DrawModel, Material, Mesh, Model, ModelVertex};
use crate::data_structures::texture::Texture;
use crate::pipelines::PipelineSet;
use crate::pipelines::light::NUM_POINT_LIGHTS;
use crate::pipelines::normals::{generate_normal_lines, mk_normal_line_buffer};
use crate::pipelines::post::PostEffect;
use crate::pipelines::skybox::mk_skybox_vertex_buffer;
use crate::resources::{self, texture::load_cubemap};

/// How much larger the silhouette shell is drawn than the model itself.
const OUTLINE_SCALE: f32 = 1.1;
const NORMAL_LINE_LENGTH: f32 = 0.3;
const SPRITE_TINT: [u8; 4] = [204, 64, 64, 128];

/// Sort world positions so the farthest from `eye` comes first.
///
/// Alpha blending composes correctly only when translucent geometry is drawn
/// far to near, so the sprite instance buffer is rebuilt from this order
/// every frame.
pub fn sorted_back_to_front(eye: Point3<f32>, positions: &[Point3<f32>]) -> Vec<Point3<f32>> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| {
        let da = eye.distance2(*a);
        let db = eye.distance2(*b);
        db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}

/// One draw in the scene pass, in the order the pass records them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Phong,
    LightMarkers,
    NormalLines,
    Skybox,
    Transparents,
    Outline,
}

/// The draw order for one frame. Opaque geometry first so the depth and
/// stencil buffers are populated, then the skybox against the far plane,
/// then the sorted transparents. The outline comes last of all: it ignores
/// depth, so anything drawn after it over background pixels would paint
/// straight over the halo.
pub fn stage_order(outline_enabled: bool, normals_enabled: bool) -> Vec<Stage> {
    let mut stages = vec![Stage::Phong, Stage::LightMarkers];
    if normals_enabled {
        stages.push(Stage::NormalLines);
    }
    stages.push(Stage::Skybox);
    stages.push(Stage::Transparents);
    if outline_enabled {
        stages.push(Stage::Outline);
    }
    stages
}

pub struct Scene {
    pub actor: Model,
    pub actor_instances: Vec<Instance>,
    actor_instance_buffer: wgpu::Buffer,
    outline_instance_buffer: wgpu::Buffer,
    sprite_mesh: Mesh,
    sprite_material: Material,
    pub sprite_positions: Vec<Point3<f32>>,
    sprite_instance_buffer: wgpu::Buffer,
    normal_line_buffer: wgpu::Buffer,
    normal_line_count: u32,
    skybox_vertex_buffer: wgpu::Buffer,
    cubemap_bind_group: wgpu::BindGroup,
    pub outline_enabled: bool,
    pub normals_enabled: bool,
    pub effect: PostEffect,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        cubemap_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self> {
        let actor = resources::load_model("cube.obj", device, queue, material_layout)?;

        let actor_instances: Vec<Instance> = [
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(2.0, 0.0, 0.0),
        ]
        .into_iter()
        .map(Instance::from)
        .collect();
        let actor_instance_buffer = instance_buffer(device, "actor instances", &actor_instances);

        let outline_instances: Vec<Instance> = actor_instances
            .iter()
            .map(|i| i.clone().with_uniform_scale(OUTLINE_SCALE))
            .collect();
        let outline_instance_buffer =
            instance_buffer(device, "outline instances", &outline_instances);

        // Normal lines are derived from the same OBJ on the CPU and follow
        // the actor's instance transforms.
        let mesh_data = resources::load_mesh_data("cube.obj")?;
        let lines: Vec<_> = mesh_data
            .iter()
            .flat_map(|m| generate_normal_lines(&m.vertices, NORMAL_LINE_LENGTH))
            .collect();
        let normal_line_count = lines.len() as u32;
        let normal_line_buffer = mk_normal_line_buffer(device, &lines);

        let (sprite_mesh, sprite_material) = mk_sprite(device, queue, material_layout);
        let sprite_positions = vec![
            Point3::new(-1.5, 0.0, -0.48),
            Point3::new(1.5, 0.0, 0.51),
            Point3::new(0.0, 0.0, 0.7),
            Point3::new(-0.3, 0.0, -2.3),
            Point3::new(0.5, 0.0, -0.6),
        ];
        let raw: Vec<_> = sprite_positions
            .iter()
            .map(|p| Instance::from(Vector3::new(p.x, p.y, p.z)).to_raw())
            .collect();
        let sprite_instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite instances"),
            contents: bytemuck::cast_slice(&raw),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let skybox_vertex_buffer = mk_skybox_vertex_buffer(device);
        let cubemap = load_cubemap("skybox", device, queue)?;
        let cubemap_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubemap bind group"),
            layout: cubemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&cubemap.sampler),
                },
            ],
        });

        Ok(Self {
            actor,
            actor_instances,
            actor_instance_buffer,
            outline_instance_buffer,
            sprite_mesh,
            sprite_material,
            sprite_positions,
            sprite_instance_buffer,
            normal_line_buffer,
            normal_line_count,
            skybox_vertex_buffer,
            cubemap_bind_group,
            outline_enabled: false,
            normals_enabled: false,
            effect: PostEffect::None,
        })
    }

    /// Per-frame CPU work: rewrite the sprite instance buffer in
    /// back-to-front order relative to the camera.
    pub fn prepare(&mut self, queue: &wgpu::Queue, eye: Point3<f32>) {
        let sorted = sorted_back_to_front(eye, &self.sprite_positions);
        let raw: Vec<_> = sorted
            .iter()
            .map(|p| Instance::from(Vector3::new(p.x, p.y, p.z)).to_raw())
            .collect();
        queue.write_buffer(&self.sprite_instance_buffer, 0, bytemuck::cast_slice(&raw));
    }

    /// Record the scene into one render pass on the off-screen target.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        pipelines: &PipelineSet,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
        clear_color: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        // The lit pass writes this value wherever the actor covers a pixel;
        // the outline pass then draws only where it is absent.
        pass.set_stencil_reference(1);

        for stage in stage_order(self.outline_enabled, self.normals_enabled) {
            match stage {
                Stage::Phong => {
                    pass.set_pipeline(&pipelines.phong);
                    pass.set_vertex_buffer(1, self.actor_instance_buffer.slice(..));
                    pass.draw_model_instanced(
                        &self.actor,
                        0..self.actor_instances.len() as u32,
                        camera_bind_group,
                        light_bind_group,
                    );
                }
                // Emissive markers read their positions straight from the
                // lights uniform, indexed by instance.
                Stage::LightMarkers => {
                    pass.set_pipeline(&pipelines.light);
                    pass.draw_light_model_instanced(
                        &self.actor,
                        0..NUM_POINT_LIGHTS as u32,
                        camera_bind_group,
                        light_bind_group,
                    );
                }
                Stage::NormalLines => {
                    pass.set_pipeline(&pipelines.normals);
                    pass.set_bind_group(0, camera_bind_group, &[]);
                    pass.set_bind_group(1, light_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.normal_line_buffer.slice(..));
                    pass.set_vertex_buffer(1, self.actor_instance_buffer.slice(..));
                    pass.draw(
                        0..self.normal_line_count,
                        0..self.actor_instances.len() as u32,
                    );
                }
                Stage::Skybox => {
                    pass.set_pipeline(&pipelines.skybox);
                    pass.set_bind_group(0, camera_bind_group, &[]);
                    pass.set_bind_group(1, &self.cubemap_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.skybox_vertex_buffer.slice(..));
                    pass.draw(0..36, 0..1);
                }
                Stage::Transparents => {
                    pass.set_pipeline(&pipelines.transparent);
                    pass.set_vertex_buffer(1, self.sprite_instance_buffer.slice(..));
                    pass.draw_mesh_instanced(
                        &self.sprite_mesh,
                        &self.sprite_material,
                        0..self.sprite_positions.len() as u32,
                        camera_bind_group,
                        light_bind_group,
                    );
                }
                Stage::Outline => {
                    pass.set_pipeline(&pipelines.outline);
                    pass.set_vertex_buffer(1, self.outline_instance_buffer.slice(..));
                    pass.draw_light_model_instanced(
                        &self.actor,
                        0..self.actor_instances.len() as u32,
                        camera_bind_group,
                        light_bind_group,
                    );
                }
            }
        }
    }
}

fn instance_buffer(
    device: &wgpu::Device,
    label: &str,
    instances: &[Instance],
) -> wgpu::Buffer {
    let raw: Vec<_> = instances.iter().map(Instance::to_raw).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&raw),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// A unit quad in the xy plane with a shared translucent tint texture.
fn mk_sprite(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
) -> (Mesh, Material) {
    let vertices = [
        ModelVertex {
            position: [-0.5, -0.5, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coords: [0.0, 1.0],
        },
        ModelVertex {
            position: [0.5, -0.5, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coords: [1.0, 1.0],
        },
        ModelVertex {
            position: [0.5, 0.5, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coords: [1.0, 0.0],
        },
        ModelVertex {
            position: [-0.5, 0.5, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coords: [0.0, 0.0],
        },
    ];
    let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];
    let mesh = Mesh {
        name: "sprite".to_string(),
        vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite vertex buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }),
        index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite index buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        }),
        num_elements: indices.len() as u32,
        material: 0,
    };

    let tint = std::sync::Arc::new(Texture::solid_color(device, queue, SPRITE_TINT));
    let material = Material::new(device, "sprite", tint.clone(), tint, material_layout);
    (mesh, material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_sprite_is_drawn_first() {
        let eye = Point3::new(0.0, 0.0, 0.0);
        let positions = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let sorted = sorted_back_to_front(eye, &positions);
        assert_eq!(sorted[0].z, 3.0);
        assert_eq!(sorted[1].z, 2.0);
        assert_eq!(sorted[2].z, 1.0);
    }

    #[test]
    fn order_follows_the_eye() {
        let positions = vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 3.0)];
        let from_front = sorted_back_to_front(Point3::new(0.0, 0.0, 0.0), &positions);
        let from_behind = sorted_back_to_front(Point3::new(0.0, 0.0, 4.0), &positions);
        assert_eq!(from_front[0].z, 3.0);
        assert_eq!(from_behind[0].z, 1.0);
    }

    #[test]
    fn sorting_does_not_lose_or_invent_sprites() {
        let positions = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, -3.0),
        ];
        let sorted = sorted_back_to_front(Point3::new(5.0, 5.0, 5.0), &positions);
        assert_eq!(sorted.len(), positions.len());
        for p in &positions {
            assert!(sorted.contains(p));
        }
    }

    fn position(stages: &[Stage], stage: Stage) -> usize {
        stages
            .iter()
            .position(|s| *s == stage)
            .unwrap_or_else(|| panic!("{stage:?} missing from {stages:?}"))
    }

    #[test]
    fn outline_is_recorded_after_skybox_and_transparents() {
        // The outline draws with depth testing disabled. Over background
        // pixels it leaves depth at the cleared 1.0, which the skybox would
        // pass against and paint over, so it has to be the final draw.
        let stages = stage_order(true, true);
        let outline = position(&stages, Stage::Outline);
        assert!(position(&stages, Stage::Skybox) < outline);
        assert!(position(&stages, Stage::Transparents) < outline);
        assert_eq!(outline, stages.len() - 1);
    }

    #[test]
    fn opaque_geometry_precedes_skybox_and_transparents() {
        let stages = stage_order(false, false);
        assert_eq!(
            stages,
            vec![
                Stage::Phong,
                Stage::LightMarkers,
                Stage::Skybox,
                Stage::Transparents,
            ]
        );
    }

    #[test]
    fn toggles_add_and_remove_their_stages() {
        assert!(!stage_order(false, true).contains(&Stage::Outline));
        assert!(!stage_order(true, false).contains(&Stage::NormalLines));
        assert!(stage_order(true, true).contains(&Stage::Outline));
        assert!(stage_order(true, true).contains(&Stage::NormalLines));
    }
}
