//! Draw-ready model data: vertices, meshes, materials.
//!
//! A [`Model`] owns a list of [`Mesh`]es plus the [`Material`]s they index.
//! Meshes own their GPU vertex/index buffers; materials share decoded
//! textures via `Arc` so a texture loaded once can back several meshes.
//! The [`DrawModel`] and [`DrawLight`] traits extend `wgpu::RenderPass`
//! with the bind-and-draw sequences used by the frame loop.

use std::ops::Range;
use std::sync::Arc;

use crate::data_structures::texture::Texture;

/// Types that can describe their GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The vertex record uploaded for every model: position, normal, texture
/// coordinate. 8 floats, 32 bytes per vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBS: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBS,
        }
    }
}

/// Incrementally builds a vertex buffer layout by pushing attributes.
///
/// Offsets and shader locations are assigned in push order; the stride is
/// the sum of the pushed attribute sizes. Useful for the small ad-hoc
/// vertex formats (lines, sprites) that don't warrant a `const` table.
#[derive(Debug, Default)]
pub struct VertexLayoutBuilder {
    attributes: Vec<wgpu::VertexAttribute>,
    stride: wgpu::BufferAddress,
}

impl VertexLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, format: wgpu::VertexFormat) -> Self {
        self.attributes.push(wgpu::VertexAttribute {
            offset: self.stride,
            shader_location: self.attributes.len() as u32,
            format,
        });
        self.stride += format.size();
        self
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn layout(&self, step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode,
            attributes: &self.attributes,
        }
    }
}

/// A material with fixed texture slots: diffuse map at bindings 0/1,
/// specular map at bindings 2/3.
///
/// The slot table is part of the pipeline contract; a mesh with no specular
/// map gets the shared fallback texture rather than a shifted slot.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Arc<Texture>,
    pub specular_texture: Arc<Texture>,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Arc<Texture>,
        specular_texture: Arc<Texture>,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular_texture.sampler),
                },
            ],
            label: Some(name),
        });
        Self {
            name: name.to_string(),
            diffuse_texture,
            specular_texture,
            bind_group,
        }
    }
}

/// One indexed draw call worth of geometry.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

/// A set of meshes and the materials they reference.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

/// Bind-and-draw sequences for lit model rendering.
///
/// Bind group slots: 0 material, 1 camera, 2 lights.
pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a> DrawModel<'a> for wgpu::RenderPass<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }
}

/// Draws geometry with no material bindings (light markers, outlines).
///
/// Bind group slots: 0 camera, 1 lights.
pub trait DrawLight<'a> {
    fn draw_light_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
    fn draw_light_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a> DrawLight<'a> for wgpu::RenderPass<'a> {
    fn draw_light_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_light_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            self.draw_light_mesh_instanced(
                mesh,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<ModelVertex>(), 32);
    }

    #[test]
    fn layout_builder_computes_stride_and_offsets() {
        // position + normal + uv, the ModelVertex shape
        let builder = VertexLayoutBuilder::new()
            .push(wgpu::VertexFormat::Float32x3)
            .push(wgpu::VertexFormat::Float32x3)
            .push(wgpu::VertexFormat::Float32x2);

        assert_eq!(builder.stride(), 32);
        let offsets: Vec<u64> = builder.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = builder
            .attributes()
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn layout_builder_matches_model_vertex_desc() {
        let builder = VertexLayoutBuilder::new()
            .push(wgpu::VertexFormat::Float32x3)
            .push(wgpu::VertexFormat::Float32x3)
            .push(wgpu::VertexFormat::Float32x2);
        let desc = ModelVertex::desc();
        assert_eq!(builder.stride(), desc.array_stride);
        assert_eq!(builder.attributes(), desc.attributes);
    }
}
