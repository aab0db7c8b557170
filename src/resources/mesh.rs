//! Conversion of imported OBJ geometry into GPU meshes.
//!
//! Parsing is split from uploading: [`parse_meshes`] turns tobj output into
//! plain vertex/index arrays (pure CPU, unit testable), [`upload_meshes`]
//! copies those arrays into GPU buffers.

use wgpu::util::DeviceExt;

use crate::data_structures::model::{Mesh, ModelVertex};

/// CPU-side mesh data ready for upload.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

/// Flatten tobj models into interleaved vertex records.
///
/// Missing normals or texture coordinates become zeros; the v coordinate is
/// flipped to match the texture origin convention of the upload path.
pub fn parse_meshes(models: &[tobj::Model], file_name: &str) -> Vec<MeshData> {
    models
        .iter()
        .map(|m| {
            let vertices = (0..m.mesh.positions.len() / 3)
                .map(|i| ModelVertex {
                    position: [
                        m.mesh.positions[i * 3],
                        m.mesh.positions[i * 3 + 1],
                        m.mesh.positions[i * 3 + 2],
                    ],
                    normal: [
                        m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                        m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                    ],
                    tex_coords: [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ],
                })
                .collect();

            MeshData {
                name: if m.name.is_empty() {
                    file_name.to_string()
                } else {
                    m.name.clone()
                },
                vertices,
                indices: m.mesh.indices.clone(),
                material: m.mesh.material_id.unwrap_or(0),
            }
        })
        .collect()
}

pub fn upload_meshes(meshes: &[MeshData], device: &wgpu::Device) -> Vec<Mesh> {
    meshes
        .iter()
        .map(|data| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} vertex buffer", data.name)),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} index buffer", data.name)),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            Mesh {
                name: data.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: data.indices.len() as u32,
                material: data.material,
            }
        })
        .collect()
}
