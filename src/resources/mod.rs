//! Loading of meshes, textures and models from the asset directory.

use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use crate::data_structures::model::{Material, Model};
use crate::data_structures::texture::Texture;
use crate::resources::texture::{TextureCache, load_texture};

pub mod mesh;
pub mod texture;

/// Resolve a file name against the crate's asset directory convention.
fn asset_path(file_name: &str) -> std::path::PathBuf {
    Path::new("./").join("assets").join(file_name)
}

pub fn load_string(file_name: &str) -> anyhow::Result<String> {
    let path = asset_path(file_name);
    Ok(std::fs::read_to_string(path)?)
}

pub fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(file_name);
    Ok(std::fs::read(path)?)
}

/// Parse an OBJ into CPU-side mesh data without touching the GPU.
///
/// Used for derived geometry such as normal visualization lines, and by
/// tests that check parsing without a device.
pub fn load_mesh_data(file_name: &str) -> anyhow::Result<Vec<mesh::MeshData>> {
    let obj_text = load_string(file_name)?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let (models, _) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok((Vec::new(), Default::default())),
    )?;
    Ok(mesh::parse_meshes(&models, file_name))
}

/// Load a wavefront OBJ with its MTL materials into a draw-ready [`Model`].
///
/// Material textures are resolved relative to the OBJ's directory and
/// deduplicated by path, so a map shared by several materials is created
/// once. A material with a missing or unreadable map falls back to a shared
/// 1x1 white placeholder and the error is logged.
pub fn load_model(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<Model> {
    let obj_text = load_string(file_name)?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let directory = Path::new(file_name)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_name = directory.join(p);
            let mat_text = load_string(&mtl_name.to_string_lossy())
                .map_err(|_| tobj::LoadError::OpenFileFailed)?;
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text)))
        },
    )?;

    let fallback = Arc::new(Texture::solid_color(device, queue, [255, 255, 255, 255]));
    let mut cache = TextureCache::new();
    let mut resolve = |map: &Option<String>| -> Arc<Texture> {
        let Some(name) = map else {
            return fallback.clone();
        };
        let path = directory.join(name).to_string_lossy().into_owned();
        match cache.get_or_load(&path, || load_texture(&path, device, queue)) {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("texture {path} referenced by {file_name} failed to load: {e}");
                fallback.clone()
            }
        }
    };

    let mut materials = Vec::new();
    for m in obj_materials? {
        let diffuse = resolve(&m.diffuse_texture);
        let specular = resolve(&m.specular_texture);
        materials.push(Material::new(device, &m.name, diffuse, specular, layout));
    }
    if materials.is_empty() {
        // Meshes default to material index 0; keep it valid.
        materials.push(Material::new(
            device,
            "default",
            fallback.clone(),
            fallback,
            layout,
        ));
    }

    let meshes = mesh::upload_meshes(&mesh::parse_meshes(&models, file_name), device);
    Ok(Model { meshes, materials })
}
