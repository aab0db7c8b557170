//! Texture loading, bind group layouts and the path-keyed texture cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data_structures::texture::Texture;
use crate::resources::load_binary;

/// Layout for the fixed material slot table: diffuse map at bindings 0/1,
/// specular map at bindings 2/3.
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// Layout for the skybox cubemap: cube texture at binding 0, sampler at 1.
pub fn cubemap_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::Cube,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("cubemap_bind_group_layout"),
    })
}

pub fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name)?;
    Texture::from_bytes(device, queue, &data, file_name)
}

/// Load the six skybox faces from a directory (`right`, `left`, `top`,
/// `bottom`, `front`, `back`, each `.jpg` or `.png`).
///
/// A face that cannot be read or decoded is replaced by a 1x1 sky-blue
/// placeholder with the error logged; a missing asset degrades the skybox
/// instead of feeding the driver undefined data.
pub fn load_cubemap(
    dir: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    const FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];
    const PLACEHOLDER_SKY: [u8; 4] = [96, 156, 211, 255];

    let faces = FACES.map(|face| {
        ["jpg", "png"]
            .iter()
            .find_map(|ext| {
                let data = load_binary(&format!("{dir}/{face}.{ext}")).ok()?;
                image::load_from_memory(&data).ok()
            })
            .unwrap_or_else(|| {
                log::error!("skybox face {dir}/{face} missing or unreadable, using placeholder");
                image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
                    1,
                    1,
                    image::Rgba(PLACEHOLDER_SKY),
                ))
            })
    });
    // If any face fell back to the placeholder, force all of them to share
    // dimensions by keeping only same-sized faces.
    let faces = unify_face_sizes(faces);
    Texture::cubemap_from_images(device, queue, &faces, dir)
}

fn unify_face_sizes(faces: [image::DynamicImage; 6]) -> [image::DynamicImage; 6] {
    use image::GenericImageView;
    // Anchor on the largest face so a 1x1 placeholder never drags the five
    // intact faces down to a single pixel.
    let target = faces
        .iter()
        .map(|f| f.dimensions())
        .max_by_key(|(w, h)| u64::from(*w) * u64::from(*h))
        .unwrap_or((1, 1));
    if faces.iter().all(|f| f.dimensions() == target) {
        return faces;
    }
    log::warn!("skybox faces disagree on dimensions, resizing to {target:?}");
    faces.map(|f| {
        if f.dimensions() == target {
            f
        } else {
            f.resize_exact(target.0, target.1, image::imageops::FilterType::Triangle)
        }
    })
}

/// Path-keyed cache guaranteeing one loaded value per unique source path.
///
/// Models funnel every material texture request through a cache so a
/// texture referenced by several meshes is created exactly once.
#[derive(Debug)]
pub struct TextureCache<T = Texture> {
    entries: HashMap<String, Arc<T>>,
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Fetch the cached value for `path`, invoking `load` only on a miss.
    pub fn get_or_load(
        &mut self,
        path: &str,
        load: impl FnOnce() -> anyhow::Result<T>,
    ) -> anyhow::Result<Arc<T>> {
        if let Some(entry) = self.entries.get(path) {
            return Ok(entry.clone());
        }
        let entry = Arc::new(load()?);
        self.entries.insert(path.to_string(), entry.clone());
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn face(w: u32, h: u32) -> image::DynamicImage {
        image::DynamicImage::ImageRgba8(image::RgbaImage::new(w, h))
    }

    #[test]
    fn matching_faces_pass_through_untouched() {
        let faces = unify_face_sizes(std::array::from_fn(|_| face(8, 8)));
        assert!(faces.iter().all(|f| f.dimensions() == (8, 8)));
    }

    #[test]
    fn placeholder_first_face_does_not_shrink_the_rest() {
        let mut faces = std::array::from_fn(|_| face(8, 8));
        faces[0] = face(1, 1);
        let unified = unify_face_sizes(faces);
        assert!(unified.iter().all(|f| f.dimensions() == (8, 8)));
    }

    #[test]
    fn mixed_sizes_settle_on_the_largest() {
        let mut faces = std::array::from_fn(|_| face(4, 4));
        faces[3] = face(16, 16);
        faces[5] = face(1, 1);
        let unified = unify_face_sizes(faces);
        assert!(unified.iter().all(|f| f.dimensions() == (16, 16)));
    }

    #[test]
    fn cache_loads_each_path_exactly_once() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let mut loads = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_load("bricks.png", || {
                    loads += 1;
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);

        cache.get_or_load("metal.png", || Ok(9)).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_does_not_poison_on_load_failure() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let failed: anyhow::Result<_> =
            cache.get_or_load("corrupt.png", || Err(anyhow::anyhow!("bad image")));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        // A later successful load for the same path goes through.
        let value = cache.get_or_load("corrupt.png", || Ok(1)).unwrap();
        assert_eq!(*value, 1);
    }

    #[test]
    fn cached_values_are_shared_not_copied() {
        let mut cache: TextureCache<String> = TextureCache::new();
        let a = cache
            .get_or_load("a.png", || Ok("pixels".to_string()))
            .unwrap();
        let b = cache.get_or_load("a.png", || unreachable!()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
