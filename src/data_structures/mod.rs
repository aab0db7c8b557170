//! Renderer data structures: models, textures and per-draw instances.
//!
//! - `model` contains mesh and material definitions plus the draw traits
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds the per-draw transform record

pub mod instance;
pub mod model;
pub mod texture;
