//! lustre
//!
//! A small forward renderer built on wgpu. The scene is a handful of lit,
//! instanced models with a Blinn-Phong light rig, drawn into an off-screen
//! target and resolved to the window through a post-processing pass.
//! Stencil-based outlining, normal visualization, a cubemap skybox and
//! sorted alpha blending round out the feature set.
//!
//! High-level modules
//! - `camera`: camera, projection and the input controller
//! - `context`: GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances and texture wrappers
//! - `app`: window setup and the per-frame update/render loop
//! - `offscreen`: the intermediate render target for post-processing
//! - `pipelines`: one module per render pass, plus the shared uniforms
//! - `resources`: loading of models, textures and cubemaps
//! - `scene`: the demo scene and its draw ordering
//! - `shader`: WGSL validation and module creation

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod offscreen;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod shader;

pub use app::run;
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
