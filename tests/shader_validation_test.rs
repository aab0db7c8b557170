//! Every shipped WGSL module must parse and validate, so a shader typo is
//! caught by `cargo test` instead of a panic at pipeline creation.

use lustre::shader::validate_wgsl;

const SHADERS: [(&str, &str); 7] = [
    ("phong.wgsl", include_str!("../src/pipelines/phong.wgsl")),
    ("light.wgsl", include_str!("../src/pipelines/light.wgsl")),
    ("outline.wgsl", include_str!("../src/pipelines/outline.wgsl")),
    (
        "transparent.wgsl",
        include_str!("../src/pipelines/transparent.wgsl"),
    ),
    ("skybox.wgsl", include_str!("../src/pipelines/skybox.wgsl")),
    ("normals.wgsl", include_str!("../src/pipelines/normals.wgsl")),
    ("post.wgsl", include_str!("../src/pipelines/post.wgsl")),
];

#[test]
fn all_shipped_shaders_validate() {
    for (name, source) in SHADERS {
        validate_wgsl(source, name).unwrap_or_else(|e| panic!("{name} failed validation: {e:?}"));
    }
}

#[test]
fn every_shader_has_both_entry_points() {
    for (name, source) in SHADERS {
        assert!(source.contains("fn vs_main"), "{name} misses vs_main");
        assert!(source.contains("fn fs_main"), "{name} misses fs_main");
    }
}
