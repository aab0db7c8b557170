//! CPU-side checks of the OBJ pipeline against the shipped cube asset.
//! No GPU is needed: parsing and vertex assembly happen before upload.

use lustre::resources::load_mesh_data;

#[test]
fn cube_parses_to_one_mesh_with_per_face_vertices() {
    let meshes = load_mesh_data("cube.obj").expect("cube.obj should parse");
    assert_eq!(meshes.len(), 1);
    let mesh = &meshes[0];
    // Six faces with their own normals and uvs means 4 unique vertices per
    // face after index unification.
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.indices.len(), 36);
    assert_eq!(mesh.material, 0);
}

#[test]
fn cube_positions_stay_in_the_unit_box() {
    let meshes = load_mesh_data("cube.obj").expect("cube.obj should parse");
    for vertex in &meshes[0].vertices {
        for coord in vertex.position {
            assert!(coord.abs() <= 0.5 + f32::EPSILON);
        }
    }
}

#[test]
fn normals_are_axis_aligned_and_unit_length() {
    let meshes = load_mesh_data("cube.obj").expect("cube.obj should parse");
    for vertex in &meshes[0].vertices {
        let [x, y, z] = vertex.normal;
        let length = (x * x + y * y + z * z).sqrt();
        assert!((length - 1.0).abs() < 1e-6);
        assert_eq!(
            vertex.normal.iter().filter(|c| c.abs() > 0.5).count(),
            1,
            "cube normals point along exactly one axis"
        );
    }
}

#[test]
fn texture_coordinates_are_flipped_into_wgpu_space() {
    let meshes = load_mesh_data("cube.obj").expect("cube.obj should parse");
    // The OBJ stores v in OpenGL orientation; the loader flips it so uv
    // (0, 0) is the top-left texel.
    for vertex in &meshes[0].vertices {
        let [u, v] = vertex.tex_coords;
        assert!((0.0..=1.0).contains(&u));
        assert!((0.0..=1.0).contains(&v));
    }
    assert!(
        meshes[0]
            .vertices
            .iter()
            .any(|vtx| vtx.tex_coords[1] == 0.0),
        "an OBJ uv of v=1 must map to 0 after the flip"
    );
}

#[test]
fn indices_address_existing_vertices() {
    let meshes = load_mesh_data("cube.obj").expect("cube.obj should parse");
    let count = meshes[0].vertices.len() as u32;
    assert!(meshes[0].indices.iter().all(|&i| i < count));
}
