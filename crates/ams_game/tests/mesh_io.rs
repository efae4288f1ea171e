//! Mesh loading and saving through the context's loader registry

use ams_game::mesh::{AmsMeshLoader, ObjMeshLoader};
use ams_game::prelude::*;
use std::fs;

/// Two-submesh icosphere-sized mesh with the attribute layout of the
/// `tri_sphere_all_attribs` fixture: 960 vertices, 320 triangles
fn tri_sphere_all_attribs() -> Mesh {
    let vertices: Vec<[f32; 3]> = (0..960)
        .map(|i| {
            let t = i as f32 * 0.013;
            [t.cos(), t.sin(), (i % 7) as f32 * 0.1 - 0.3]
        })
        .collect();
    let faces: Vec<Vec<u32>> = (0..320u32).map(|f| vec![3 * f, 3 * f + 1, 3 * f + 2]).collect();

    let mut mesh = Mesh::new(vertices, faces);
    mesh.set_normals(Mesh::generate_normals(mesh.vertices(), mesh.faces()));
    mesh.set_uv((0..960).map(|i| [i as f32 / 960.0, 0.5]).collect());
    mesh.set_uv2((0..960).map(|i| [0.25, 1.0 - i as f32 / 960.0]).collect());
    mesh.set_colors((0..960).map(|i| [(i % 3) as f32 / 3.0, 0.2, 0.7, 1.0]).collect());
    mesh.set_submeshes(vec![(0..160).collect(), (160..320).collect()]);
    mesh
}

fn assert_fixture_counts(mesh: &Mesh) {
    assert_eq!(mesh.vertex_count(), 960);
    assert_eq!(mesh.normal_count(), 960);
    assert_eq!(mesh.tangent_count(), 0);
    assert_eq!(mesh.uv_count(), 960);
    assert_eq!(mesh.uv2_count(), 960);
    assert_eq!(mesh.uv3_count(), 0);
    assert_eq!(mesh.uv4_count(), 0);
    assert_eq!(mesh.color_count(), 960);
    assert_eq!(mesh.face_count(), 320);
    assert_eq!(mesh.submesh_count(), 2);
}

#[test]
fn test_binary_and_ascii_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = Context::new();
    let mesh = tri_sphere_all_attribs();

    for (file, binary) in [("binary.ams", true), ("ascii.ams", false)] {
        let path = dir.path().join(file);
        mesh.save_to_file(&path, binary).unwrap();

        let loaded = context.load_mesh(&path).unwrap();
        assert_fixture_counts(&loaded);
        assert_eq!(loaded, mesh, "{file} differs after reload");
    }
}

#[test]
fn test_save_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mesh.ams");
    fs::write(&path, "stale contents that are much longer than nothing").unwrap();

    let mesh = Mesh::new(vec![[1.0, 2.0, 3.0]; 3], vec![vec![0, 1, 2]]);
    mesh.save_to_file(&path, false).unwrap();

    let mut registry = MeshLoaderRegistry::new();
    assert_eq!(Mesh::from_file(&mut registry, &path).unwrap(), mesh);
}

#[test]
fn test_loader_registration_is_idempotent() {
    let mut context = Context::new();
    let registry = context.mesh_loaders_mut();
    let before = registry.len();

    assert!(registry.register::<ObjMeshLoader>());
    assert!(!registry.register::<ObjMeshLoader>());
    assert_eq!(registry.len(), before + 1);
    assert!(registry.contains("obj"));
}

#[test]
fn test_ams_loader_available_without_registration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.ams");
    let mesh = Mesh::new(
        vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![vec![0, 1, 2, 3]],
    );
    mesh.save_to_file(&path, true).unwrap();

    let mut context = Context::new();
    assert!(context.mesh_loaders().is_empty());
    assert_eq!(context.load_mesh(&path).unwrap(), mesh);
    assert_eq!(context.mesh_loaders().supported_file_types(), vec!["ams"]);
    assert!(!context.mesh_loaders_mut().register::<AmsMeshLoader>());
}

#[test]
fn test_unknown_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mesh.ply");
    fs::write(&path, "ply\n").unwrap();

    let mut context = Context::new();
    let err = context.load_mesh(&path).unwrap_err();
    assert!(matches!(err, MeshError::NoLoader(ext) if ext == "ply"));
    // caller-chosen default on failure
    assert!(context.load_mesh(&path).unwrap_or_default().is_empty());
}

#[test]
fn test_malformed_files_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut context = Context::new();

    let header = dir.path().join("header.ams");
    fs::write(&header, "not_a_mesh\nversion 1\n").unwrap();
    assert!(matches!(
        context.load_mesh(&header),
        Err(MeshError::InvalidHeader { .. })
    ));

    let missing = dir.path().join("missing.ams");
    fs::write(
        &missing,
        "ams_mesh\nversion 1\nascii\nvertex_count 2\nnormal_count 0\ntangent_count 0\n\
         uv_count 0\nuv2_count 0\nuv3_count 0\nuv4_count 0\ncolor_count 0\n\
         face_count 0\nsubmesh_count 0\n\n",
    )
    .unwrap();
    let err = context.load_mesh(&missing).unwrap_err();
    assert!(err.to_string().starts_with("vertex_count > 0 but vertices not found"));

    let face = dir.path().join("face.ams");
    fs::write(
        &face,
        "ams_mesh\nversion 1\nascii\nvertex_count 1\nnormal_count 0\ntangent_count 0\n\
         uv_count 0\nuv2_count 0\nuv3_count 0\nuv4_count 0\ncolor_count 0\n\
         face_count 1\nsubmesh_count 0\n\nvertices\n0 0 0\nfaces\n-2  0 0\n",
    )
    .unwrap();
    assert!(matches!(
        context.load_mesh(&face),
        Err(MeshError::InvalidIndexCount { kind: "face", .. })
    ));
}

#[test]
fn test_obj_converts_to_ams() {
    let dir = tempfile::tempdir().unwrap();
    let obj = dir.path().join("colored.obj");
    fs::write(
        &obj,
        "o first\n\
         v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 1 1 0 0 0 1\nv 0 1 0 1 1 1\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
         f 1/1 2/2 3/3 4/4\n\
         o second\n\
         v 2 0 0 1 0 0\nv 3 0 0 1 0 0\nv 2 1 0 1 0 0\n\
         vt 0 0\nvt 1 0\nvt 0 1\n\
         f 5/5 6/6 7/7\n",
    )
    .unwrap();

    let mut context = Context::new();
    context.mesh_loaders_mut().register::<ObjMeshLoader>();
    let mesh = context.load_mesh(&obj).unwrap();

    assert_eq!(mesh.vertex_count(), 7);
    assert_eq!(mesh.normal_count(), 7);
    assert_eq!(mesh.uv_count(), 7);
    assert_eq!(mesh.face_count(), 3);
    assert_eq!(mesh.submesh_count(), 2);
    assert!(mesh.colors().iter().all(|color| color[3] == 1.0));

    let ams = dir.path().join("colored.ams");
    mesh.save_to_file(&ams, true).unwrap();
    assert_eq!(context.load_mesh(&ams).unwrap(), mesh);
}

#[test]
fn test_triangulated_mesh_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fan.ams");
    let mut mesh = Mesh::new(
        vec![[0.0; 3], [1.0, 0.0, 0.0], [1.5, 1.0, 0.0], [0.5, 1.5, 0.0], [-0.5, 1.0, 0.0]],
        vec![vec![0, 1, 2, 3, 4]],
    );
    mesh.set_submeshes(vec![vec![0]]);
    let mesh = mesh.triangulate();
    assert_eq!(mesh.face_count(), 3);
    assert_eq!(mesh.submeshes(), [vec![0, 1, 2]]);

    mesh.save_to_file(&path, false).unwrap();
    let mut registry = MeshLoaderRegistry::new();
    assert_eq!(Mesh::from_file(&mut registry, &path).unwrap(), mesh);
}
