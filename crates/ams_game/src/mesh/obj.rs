//! Wavefront OBJ loader backed by `tobj`

use super::{Index, Mesh, MeshError, MeshLoader};
use std::path::Path;

/// Loader for `.obj` files
///
/// Faces are triangulated and every OBJ model becomes one submesh. Models
/// missing texture coordinates or colors get zeroed (or opaque white) entries
/// so buffers stay aligned; normals are generated unless every model has them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjMeshLoader;

impl ObjMeshLoader {
    /// Extension of the format
    pub const FILETYPE: &'static str = "obj";
}

impl MeshLoader for ObjMeshLoader {
    fn filetype(&self) -> &str {
        Self::FILETYPE
    }

    fn load(&self, path: &Path) -> Result<Mesh, MeshError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &options).map_err(|err| {
            log::error!("Failed to load {}: {err}", path.display());
            MeshError::Loader(format!("{}: {err}", path.display()))
        })?;

        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut uv = Vec::new();
        let mut colors = Vec::new();
        let mut faces = Vec::new();
        let mut submeshes = Vec::new();
        let (mut all_normals, mut any_uv, mut any_color) = (true, false, false);

        for model in &models {
            let mesh = &model.mesh;
            let base = vertices.len() as Index;
            let count = mesh.positions.len() / 3;

            append(&mut vertices, &mesh.positions, count, [0.0; 3]);
            all_normals &= append(&mut normals, &mesh.normals, count, [0.0; 3]);
            any_uv |= append(&mut uv, &mesh.texcoords, count, [0.0; 2]);
            any_color |= append_rgb(&mut colors, &mesh.vertex_color, count);

            let first_face = faces.len() as Index;
            faces.extend(
                mesh.indices
                    .chunks_exact(3)
                    .map(|tri| tri.iter().map(|&i| base + i).collect::<Vec<_>>()),
            );
            submeshes.push((first_face..faces.len() as Index).collect());

            log::debug!(
                "OBJ model '{}': {count} vertices, {} faces",
                model.name,
                mesh.indices.len() / 3
            );
        }

        if !all_normals {
            normals = Mesh::generate_normals(&vertices, &faces);
        }
        if !any_uv {
            uv.clear();
        }
        if !any_color {
            colors.clear();
        }

        let mut mesh = Mesh::new(vertices, faces);
        mesh.set_normals(normals);
        mesh.set_uv(uv);
        mesh.set_colors(colors);
        mesh.set_submeshes(submeshes);
        Ok(mesh)
    }
}

/// Append `count` elements from a flat buffer, or `fill` when the buffer
/// does not hold exactly `count` of them
fn append<const N: usize>(target: &mut Vec<[f32; N]>, flat: &[f32], count: usize, fill: [f32; N]) -> bool {
    if flat.len() != count * N {
        target.resize(target.len() + count, fill);
        return false;
    }
    target.extend(
        flat.chunks_exact(N)
            .map(|chunk| std::array::from_fn(|i| chunk[i])),
    );
    true
}

fn append_rgb(target: &mut Vec<[f32; 4]>, flat: &[f32], count: usize) -> bool {
    if flat.len() != count * 3 {
        target.resize(target.len() + count, [1.0; 4]);
        return false;
    }
    target.extend(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2], 1.0]));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const TWO_OBJECTS: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
o tri
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    fn write_obj(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_models_become_submeshes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_obj(&dir, "two.obj", TWO_OBJECTS);
        let mesh = ObjMeshLoader.load(&path).unwrap();

        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.submeshes(), [vec![0, 1], vec![2]]);
        assert_eq!(mesh.faces()[2], vec![4, 5, 6]);
        assert!(mesh.faces().iter().flatten().all(|&i| i < 7));

        // second model has no texcoords
        assert_eq!(mesh.uv_count(), 7);
        assert_eq!(mesh.uv()[6], [0.0, 0.0]);
        assert_eq!(mesh.tangent_count(), 0);
        assert_eq!(mesh.uv2_count(), 0);
    }

    #[test]
    fn test_normals_generated_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_obj(&dir, "two.obj", TWO_OBJECTS);
        let mesh = ObjMeshLoader.load(&path).unwrap();

        assert_eq!(mesh.normal_count(), 7);
        for normal in mesh.normals() {
            assert_relative_eq!(normal[2], 1.0);
        }
    }

    #[test]
    fn test_file_normals_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_obj(
            &dir,
            "tri.obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf 1//1 2//1 3//1\n",
        );
        let mesh = ObjMeshLoader.load(&path).unwrap();

        assert_eq!(mesh.normal_count(), 3);
        assert_relative_eq!(mesh.normals()[0][2], -1.0);
        assert_eq!(mesh.uv_count(), 0);
        assert_eq!(mesh.submesh_count(), 1);
    }

    #[test]
    fn test_missing_file_is_loader_error() {
        let err = ObjMeshLoader.load(Path::new("/nonexistent/mesh.obj")).unwrap_err();
        assert!(matches!(err, MeshError::Loader(_)));
    }
}
