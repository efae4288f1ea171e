//! Mesh data model, the `.ams` format and the loader registry
//!
//! A [`Mesh`] is a set of index-aligned attribute buffers. Every buffer other
//! than `vertices` is either empty or as long as `vertices`; faces index into
//! `vertices` and submeshes index into `faces`. These are not validated.
//!
//! Files are read through a [`MeshLoaderRegistry`] keyed by extension. The
//! first-party `.ams` format is always available; see [`ams`] for its layout.

pub mod ams;
mod error;
mod loader;
pub mod obj;

pub use ams::AmsMeshLoader;
pub use error::MeshError;
pub use loader::{MeshLoader, MeshLoaderRegistry};
pub use obj::ObjMeshLoader;

use crate::foundation::math::face_normal;
use std::path::Path;

/// Vertex index type
pub type Index = u32;

/// Position or direction
pub type Vec3Elem = [f32; 3];
/// Texture coordinate
pub type UvElem = [f32; 2];
/// RGBA color
pub type ColorElem = [f32; 4];
/// Variable-length list of indices (face or submesh)
pub type IndexList = Vec<Index>;

macro_rules! mesh_buffer {
    ($field:ident, $setter:ident, $count:ident, $elem:ty, $what:literal) => {
        #[doc = concat!("The ", $what)]
        pub fn $field(&self) -> &[$elem] {
            &self.$field
        }

        #[doc = concat!("Replace the ", $what)]
        pub fn $setter(&mut self, $field: Vec<$elem>) {
            self.$field = $field;
        }

        #[doc = concat!("Number of ", $what)]
        pub fn $count(&self) -> usize {
            self.$field.len()
        }
    };
}

/// Renderable mesh as parallel attribute buffers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3Elem>,
    normals: Vec<Vec3Elem>,
    tangents: Vec<Vec3Elem>,
    uv: Vec<UvElem>,
    uv2: Vec<UvElem>,
    uv3: Vec<UvElem>,
    uv4: Vec<UvElem>,
    colors: Vec<ColorElem>,
    faces: Vec<IndexList>,
    submeshes: Vec<IndexList>,
}

impl Mesh {
    /// Mesh from positions and faces
    pub fn new(vertices: Vec<Vec3Elem>, faces: Vec<IndexList>) -> Self {
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    mesh_buffer!(vertices, set_vertices, vertex_count, Vec3Elem, "vertex positions");
    mesh_buffer!(normals, set_normals, normal_count, Vec3Elem, "vertex normals");
    mesh_buffer!(tangents, set_tangents, tangent_count, Vec3Elem, "vertex tangents");
    mesh_buffer!(uv, set_uv, uv_count, UvElem, "first texture coordinate set");
    mesh_buffer!(uv2, set_uv2, uv2_count, UvElem, "second texture coordinate set");
    mesh_buffer!(uv3, set_uv3, uv3_count, UvElem, "third texture coordinate set");
    mesh_buffer!(uv4, set_uv4, uv4_count, UvElem, "fourth texture coordinate set");
    mesh_buffer!(colors, set_colors, color_count, ColorElem, "vertex colors");
    mesh_buffer!(faces, set_faces, face_count, IndexList, "faces");
    mesh_buffer!(submeshes, set_submeshes, submesh_count, IndexList, "submeshes (lists of face indices)");

    /// Whether the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Load a mesh through the registry, dispatching on the file extension
    pub fn from_file(
        registry: &mut MeshLoaderRegistry,
        path: impl AsRef<Path>,
    ) -> Result<Self, MeshError> {
        registry.load(path.as_ref())
    }

    /// Write the mesh as an `.ams` file
    pub fn save_to_file(&self, path: impl AsRef<Path>, binary: bool) -> Result<(), MeshError> {
        ams::save(self, path.as_ref(), binary)
    }

    /// Per-vertex normals from face normals
    ///
    /// Each face with at least three indices assigns its normal to every
    /// vertex it references; later faces overwrite earlier ones. Vertices
    /// not referenced keep a zero normal. Faces referencing missing vertices
    /// are skipped.
    pub fn generate_normals(vertices: &[Vec3Elem], faces: &[IndexList]) -> Vec<Vec3Elem> {
        let mut normals = vec![[0.0; 3]; vertices.len()];
        for face in faces {
            if face.len() < 3 {
                continue;
            }
            let corners: Option<Vec<Vec3Elem>> = face
                .iter()
                .map(|&i| vertices.get(i as usize).copied())
                .collect();
            let Some(corners) = corners else {
                log::warn!("generate_normals: face {face:?} references a missing vertex");
                continue;
            };
            let normal = face_normal(corners[0], corners[1], corners[2]);
            for &i in face {
                normals[i as usize] = normal;
            }
        }
        normals
    }

    /// Fan-triangulate faces with more than three indices
    ///
    /// Faces with fewer than three indices are dropped. Submesh face indices
    /// are remapped to the new faces.
    #[must_use]
    pub fn triangulate(&self) -> Self {
        let mut faces = Vec::with_capacity(self.faces.len());
        let mut remap: Vec<Vec<Index>> = Vec::with_capacity(self.faces.len());

        for face in &self.faces {
            let mut produced = Vec::new();
            if face.len() >= 3 {
                for k in 1..face.len() - 1 {
                    produced.push(faces.len() as Index);
                    faces.push(vec![face[0], face[k], face[k + 1]]);
                }
            }
            remap.push(produced);
        }

        let submeshes = self
            .submeshes
            .iter()
            .map(|submesh| {
                submesh
                    .iter()
                    .filter_map(|&f| remap.get(f as usize))
                    .flatten()
                    .copied()
                    .collect()
            })
            .collect();

        Self {
            faces,
            submeshes,
            ..self.clone()
        }
    }
}
