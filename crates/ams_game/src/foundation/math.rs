//! Math types
//!
//! Thin nalgebra aliases used by transforms, cameras and mesh helpers.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Convert degrees to radians
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Build a translation * rotation * scale matrix
pub fn compose_trs(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Normalized face normal of the triangle `(a, b, c)`
///
/// Degenerate triangles give a zero vector instead of NaNs.
pub fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let a = Vec3::from(a);
    let edge1 = Vec3::from(b) - a;
    let edge2 = Vec3::from(c) - a;
    let normal = edge1.cross(&edge2);
    normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros).into()
}
