//! Camera component
//!
//! Adding a camera to an entity registers it in the scene's camera index.

use crate::ecs::Component;
use crate::foundation::math::{deg_to_rad, Mat4};

/// Perspective camera; the projection is recomputed by every setter
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl Component for Camera {
    fn as_camera(&self) -> Option<&Camera> {
        Some(self)
    }

    fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        Some(self)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 1.0, 0.1, 100.0)
    }
}

impl Camera {
    /// Create a camera; `fov` is the vertical field of view in degrees
    pub fn new(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect_ratio,
            near,
            far,
            projection: Mat4::identity(),
        };
        camera.update_projection();
        camera
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::new_perspective(
            self.aspect_ratio,
            deg_to_rad(self.fov),
            self.near,
            self.far,
        );
    }

    /// Vertical field of view in degrees
    pub const fn fov(&self) -> f32 {
        self.fov
    }

    /// Width / height
    pub const fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Near clip distance
    pub const fn near(&self) -> f32 {
        self.near
    }

    /// Far clip distance
    pub const fn far(&self) -> f32 {
        self.far
    }

    /// Projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Set the vertical field of view in degrees
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.update_projection();
    }

    /// Set the aspect ratio
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection();
    }

    /// Set the near clip distance
    pub fn set_near(&mut self, near: f32) {
        self.near = near;
        self.update_projection();
    }

    /// Set the far clip distance
    pub fn set_far(&mut self, far: f32) {
        self.far = far;
        self.update_projection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera() {
        let camera = Camera::default();
        assert_eq!(camera.fov(), 45.0);
        assert_eq!(camera.aspect_ratio(), 1.0);
        assert_eq!(camera.near(), 0.1);
        assert_eq!(camera.far(), 100.0);
    }

    #[test]
    fn test_setters_recompute_projection() {
        let mut camera = Camera::default();
        let before = *camera.projection();

        camera.set_aspect_ratio(2.0);
        assert_ne!(*camera.projection(), before);

        let focal = 1.0 / (deg_to_rad(45.0) / 2.0).tan();
        assert_relative_eq!(camera.projection().m22, focal, epsilon = 1e-5);
        assert_relative_eq!(camera.projection().m11, focal / 2.0, epsilon = 1e-5);
    }
}
