//! Pinhole camera: an orthonormal `(right, up, forward)` basis placed at
//! `position`, parameterized by horizontal field of view.

use crate::math::{Point3, Ray, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    pub fov_x: f32,
}

impl Camera {
    pub fn new(position: Point3, right: Vec3, up: Vec3, forward: Vec3, fov_x: f32) -> Self {
        Self { position, right, up, forward, fov_x }
    }

    /// Generates the primary ray through sub-pixel coordinates `(nx, ny)`
    /// in pixel space (not normalized), against an image of the given
    /// `width` and `height`.
    pub fn ray_through(&self, nx: f32, ny: f32, width: u32, height: u32) -> Ray {
        let tan_x = (self.fov_x / 2.0).tan();
        let tan_y = tan_x * height as f32 / width as f32;

        let cx = 2.0 * nx / width as f32 - 1.0;
        let cy = 2.0 * ny / height as f32 - 1.0;

        let direction = self.right * (cx * tan_x) - self.up * (cy * tan_y) + self.forward;
        Ray::new(self.position, direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::zero(), Vec3::unit_x(), Vec3::unit_y(), -Vec3::unit_z(), std::f32::consts::FRAC_PI_2)
    }
}
