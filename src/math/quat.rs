use super::vec3::Vec3;
use std::ops::Mul;

/// A quaternion `(v, w)`, unit quaternion intended for rotation use but not
/// enforced at construction — callers (the glTF/text loaders) are
/// responsible for only feeding normalized rotations in.
#[derive(Debug, Clone, Copy)]
pub struct Quat {
    pub v: Vec3,
    pub w: f32,
}

impl Quat {
    #[inline(always)]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { v: Vec3::new(x, y, z), w }
    }

    #[inline(always)]
    pub const fn from_vec_w(v: Vec3, w: f32) -> Self {
        Self { v, w }
    }

    #[inline(always)]
    pub const fn identity() -> Self {
        Self::from_vec_w(Vec3::zero(), 1.0)
    }

    /// Conjugate: `(-v, w)`.
    #[inline(always)]
    pub fn conj(self) -> Self {
        Self::from_vec_w(-self.v, self.w)
    }

    /// Hamilton product.
    #[inline(always)]
    pub fn mul_quat(self, rhs: Self) -> Self {
        Self::from_vec_w(
            self.w * rhs.v + rhs.w * self.v + self.v.cross(rhs.v),
            self.w * rhs.w - self.v.dot(rhs.v),
        )
    }

    /// Rotates point `p` by this quaternion: the vector part of
    /// `q * (p, 0) * conj(q)`.
    #[inline(always)]
    pub fn rotate_point(self, p: Vec3) -> Vec3 {
        self.mul_quat(Self::from_vec_w(p, 0.0)).mul_quat(self.conj()).v
    }
}

impl Mul for Quat {
    type Output = Quat;
    #[inline(always)]
    fn mul(self, rhs: Quat) -> Quat {
        self.mul_quat(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_angle(axis: Vec3, radians: f32) -> Quat {
        let half = radians / 2.0;
        Quat::from_vec_w(axis.normalize() * half.sin(), half.cos())
    }

    #[test]
    fn identity_is_noop() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let r = Quat::identity().rotate_point(p);
        assert!((r - p).length() < 1e-5);
    }

    #[test]
    fn conjugate_then_original_round_trips() {
        let q = axis_angle(Vec3::unit_y(), std::f32::consts::FRAC_PI_3);
        let p = Vec3::new(1.0, 0.3, -2.0);
        let rotated = q.rotate_point(p);
        let back = q.conj().rotate_point(rotated);
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn rotate_90_about_z_maps_x_to_y() {
        let q = axis_angle(Vec3::unit_z(), std::f32::consts::FRAC_PI_2);
        let r = q.rotate_point(Vec3::unit_x());
        assert!((r - Vec3::unit_y()).length() < 1e-4);
    }
}
