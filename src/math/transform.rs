use super::quat::Quat;
use super::vec3::Vec3;

/// A 4x4 row-major affine transform. Rows act on column vectors, so
/// `apply` treats a point as `[x, y, z, 1]^T` and reads off the top three
/// rows of the product.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    m: [[f32; 4]; 4],
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Builds from 16 floats in glTF's column-major order, storing the
    /// transpose so that `apply` can treat rows as acting on column
    /// vectors the way the rest of this module expects.
    pub fn from_column_major(raw: &[f32; 16]) -> Self {
        let mut m = [[0.0f32; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                m[row][col] = raw[col * 4 + row];
            }
        }
        Self { m }
    }

    fn from_translation(t: Vec3) -> Self {
        let mut out = Self::identity();
        out.m[0][3] = t.x;
        out.m[1][3] = t.y;
        out.m[2][3] = t.z;
        out
    }

    fn from_scale(s: Vec3) -> Self {
        Self {
            m: [
                [s.x, 0.0, 0.0, 0.0],
                [0.0, s.y, 0.0, 0.0],
                [0.0, 0.0, s.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    fn from_rotation(q: Quat) -> Self {
        let (x, y, z, w) = (q.v.x, q.v.y, q.v.z, q.w);
        Self {
            m: [
                [2.0 * (w * w + x * x) - 1.0, 2.0 * (x * y - w * z), 2.0 * (x * z + w * y), 0.0],
                [2.0 * (x * y + w * z), 2.0 * (w * w + y * y) - 1.0, 2.0 * (y * z - w * x), 0.0],
                [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), 2.0 * (w * w + z * z) - 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Decomposed `T(translation) * R(rotation) * S(scale)`.
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::from_translation(translation)
            .compose(&Self::from_rotation(rotation))
            .compose(&Self::from_scale(scale))
    }

    /// Matrix multiplication: `self * other`.
    pub fn compose(&self, other: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.m[i][k] * other.m[k][j];
                }
                out[i][j] = sum;
            }
        }
        Self { m: out }
    }

    /// Applies the transform to a point (implicit `w = 1`).
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let row = |i: usize| self.m[i][0] * p.x + self.m[i][1] * p.y + self.m[i][2] * p.z + self.m[i][3];
        Vec3::new(row(0), row(1), row(2))
    }

    /// Applies only the linear part (implicit `w = 0`) — for directions,
    /// which must not pick up the translation component.
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        let row = |i: usize| self.m[i][0] * v.x + self.m[i][1] * v.y + self.m[i][2] * v.z;
        Vec3::new(row(0), row(1), row(2))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_apply_is_noop() {
        let p = Vec3::new(1.0, -2.0, 3.5);
        let r = Transform::identity().apply(p);
        assert_abs_diff_eq!(r.x, p.x, epsilon = 1e-6);
        assert_abs_diff_eq!(r.y, p.y, epsilon = 1e-6);
        assert_abs_diff_eq!(r.z, p.z, epsilon = 1e-6);
    }

    #[test]
    fn composition_is_associative_on_cube_corners() {
        let a = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Transform::from_rotation(Quat::new(0.0, 0.0, 0.0, 1.0));
        let c = Transform::from_scale(Vec3::new(2.0, 2.0, 2.0));

        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));

        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    let p = Vec3::new(x, y, z);
                    let lp = left.apply(p);
                    let rp = right.apply(p);
                    assert_abs_diff_eq!(lp.x, rp.x, epsilon = 1e-4);
                    assert_abs_diff_eq!(lp.y, rp.y, epsilon = 1e-4);
                    assert_abs_diff_eq!(lp.z, rp.z, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn column_major_round_trips_translation() {
        // glTF-style column-major 4x4 encoding translation (5, 6, 7).
        #[rustfmt::skip]
        let raw: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            5.0, 6.0, 7.0, 1.0,
        ];
        let t = Transform::from_column_major(&raw);
        let p = t.apply(Vec3::zero());
        assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 6.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, 7.0, epsilon = 1e-6);
    }
}
