//! 3x3 matrix for inertia tensors.

use crate::float::Float;
use crate::vec::Vec3;
use core::ops::{Add, Sub};

/// Row-major 3x3 matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Mat3<F: Float> {
    pub rows: [Vec3<F>; 3],
}

impl<F: Float> Mat3<F> {
    pub fn from_rows(r0: Vec3<F>, r1: Vec3<F>, r2: Vec3<F>) -> Self {
        Mat3 { rows: [r0, r1, r2] }
    }

    pub fn zero() -> Self {
        Self::from_rows(Vec3::zero(), Vec3::zero(), Vec3::zero())
    }

    pub fn identity() -> Self {
        Self::from_rows(Vec3::axis(0), Vec3::axis(1), Vec3::axis(2))
    }

    /// Outer product `a ⊗ b` (entry `ij` is `a_i * b_j`).
    pub fn outer(a: Vec3<F>, b: Vec3<F>) -> Self {
        Self::from_rows(b.scale(a.x), b.scale(a.y), b.scale(a.z))
    }

    pub fn scale(self, s: F) -> Self {
        Self::from_rows(self.rows[0].scale(s), self.rows[1].scale(s), self.rows[2].scale(s))
    }

    pub fn mul_vec(self, v: Vec3<F>) -> Vec3<F> {
        Vec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }

    pub fn determinant(self) -> F {
        self.rows[0].dot(self.rows[1].cross(self.rows[2]))
    }

    /// Inverse via the adjugate. `None` when `|det| < epsilon`.
    pub fn try_inverse(self, epsilon: F) -> Option<Self> {
        let det = self.determinant();
        if det.is_near_zero(epsilon) {
            return None;
        }
        let [r0, r1, r2] = self.rows;
        // Columns of the inverse are the cross products of row pairs.
        let c0 = r1.cross(r2);
        let c1 = r2.cross(r0);
        let c2 = r0.cross(r1);
        let inv_det = F::one() / det;
        Some(
            Self::from_rows(
                Vec3::new(c0.x, c1.x, c2.x),
                Vec3::new(c0.y, c1.y, c2.y),
                Vec3::new(c0.z, c1.z, c2.z),
            )
            .scale(inv_det),
        )
    }
}

impl<F: Float> Add for Mat3<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::from_rows(
            self.rows[0] + rhs.rows[0],
            self.rows[1] + rhs.rows[1],
            self.rows[2] + rhs.rows[2],
        )
    }
}

impl<F: Float> Sub for Mat3<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::from_rows(
            self.rows[0] - rhs.rows[0],
            self.rows[1] - rhs.rows[1],
            self.rows[2] - rhs.rows[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_determinant() {
        assert_eq!(Mat3::<f64>::identity().determinant(), 1.0);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = Mat3::from_rows(
            Vec3::new(4.0f64, 1.0, 0.5),
            Vec3::new(1.0, 3.0, -1.0),
            Vec3::new(0.5, -1.0, 2.0),
        );
        let inv = m.try_inverse(1e-12).unwrap();
        for axis in 0..3 {
            let e = Vec3::axis(axis);
            let back = m.mul_vec(inv.mul_vec(e));
            assert!((back - e).length() < 1e-12, "axis {}: {:?}", axis, back);
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Mat3::outer(Vec3::new(1.0f32, 2.0, 3.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(m.try_inverse(1e-8).is_none());
    }

    #[test]
    fn outer_product_entries() {
        let m = Mat3::outer(Vec3::new(1.0f32, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.rows[1], Vec3::new(8.0, 10.0, 12.0));
    }
}
