//! Scalar position constraints: distance, anchor and caller-defined functions.
//!
//! Every constraint is a function `C(p_0, ..., p_{n-1})` over an ordered set of
//! particle positions. Equality constraints are driven toward `C == 0`;
//! inequality constraints are only corrected while `C < 0`.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec3;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Step of the central finite differences used when a constraint has no
/// analytic gradient. Expect around 1e-3 relative error in `f32`.
pub const FD_EPSILON: f32 = 1e-4;

/// Whether a constraint targets `C == 0` or `C >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintType {
    Equality,
    Inequality,
}

impl ConstraintType {
    /// True when `value` needs no correction under this type.
    pub fn is_satisfied<F: Float>(self, value: F) -> bool {
        match self {
            ConstraintType::Equality => false,
            ConstraintType::Inequality => value >= F::zero(),
        }
    }
}

/// Caller-defined constraint behaviour.
///
/// `points` holds the positions of the constraint's particles in declaration
/// order. Return `None` from `gradient` to fall back to finite differences.
pub trait ConstraintFunction<F: Float> {
    fn evaluate(&self, points: &[Vec3<F>]) -> F;

    fn gradient(&self, _points: &[Vec3<F>], _index: usize) -> Option<Vec3<F>> {
        None
    }
}

impl<F, E> ConstraintFunction<F> for E
where
    F: Float,
    E: Fn(&[Vec3<F>]) -> F,
{
    fn evaluate(&self, points: &[Vec3<F>]) -> F {
        self(points)
    }
}

/// Constraint function with an analytic gradient, built from two closures.
pub struct FnConstraint<E, G> {
    pub evaluate: E,
    pub gradient: G,
}

impl<E, G> FnConstraint<E, G> {
    pub fn new(evaluate: E, gradient: G) -> Self {
        FnConstraint { evaluate, gradient }
    }
}

impl<F, E, G> ConstraintFunction<F> for FnConstraint<E, G>
where
    F: Float,
    E: Fn(&[Vec3<F>]) -> F,
    G: Fn(&[Vec3<F>], usize) -> Vec3<F>,
{
    fn evaluate(&self, points: &[Vec3<F>]) -> F {
        (self.evaluate)(points)
    }

    fn gradient(&self, points: &[Vec3<F>], index: usize) -> Option<Vec3<F>> {
        Some((self.gradient)(points, index))
    }
}

/// The behaviour of a constraint. Parameters are owned by value.
pub enum ConstraintKind<F: Float> {
    /// `|p0 - p1| - rest_length`.
    Distance { rest_length: F },
    /// `|p0 - target|`, pulls a single particle onto a world point.
    Anchor { target: Vec3<F> },
    Custom(Box<dyn ConstraintFunction<F>>),
}

impl<F: Float> fmt::Debug for ConstraintKind<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Distance { rest_length } => {
                f.debug_struct("Distance").field("rest_length", rest_length).finish()
            }
            ConstraintKind::Anchor { target } => {
                f.debug_struct("Anchor").field("target", target).finish()
            }
            ConstraintKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A constraint over an ordered list of particle indices.
#[derive(Debug)]
pub struct Constraint<F: Float> {
    kind: ConstraintKind<F>,
    indices: Vec<usize>,
    stiffness: F,
    ty: ConstraintType,
}

impl<F: Float> Constraint<F> {
    pub fn new(kind: ConstraintKind<F>, indices: Vec<usize>, stiffness: F, ty: ConstraintType) -> Self {
        Constraint { kind, indices, stiffness, ty }
    }

    pub fn distance(rest_length: F, indices: [usize; 2], stiffness: F, ty: ConstraintType) -> Self {
        Self::new(ConstraintKind::Distance { rest_length }, indices.to_vec(), stiffness, ty)
    }

    pub fn anchor(index: usize, target: Vec3<F>, stiffness: F) -> Self {
        Self::new(
            ConstraintKind::Anchor { target },
            alloc::vec![index],
            stiffness,
            ConstraintType::Equality,
        )
    }

    pub fn custom<C>(function: C, indices: Vec<usize>, stiffness: F, ty: ConstraintType) -> Self
    where
        C: ConstraintFunction<F> + 'static,
    {
        Self::new(ConstraintKind::Custom(Box::new(function)), indices, stiffness, ty)
    }

    pub fn kind(&self) -> &ConstraintKind<F> { &self.kind }
    pub fn indices(&self) -> &[usize] { &self.indices }
    pub fn cardinality(&self) -> usize { self.indices.len() }
    pub fn stiffness(&self) -> F { self.stiffness }
    pub fn constraint_type(&self) -> ConstraintType { self.ty }

    /// Check the constraint against a particle count before it is stored.
    pub fn validate(&self, particle_count: usize) -> Result<(), PhysicsError> {
        if self.indices.is_empty() {
            return Err(PhysicsError::EmptyConstraint);
        }
        if !self.stiffness.is_finite() || self.stiffness < F::zero() || self.stiffness > F::one() {
            return Err(PhysicsError::InvalidStiffness);
        }
        if let ConstraintKind::Distance { rest_length } = self.kind {
            if !rest_length.is_finite() || rest_length < F::zero() || self.indices.len() != 2 {
                return Err(PhysicsError::InvalidRestLength);
            }
        }
        if let ConstraintKind::Anchor { target } = self.kind {
            if !target.is_finite() {
                return Err(PhysicsError::NonFiniteState);
            }
        }
        for &index in &self.indices {
            if index >= particle_count {
                return Err(PhysicsError::ParticleOutOfBounds { index, count: particle_count });
            }
        }
        Ok(())
    }

    /// Constraint value on `points` (ordered like [`indices`](Self::indices)).
    pub fn evaluate(&self, points: &[Vec3<F>]) -> F {
        match &self.kind {
            ConstraintKind::Distance { rest_length } => points[0].distance(points[1]) - *rest_length,
            ConstraintKind::Anchor { target } => points[0].distance(*target),
            ConstraintKind::Custom(function) => function.evaluate(points),
        }
    }

    /// Gradient of the constraint with respect to the `index`-th point.
    pub fn gradient(&self, points: &[Vec3<F>], index: usize) -> Vec3<F> {
        let mut scratch = Vec::new();
        self.gradient_with_scratch(points, index, &mut scratch)
    }

    /// Same as [`gradient`](Self::gradient), reusing `scratch` for the
    /// finite-difference probe.
    pub(crate) fn gradient_with_scratch(
        &self,
        points: &[Vec3<F>],
        index: usize,
        scratch: &mut Vec<Vec3<F>>,
    ) -> Vec3<F> {
        match &self.kind {
            ConstraintKind::Distance { .. } => {
                let dir = (points[0] - points[1]).normalize();
                if index == 0 { dir } else { -dir }
            }
            ConstraintKind::Anchor { target } => (points[0] - *target).normalize(),
            ConstraintKind::Custom(function) => match function.gradient(points, index) {
                Some(gradient) => gradient,
                None => {
                    scratch.clear();
                    scratch.extend_from_slice(points);
                    finite_difference_gradient(|p| function.evaluate(p), scratch, index)
                }
            },
        }
    }
}

/// Central-difference gradient of `evaluate` with respect to `points[index]`,
/// with step [`FD_EPSILON`] per axis.
///
/// `points` is perturbed in place and restored before returning.
pub fn finite_difference_gradient<F, E>(evaluate: E, points: &mut [Vec3<F>], index: usize) -> Vec3<F>
where
    F: Float,
    E: Fn(&[Vec3<F>]) -> F,
{
    let h = F::from_f32(FD_EPSILON);
    let origin = points[index];
    let mut gradient = Vec3::zero();
    for axis in 0..3 {
        let step = Vec3::axis(axis).scale(h);
        points[index] = origin + step;
        let forward = evaluate(&*points);
        points[index] = origin - step;
        let backward = evaluate(&*points);
        gradient.set_component(axis, (forward - backward) / (F::two() * h));
    }
    points[index] = origin;
    gradient
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> [Vec3<f64>; 2] {
        [Vec3::new(1.0, 2.0, 0.5), Vec3::new(-0.5, 0.0, 1.5)]
    }

    #[test]
    fn distance_value_and_gradient() {
        let c = Constraint::distance(1.0f64, [0, 1], 1.0, ConstraintType::Equality);
        let p = [Vec3::new(3.0, 0.0, 0.0), Vec3::zero()];
        assert!((c.evaluate(&p) - 2.0).abs() < 1e-12);
        assert_eq!(c.gradient(&p, 0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(c.gradient(&p, 1), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn coincident_points_have_zero_gradient() {
        let c = Constraint::distance(1.0f32, [0, 1], 1.0, ConstraintType::Equality);
        let p = [Vec3::zero(), Vec3::zero()];
        assert_eq!(c.gradient(&p, 0), Vec3::zero());
    }

    #[test]
    fn finite_differences_match_analytic_distance() {
        let analytic = Constraint::distance(0.7f64, [0, 1], 1.0, ConstraintType::Equality);
        let numeric = Constraint::<f64>::custom(
            |p: &[Vec3<f64>]| p[0].distance(p[1]) - 0.7,
            alloc::vec![0, 1],
            1.0,
            ConstraintType::Equality,
        );
        let p = pair();
        for k in 0..2 {
            let a = analytic.gradient(&p, k);
            let n = numeric.gradient(&p, k);
            assert!((a - n).length() < 1e-6, "point {}: analytic {:?} numeric {:?}", k, a, n);
        }
    }

    #[test]
    fn finite_differences_in_f32_within_tolerance() {
        let numeric = Constraint::<f32>::custom(
            |p: &[Vec3<f32>]| p[0].distance(p[1]) - 1.0,
            alloc::vec![0, 1],
            1.0,
            ConstraintType::Equality,
        );
        let p = [Vec3::new(1.0f32, 2.0, 0.5), Vec3::new(-0.5, 0.0, 1.5)];
        let exact = (p[0] - p[1]).normalize();
        let n = numeric.gradient(&p, 0);
        assert!((n - exact).length() < 1e-2, "numeric {:?} exact {:?}", n, exact);
    }

    #[test]
    fn analytic_custom_gradient_is_used() {
        let c = Constraint::<f64>::custom(
            FnConstraint::new(
                |p: &[Vec3<f64>]| p[0].y,
                |_: &[Vec3<f64>], _| Vec3::new(0.0, 42.0, 0.0),
            ),
            alloc::vec![0],
            1.0,
            ConstraintType::Inequality,
        );
        assert_eq!(c.gradient(&[Vec3::zero()], 0), Vec3::new(0.0, 42.0, 0.0));
    }

    #[test]
    fn finite_difference_restores_points() {
        let mut p = pair();
        let before = p;
        let _ = finite_difference_gradient(|q: &[Vec3<f64>]| q[0].dot(q[1]), &mut p, 1);
        assert_eq!(p, before);
    }

    #[test]
    fn validate_rejects_bad_input() {
        let c = Constraint::distance(1.0f32, [0, 5], 1.0, ConstraintType::Equality);
        assert_eq!(c.validate(2), Err(PhysicsError::ParticleOutOfBounds { index: 5, count: 2 }));

        let c = Constraint::distance(1.0f32, [0, 1], 1.5, ConstraintType::Equality);
        assert_eq!(c.validate(2), Err(PhysicsError::InvalidStiffness));

        let c = Constraint::distance(-1.0f32, [0, 1], 1.0, ConstraintType::Equality);
        assert_eq!(c.validate(2), Err(PhysicsError::InvalidRestLength));

        let c = Constraint::<f32>::custom(|_: &[Vec3<f32>]| 0.0, Vec::new(), 1.0, ConstraintType::Equality);
        assert_eq!(c.validate(2), Err(PhysicsError::EmptyConstraint));
    }

    #[test]
    fn inequality_satisfaction() {
        assert!(ConstraintType::Inequality.is_satisfied(0.0f32));
        assert!(!ConstraintType::Inequality.is_satisfied(-1e-6f32));
        assert!(!ConstraintType::Equality.is_satisfied(0.0f32));
    }
}
