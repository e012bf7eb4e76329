//! Gauss-Seidel constraint projection.
//!
//! Each iteration visits the constraints in declaration order and moves the
//! predicted positions of their particles along the constraint gradient,
//! distributing the correction by inverse mass. Later constraints see the
//! corrections of earlier ones within the same iteration.

use crate::config::{StiffnessMode, Termination};
use crate::constraint::Constraint;
use crate::float::Float;
use crate::observer::StepObserver;
use crate::vec::Vec3;
use alloc::vec::Vec;

/// Gradient denominators (Σ|∇C|²) below this are treated as zero.
pub const DEGENERATE_EPSILON: f32 = 1e-12;

/// Summary of one [`ConstraintSolver::project`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveReport<F> {
    /// Iterations actually run.
    pub iterations: usize,
    /// Mean correction length per constraint in the last iteration.
    pub mean_correction: F,
    /// True when a convergence policy stopped early, or there was nothing to solve.
    pub converged: bool,
}

/// Result of projecting a single constraint once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Projection<F> {
    /// Inequality already satisfied; nothing moved.
    Satisfied,
    /// No particle can move or the gradient vanished; nothing moved.
    Degenerate,
    /// Positions were moved by this total correction length.
    Corrected(F),
}

/// Iterative projection solver. Holds scratch buffers reused across calls.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSolver<F: Float> {
    points: Vec<Vec3<F>>,
    gradients: Vec<Vec3<F>>,
    probe: Vec<Vec3<F>>,
}

impl<F: Float> ConstraintSolver<F> {
    pub fn new() -> Self {
        ConstraintSolver {
            points: Vec::new(),
            gradients: Vec::new(),
            probe: Vec::new(),
        }
    }

    /// Project `predicted` onto `constraints` until `termination` says stop.
    ///
    /// # Panics
    ///
    /// Every constraint index must be in range for both `predicted` and
    /// `inv_masses`. [`Simulation`](crate::Simulation) guarantees this by
    /// validating constraints when they are added.
    pub fn project<O: StepObserver<F>>(
        &mut self,
        constraints: &[Constraint<F>],
        predicted: &mut [Vec3<F>],
        inv_masses: &[F],
        termination: Termination<F>,
        stiffness_mode: StiffnessMode,
        observer: &mut O,
    ) -> SolveReport<F> {
        let max_iterations = termination.max_iterations();
        if constraints.is_empty() || max_iterations == 0 {
            let report = SolveReport { iterations: 0, mean_correction: F::zero(), converged: true };
            observer.on_solve_complete(&report);
            return report;
        }

        let count = F::from_usize(constraints.len());
        let mut previous_mean: Option<F> = None;
        let mut report = SolveReport { iterations: 0, mean_correction: F::zero(), converged: false };

        for iteration in 0..max_iterations {
            let mut total = F::zero();
            for (j, constraint) in constraints.iter().enumerate() {
                let factor = stiffness_mode.factor(constraint.stiffness(), max_iterations);
                match self.project_constraint(constraint, predicted, inv_masses, factor) {
                    Projection::Corrected(length) => total = total + length,
                    Projection::Degenerate => observer.on_degenerate_constraint(j),
                    Projection::Satisfied => {}
                }
            }
            let mean = total / count;
            observer.on_constraint_iteration(iteration, mean);
            report.iterations = iteration + 1;
            report.mean_correction = mean;

            if let Termination::Converged { tolerance, .. } = termination {
                if let Some(previous) = previous_mean {
                    if (mean - previous).abs() < tolerance {
                        report.converged = true;
                        break;
                    }
                }
                previous_mean = Some(mean);
            }
        }

        observer.on_solve_complete(&report);
        report
    }

    /// Project one constraint, scaling its correction by `factor`.
    pub(crate) fn project_constraint(
        &mut self,
        constraint: &Constraint<F>,
        predicted: &mut [Vec3<F>],
        inv_masses: &[F],
        factor: F,
    ) -> Projection<F> {
        let indices = constraint.indices();

        self.points.clear();
        let mut total_weight = F::zero();
        for &index in indices {
            self.points.push(predicted[index]);
            total_weight = total_weight + inv_masses[index];
        }

        let value = constraint.evaluate(&self.points);
        if constraint.constraint_type().is_satisfied(value) {
            return Projection::Satisfied;
        }
        if total_weight <= F::zero() {
            return Projection::Degenerate;
        }

        self.gradients.clear();
        let mut denominator = F::zero();
        for k in 0..indices.len() {
            let gradient = constraint.gradient_with_scratch(&self.points, k, &mut self.probe);
            denominator = denominator + gradient.length_sq();
            self.gradients.push(gradient);
        }
        if denominator < F::from_f32(DEGENERATE_EPSILON) {
            return Projection::Degenerate;
        }

        let s = value / denominator;
        let n = F::from_usize(indices.len());
        let mut length = F::zero();
        for (k, &index) in indices.iter().enumerate() {
            let weight = n * inv_masses[index] / total_weight;
            let delta = self.gradients[k].scale(-s * weight * factor);
            predicted[index] += delta;
            length = length + delta.length();
        }
        Projection::Corrected(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintType;
    use crate::observer::NoOpStepObserver;
    use alloc::vec;

    #[test]
    #[should_panic]
    fn unvalidated_index_panics() {
        let constraints = vec![Constraint::distance(1.0f64, [0, 5], 1.0, ConstraintType::Equality)];
        let mut predicted = vec![Vec3::zero(), Vec3::new(2.0, 0.0, 0.0)];
        ConstraintSolver::new().project(
            &constraints,
            &mut predicted,
            &[1.0, 1.0],
            Termination::FixedIterations(1),
            StiffnessMode::Linear,
            &mut NoOpStepObserver,
        );
    }

    #[test]
    fn distance_with_one_fixed_end_solves_in_one_pass() {
        let c = Constraint::distance(1.0f64, [0, 1], 1.0, ConstraintType::Equality);
        let mut predicted = [Vec3::zero(), Vec3::new(1.5, 0.0, 0.0)];
        let inv = [0.0, 1.0];
        let mut solver = ConstraintSolver::new();
        let result = solver.project_constraint(&c, &mut predicted, &inv, 1.0);
        assert_eq!(result, Projection::Corrected(0.5));
        assert_eq!(predicted[0], Vec3::zero());
        assert!((predicted[1].x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn equal_masses_share_the_correction() {
        let c = Constraint::distance(1.0f64, [0, 1], 1.0, ConstraintType::Equality);
        let mut predicted = [Vec3::zero(), Vec3::new(2.0, 0.0, 0.0)];
        let mut solver = ConstraintSolver::new();
        solver.project_constraint(&c, &mut predicted, &[1.0, 1.0], 1.0);
        assert!((predicted[0].x - 0.5).abs() < 1e-12);
        assert!((predicted[1].x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn all_fixed_is_degenerate() {
        let c = Constraint::distance(1.0f32, [0, 1], 1.0, ConstraintType::Equality);
        let mut predicted = [Vec3::zero(), Vec3::new(3.0, 0.0, 0.0)];
        let mut solver = ConstraintSolver::new();
        let result = solver.project_constraint(&c, &mut predicted, &[0.0, 0.0], 1.0);
        assert_eq!(result, Projection::Degenerate);
        assert_eq!(predicted[1].x, 3.0);
    }

    #[test]
    fn satisfied_inequality_is_skipped() {
        let c = Constraint::distance(1.0f64, [0, 1], 1.0, ConstraintType::Inequality);
        let mut predicted = [Vec3::zero(), Vec3::new(2.0, 0.0, 0.0)];
        let before = predicted;
        let mut solver = ConstraintSolver::new();
        let result = solver.project_constraint(&c, &mut predicted, &[1.0, 1.0], 1.0);
        assert_eq!(result, Projection::Satisfied);
        assert_eq!(predicted, before);
    }

    #[test]
    fn linear_stiffness_scales_correction() {
        let c = Constraint::distance(1.0f64, [0, 1], 0.5, ConstraintType::Equality);
        let mut predicted = [Vec3::zero(), Vec3::new(2.0, 0.0, 0.0)];
        let mut solver = ConstraintSolver::new();
        solver.project(
            core::slice::from_ref(&c),
            &mut predicted,
            &[0.0, 1.0],
            Termination::FixedIterations(1),
            StiffnessMode::Linear,
            &mut NoOpStepObserver,
        );
        assert!((predicted[1].x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn convergence_policy_stops_early() {
        let constraints = vec![
            Constraint::distance(1.0f64, [0, 1], 1.0, ConstraintType::Equality),
            Constraint::distance(1.0f64, [1, 2], 1.0, ConstraintType::Equality),
        ];
        let mut predicted = [Vec3::zero(), Vec3::new(1.3, 0.2, 0.0), Vec3::new(2.0, 1.0, 0.0)];
        let mut solver = ConstraintSolver::new();
        let report = solver.project(
            &constraints,
            &mut predicted,
            &[0.0, 1.0, 1.0],
            Termination::Converged { tolerance: 1e-9, max_iterations: 500 },
            StiffnessMode::Linear,
            &mut NoOpStepObserver,
        );
        assert!(report.converged);
        assert!(report.iterations < 500, "took {} iterations", report.iterations);
        assert!((predicted[0].distance(predicted[1]) - 1.0).abs() < 1e-6);
    }
}
