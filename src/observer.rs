//! Step observer trait for monitoring simulation progress.

use crate::damping::DampingOutcome;
use crate::solver::SolveReport;

/// Trait for observing simulation steps.
///
/// Implement this trait to monitor solver progress (debugging, visualization,
/// profiling, or logging through whatever sink the host uses). All methods
/// have default no-op implementations.
pub trait StepObserver<F> {
    /// Called after external forces have been added to velocities.
    fn on_external_forces(&mut self) {}

    /// Called after the damping stage, with what it did.
    fn on_damping(&mut self, _outcome: DampingOutcome) {}

    /// Called once predicted positions are ready.
    fn on_predict(&mut self) {}

    /// Called after each solver iteration with the mean correction length
    /// of the constraints visited in that iteration.
    fn on_constraint_iteration(&mut self, _iteration: usize, _mean_correction: F) {}

    /// Called when a constraint is skipped because it cannot move anything
    /// (all particles fixed, or a zero gradient).
    fn on_degenerate_constraint(&mut self, _constraint: usize) {}

    /// Called when the solver finishes a sub-step.
    fn on_solve_complete(&mut self, _report: &SolveReport<F>) {}

    /// Called when an `update` call is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl<F> StepObserver<F> for NoOpStepObserver {}
