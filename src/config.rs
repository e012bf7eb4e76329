//! Configuration types for the simulation step and constraint solver.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard gravity, m/s².
pub const STANDARD_GRAVITY: f32 = 9.807;

/// Default projection budget per step.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Default tolerance on the change of mean correction between iterations.
pub const DEFAULT_CONVERGENCE_TOLERANCE: f32 = 1e-7;

/// How the solver decides it has done enough iterations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination<F: Float> {
    /// Always run exactly this many iterations.
    FixedIterations(usize),
    /// Stop when the mean per-constraint correction changes by less than
    /// `tolerance` between consecutive iterations, or after `max_iterations`.
    Converged { tolerance: F, max_iterations: usize },
}

impl<F: Float> Termination<F> {
    /// Upper bound on iterations for either policy.
    pub fn max_iterations(&self) -> usize {
        match *self {
            Termination::FixedIterations(n) => n,
            Termination::Converged { max_iterations, .. } => max_iterations,
        }
    }
}

/// How a constraint's stiffness scales its position correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StiffnessMode {
    /// Stiffness is carried but never applied; every correction is full.
    Ignore,
    /// Corrections are multiplied by `stiffness`.
    Linear,
    /// Corrections are multiplied by `1 - (1 - stiffness)^(1 / iterations)`,
    /// so the effective stiffness does not depend on the iteration budget.
    IterationCorrected,
}

impl StiffnessMode {
    /// Multiplier applied to a correction for a constraint of `stiffness`.
    pub fn factor<F: Float>(self, stiffness: F, iterations: usize) -> F {
        match self {
            StiffnessMode::Ignore => F::one(),
            StiffnessMode::Linear => stiffness,
            StiffnessMode::IterationCorrected => {
                let n = F::from_usize(iterations.max(1));
                F::one() - (F::one() - stiffness).powf(F::one() / n)
            }
        }
    }
}

/// Configuration for the simulation step.
///
/// # Builder Pattern
/// ```
/// use pbdsim::config::SolverConfig;
/// use pbdsim::vec::Vec3;
///
/// let config: SolverConfig<f32> = SolverConfig::new()
///     .with_gravity(Vec3::new(0.0, -9.81, 0.0))
///     .with_damping(0.5)
///     .with_convergence(1e-6, 200)
///     .with_sub_steps(2);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig<F: Float> {
    /// Acceleration applied to every free particle. Default: (0, -9.807, 0).
    pub gravity: Vec3<F>,
    /// Rigid damping factor in [0, 1]. 1.0 = fully rigid velocities,
    /// 0.0 = damping stage disabled. Default: 1.0.
    pub damping: F,
    /// Solver termination policy. Default: 1000 fixed iterations.
    pub termination: Termination<F>,
    /// Use of per-constraint stiffness. Default: `Linear`.
    pub stiffness_mode: StiffnessMode,
    /// Number of sub-steps per `update`. Default: 1.
    pub sub_steps: usize,
}

impl<F: Float> SolverConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SolverConfig {
            gravity: Vec3::new(F::zero(), -F::from_f32(STANDARD_GRAVITY), F::zero()),
            damping: F::one(),
            termination: Termination::FixedIterations(DEFAULT_ITERATIONS),
            stiffness_mode: StiffnessMode::Linear,
            sub_steps: 1,
        }
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: Vec3<F>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the rigid damping factor.
    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    /// Run a fixed number of solver iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.termination = Termination::FixedIterations(iterations);
        self
    }

    /// Iterate until the mean correction settles, capped at `max_iterations`.
    pub fn with_convergence(mut self, tolerance: F, max_iterations: usize) -> Self {
        self.termination = Termination::Converged { tolerance, max_iterations };
        self
    }

    pub fn with_stiffness_mode(mut self, mode: StiffnessMode) -> Self {
        self.stiffness_mode = mode;
        self
    }

    /// Set the number of sub-steps.
    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }

    /// Reject settings that would make a step meaningless.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.damping.is_finite() || self.damping < F::zero() || self.damping > F::one() {
            return Err(PhysicsError::InvalidDampingFactor);
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        Ok(())
    }
}

impl<F: Float> Default for SolverConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}
