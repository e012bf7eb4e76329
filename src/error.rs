//! Error types for scene setup and stepping.

use core::fmt;

/// Precondition violations rejected at the simulation boundary.
///
/// Numerical degeneracies inside a step (singular inertia, zero gradients,
/// all-fixed constraints) are not errors; they are skipped and reported
/// through [`StepObserver`](crate::observer::StepObserver).
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Mass must be positive and finite.
    InvalidMass,
    /// Stiffness must be in [0, 1].
    InvalidStiffness,
    /// Time step must be positive and finite.
    InvalidTimeStep,
    /// Rest length must be non-negative and finite.
    InvalidRestLength,
    /// Damping factor must be in [0, 1].
    InvalidDampingFactor,
    /// Position or velocity contains NaN or infinity.
    NonFiniteState,
    /// A constraint needs at least one particle.
    EmptyConstraint,
    /// A chain needs at least one segment.
    InsufficientSegments,
    /// Particle index is out of bounds.
    ParticleOutOfBounds { index: usize, count: usize },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::InvalidMass => write!(f, "mass must be positive and finite"),
            PhysicsError::InvalidStiffness => write!(f, "stiffness must be in [0, 1]"),
            PhysicsError::InvalidTimeStep => write!(f, "time step must be positive and finite"),
            PhysicsError::InvalidRestLength => {
                write!(f, "rest length must be non-negative and finite")
            }
            PhysicsError::InvalidDampingFactor => write!(f, "damping factor must be in [0, 1]"),
            PhysicsError::NonFiniteState => write!(f, "position or velocity is not finite"),
            PhysicsError::EmptyConstraint => write!(f, "constraint has no particles"),
            PhysicsError::InsufficientSegments => write!(f, "chain needs at least 1 segment"),
            PhysicsError::ParticleOutOfBounds { index, count } => {
                write!(f, "particle index {} out of bounds (count: {})", index, count)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PhysicsError {}
