//! Position-based dynamics for constrained particle systems.
//!
//! `pbdsim` integrates a set of particles subject to scalar position
//! constraints. Each step applies external forces, damps velocities toward
//! the rigid motion of the cluster, predicts positions, projects them onto
//! the constraints with a Gauss-Seidel solver, and derives velocities from
//! the position change.
//!
//! # Features
//!
//! - **Struct-of-arrays particles**: stable `usize` indices, inverse-mass pinning
//! - **Constraints**: distance, anchor, or any caller-defined function with an
//!   analytic or finite-difference gradient; equality or inequality
//! - **Rigid damping**: momentum-preserving velocity projection
//! - **Configurable solver**: fixed iteration budget or convergence threshold,
//!   selectable use of constraint stiffness
//! - **Observable**: monitor steps via the `StepObserver` trait
//! - **`no_std` compatible**: needs only `alloc`

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod float;
pub mod vec;
pub mod mat;
pub mod vertex;
pub mod constraint;
pub mod damping;
pub mod solver;
pub mod simulation;
pub mod chain;
pub mod observer;
pub mod config;
pub mod error;

// Re-export primary API
pub use float::Float;
pub use vec::Vec3;
pub use mat::Mat3;
pub use vertex::VertexStore;
pub use constraint::{
    finite_difference_gradient, Constraint, ConstraintFunction, ConstraintKind, ConstraintType,
    FnConstraint, FD_EPSILON,
};
pub use damping::{damp_velocities, DampingOutcome};
pub use solver::{ConstraintSolver, SolveReport};
pub use simulation::{Simulation, StepReport};
pub use chain::{Chain, ChainConfig};
pub use config::{SolverConfig, StiffnessMode, Termination};
pub use observer::{NoOpStepObserver, StepObserver};
pub use error::PhysicsError;
