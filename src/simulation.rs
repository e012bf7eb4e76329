//! Time integration: the per-frame position-based dynamics step.

use crate::config::SolverConfig;
use crate::constraint::{Constraint, ConstraintFunction, ConstraintType};
use crate::damping::{damp_velocities, DampingOutcome};
use crate::error::PhysicsError;
use crate::float::Float;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::solver::{ConstraintSolver, SolveReport};
use crate::vec::Vec3;
use crate::vertex::VertexStore;
use alloc::vec::Vec;

/// Summary of one [`Simulation::update`] call. `damping` and `solve` describe
/// the last sub-step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport<F> {
    pub sub_steps: usize,
    pub damping: DampingOutcome,
    pub solve: SolveReport<F>,
}

/// A constrained particle system.
///
/// Owns the particles and constraints. Scene setup appends to both; each
/// [`update`](Simulation::update) advances the whole system by one frame.
///
/// ```
/// use pbdsim::{ConstraintType, Simulation, SolverConfig, Vec3};
///
/// let mut sim: Simulation<f32> = Simulation::new(SolverConfig::new());
/// let anchor = sim.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::zero(), 1.0, true).unwrap();
/// let bob = sim.add_vertex(Vec3::new(1.0, 1.0, 0.0), Vec3::zero(), 1.0, false).unwrap();
/// sim.add_distance_constraint(1.0, [anchor, bob], 1.0, ConstraintType::Equality).unwrap();
///
/// sim.update(1.0 / 60.0).unwrap();
/// let p = sim.positions()[bob];
/// assert!((p.distance(sim.positions()[anchor]) - 1.0).abs() < 1e-3);
/// ```
pub struct Simulation<F: Float> {
    vertices: VertexStore<F>,
    constraints: Vec<Constraint<F>>,
    config: SolverConfig<F>,
    solver: ConstraintSolver<F>,
    predicted: Vec<Vec3<F>>,
}

impl<F: Float> Simulation<F> {
    pub fn new(config: SolverConfig<F>) -> Self {
        Simulation {
            vertices: VertexStore::new(),
            constraints: Vec::new(),
            config,
            solver: ConstraintSolver::new(),
            predicted: Vec::new(),
        }
    }

    /// Append a particle; see [`VertexStore::add_vertex`].
    pub fn add_vertex(
        &mut self,
        position: Vec3<F>,
        velocity: Vec3<F>,
        mass: F,
        fixed: bool,
    ) -> Result<usize, PhysicsError> {
        self.vertices.add_vertex(position, velocity, mass, fixed)
    }

    pub fn set_fixed(&mut self, index: usize, fixed: bool) -> Result<(), PhysicsError> {
        self.vertices.set_fixed(index, fixed)
    }

    /// Move a particle directly, typically a pinned one driven by the host.
    pub fn set_position(&mut self, index: usize, position: Vec3<F>) -> Result<(), PhysicsError> {
        self.vertices.set_position(index, position)
    }

    pub fn set_velocity(&mut self, index: usize, velocity: Vec3<F>) -> Result<(), PhysicsError> {
        self.vertices.set_velocity(index, velocity)
    }

    /// Validate and append a constraint, returning its index.
    pub fn add_constraint(&mut self, constraint: Constraint<F>) -> Result<usize, PhysicsError> {
        constraint.validate(self.vertices.len())?;
        let idx = self.constraints.len();
        self.constraints.push(constraint);
        Ok(idx)
    }

    /// Keep `|p0 - p1|` at `rest_length` (or above it, for inequalities).
    pub fn add_distance_constraint(
        &mut self,
        rest_length: F,
        indices: [usize; 2],
        stiffness: F,
        ty: ConstraintType,
    ) -> Result<usize, PhysicsError> {
        self.add_constraint(Constraint::distance(rest_length, indices, stiffness, ty))
    }

    pub fn add_anchor_constraint(
        &mut self,
        index: usize,
        target: Vec3<F>,
        stiffness: F,
    ) -> Result<usize, PhysicsError> {
        self.add_constraint(Constraint::anchor(index, target, stiffness))
    }

    pub fn add_custom_constraint<C>(
        &mut self,
        function: C,
        indices: Vec<usize>,
        stiffness: F,
        ty: ConstraintType,
    ) -> Result<usize, PhysicsError>
    where
        C: ConstraintFunction<F> + 'static,
    {
        self.add_constraint(Constraint::custom(function, indices, stiffness, ty))
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: F) -> Result<StepReport<F>, PhysicsError> {
        self.update_with_observer(dt, &mut NoOpStepObserver)
    }

    /// Advance the simulation by `dt` seconds, reporting progress to `observer`.
    ///
    /// Fails without touching any state if `dt` is not positive and finite
    /// or the configuration is invalid.
    pub fn update_with_observer<O: StepObserver<F>>(
        &mut self,
        dt: F,
        observer: &mut O,
    ) -> Result<StepReport<F>, PhysicsError> {
        if !dt.is_finite() || dt <= F::zero() {
            return Err(PhysicsError::InvalidTimeStep);
        }
        self.config.validate()?;

        let sub_steps = self.config.sub_steps.max(1);
        let h = dt / F::from_usize(sub_steps);
        let mut damping = DampingOutcome::Disabled;
        let mut solve = SolveReport { iterations: 0, mean_correction: F::zero(), converged: true };

        for _sub in 0..sub_steps {
            self.apply_external_forces(h);
            observer.on_external_forces();

            damping = damp_velocities(&mut self.vertices, self.config.damping);
            observer.on_damping(damping);

            self.predict(h);
            observer.on_predict();

            // Collision constraints would be generated here from x -> p.

            solve = self.solver.project(
                &self.constraints,
                &mut self.predicted,
                self.vertices.inverse_masses(),
                self.config.termination,
                self.config.stiffness_mode,
                observer,
            );

            self.reconcile(h);
        }

        observer.on_step_complete();
        Ok(StepReport { sub_steps, damping, solve })
    }

    fn apply_external_forces(&mut self, h: F) {
        let gravity = self.config.gravity.scale(h);
        let (_, velocities, _, fixed) = self.vertices.state_mut();
        for (v, &pinned) in velocities.iter_mut().zip(fixed) {
            if !pinned {
                *v += gravity;
            }
        }
    }

    fn predict(&mut self, h: F) {
        self.predicted.clear();
        for i in 0..self.vertices.len() {
            let x = self.vertices.position(i);
            let p = if self.vertices.is_fixed(i) {
                x
            } else {
                x + self.vertices.velocity(i).scale(h)
            };
            self.predicted.push(p);
        }
    }

    fn reconcile(&mut self, h: F) {
        let inv_h = F::one() / h;
        let (positions, velocities, _, _) = self.vertices.state_mut();
        // Fixed particles were predicted in place, so their velocity drops to zero.
        for i in 0..positions.len() {
            velocities[i] = (self.predicted[i] - positions[i]).scale(inv_h);
            positions[i] = self.predicted[i];
        }
    }

    /// Current particle positions, indexed as returned by `add_vertex`.
    pub fn positions(&self) -> &[Vec3<F>] { self.vertices.positions() }
    pub fn velocities(&self) -> &[Vec3<F>] { self.vertices.velocities() }
    pub fn vertices(&self) -> &VertexStore<F> { &self.vertices }
    pub fn constraints(&self) -> &[Constraint<F>] { &self.constraints }
    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn constraint_count(&self) -> usize { self.constraints.len() }
    pub fn config(&self) -> &SolverConfig<F> { &self.config }

    pub fn set_config(&mut self, config: SolverConfig<F>) {
        self.config = config;
    }

    /// Value of constraint `index` on the current positions.
    pub fn constraint_error(&self, index: usize) -> Option<F> {
        let constraint = self.constraints.get(index)?;
        let points: Vec<Vec3<F>> = constraint
            .indices()
            .iter()
            .map(|&i| self.vertices.position(i))
            .collect();
        Some(constraint.evaluate(&points))
    }

    /// Σ m·v over free particles.
    pub fn total_momentum(&self) -> Vec3<F> {
        self.vertices.linear_momentum()
    }
}

impl<F: Float> Default for Simulation<F> {
    fn default() -> Self {
        Self::new(SolverConfig::new())
    }
}
