//! Chains (ropes, pendulums) built from particles and distance constraints.

use crate::constraint::{Constraint, ConstraintType};
use crate::error::PhysicsError;
use crate::float::Float;
use crate::simulation::Simulation;
use crate::vec::Vec3;
use core::ops::Range;

/// Configuration for creating a chain.
#[derive(Clone, Copy, Debug)]
pub struct ChainConfig<F: Float> {
    pub stiffness: F,
    pub particle_mass: F,
    /// Pin the first particle (the anchor).
    pub pin_start: bool,
    /// Pin the last particle.
    pub pin_end: bool,
}

impl<F: Float> Default for ChainConfig<F> {
    fn default() -> Self {
        ChainConfig {
            stiffness: F::one(),
            particle_mass: F::one(),
            pin_start: true,
            pin_end: false,
        }
    }
}

/// Handle to a chain appended to a [`Simulation`].
///
/// Only remembers index ranges; the particles and constraints live in the
/// simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    vertices: Range<usize>,
    constraints: Range<usize>,
}

impl Chain {
    /// Append `segments + 1` particles evenly spaced from `start` to `end`,
    /// each neighbour pair joined by an equality distance constraint.
    ///
    /// On error the simulation is left untouched.
    pub fn build<F: Float>(
        sim: &mut Simulation<F>,
        start: Vec3<F>,
        end: Vec3<F>,
        segments: usize,
        config: ChainConfig<F>,
    ) -> Result<Chain, PhysicsError> {
        if segments == 0 {
            return Err(PhysicsError::InsufficientSegments);
        }
        if !config.particle_mass.is_finite() || config.particle_mass <= F::zero() {
            return Err(PhysicsError::InvalidMass);
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        let segment_length = start.distance(end) / F::from_usize(segments);
        // Nothing is appended unless every segment constraint would be accepted.
        Constraint::distance(segment_length, [0, 1], config.stiffness, ConstraintType::Equality)
            .validate(2)?;

        let first_vertex = sim.vertex_count();
        for i in 0..=segments {
            let t = F::from_usize(i) / F::from_usize(segments);
            let fixed = (i == 0 && config.pin_start) || (i == segments && config.pin_end);
            sim.add_vertex(start.lerp(end, t), Vec3::zero(), config.particle_mass, fixed)?;
        }

        let first_constraint = sim.constraint_count();
        for i in 0..segments {
            let a = first_vertex + i;
            sim.add_distance_constraint(
                segment_length,
                [a, a + 1],
                config.stiffness,
                ConstraintType::Equality,
            )?;
        }

        Ok(Chain {
            vertices: first_vertex..first_vertex + segments + 1,
            constraints: first_constraint..first_constraint + segments,
        })
    }

    /// Simulation index of the `i`-th particle along the chain.
    pub fn vertex(&self, i: usize) -> usize {
        self.vertices.start + i
    }

    pub fn vertices(&self) -> Range<usize> {
        self.vertices.clone()
    }

    pub fn constraints(&self) -> Range<usize> {
        self.constraints.clone()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.constraints.len()
    }

    /// Current polyline length through the chain's particles.
    pub fn length<F: Float>(&self, sim: &Simulation<F>) -> F {
        let positions = sim.positions();
        let mut total = F::zero();
        for i in self.vertices.start..self.vertices.end - 1 {
            total = total + positions[i].distance(positions[i + 1]);
        }
        total
    }
}
