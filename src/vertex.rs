//! Struct-of-arrays particle storage.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec3;
use alloc::vec::Vec;

/// Particle state kept in parallel arrays, addressed by the index returned
/// from [`add_vertex`](VertexStore::add_vertex). Indices never change.
#[derive(Clone, Debug, Default)]
pub struct VertexStore<F: Float> {
    positions: Vec<Vec3<F>>,
    velocities: Vec<Vec3<F>>,
    masses: Vec<F>,
    inv_masses: Vec<F>,
    fixed: Vec<bool>,
}

impl<F: Float> VertexStore<F> {
    pub fn new() -> Self {
        VertexStore {
            positions: Vec::new(),
            velocities: Vec::new(),
            masses: Vec::new(),
            inv_masses: Vec::new(),
            fixed: Vec::new(),
        }
    }

    /// Append a particle and return its index.
    pub fn add_vertex(
        &mut self,
        position: Vec3<F>,
        velocity: Vec3<F>,
        mass: F,
        fixed: bool,
    ) -> Result<usize, PhysicsError> {
        if !mass.is_finite() || mass <= F::zero() {
            return Err(PhysicsError::InvalidMass);
        }
        if !position.is_finite() || !velocity.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        let idx = self.positions.len();
        self.positions.push(position);
        self.velocities.push(velocity);
        self.masses.push(mass);
        self.inv_masses.push(Self::weight(mass, fixed));
        self.fixed.push(fixed);
        Ok(idx)
    }

    /// Pin or release a particle. Velocity is left as is; a pinned particle
    /// simply stops being moved by forces and constraints.
    pub fn set_fixed(&mut self, index: usize, fixed: bool) -> Result<(), PhysicsError> {
        self.check_index(index)?;
        self.fixed[index] = fixed;
        self.inv_masses[index] = Self::weight(self.masses[index], fixed);
        Ok(())
    }

    /// Teleport a particle, e.g. to drag a pinned anchor.
    pub fn set_position(&mut self, index: usize, position: Vec3<F>) -> Result<(), PhysicsError> {
        self.check_index(index)?;
        if !position.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        self.positions[index] = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, index: usize, velocity: Vec3<F>) -> Result<(), PhysicsError> {
        self.check_index(index)?;
        if !velocity.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        self.velocities[index] = velocity;
        Ok(())
    }

    pub fn check_index(&self, index: usize) -> Result<(), PhysicsError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(PhysicsError::ParticleOutOfBounds { index, count: self.len() })
        }
    }

    fn weight(mass: F, fixed: bool) -> F {
        if fixed { F::zero() } else { F::one() / mass }
    }

    pub fn len(&self) -> usize { self.positions.len() }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }

    pub fn positions(&self) -> &[Vec3<F>] { &self.positions }
    pub fn velocities(&self) -> &[Vec3<F>] { &self.velocities }
    pub fn masses(&self) -> &[F] { &self.masses }
    pub fn inverse_masses(&self) -> &[F] { &self.inv_masses }

    pub fn position(&self, index: usize) -> Vec3<F> { self.positions[index] }
    pub fn velocity(&self, index: usize) -> Vec3<F> { self.velocities[index] }
    pub fn mass(&self, index: usize) -> F { self.masses[index] }
    pub fn inverse_mass(&self, index: usize) -> F { self.inv_masses[index] }
    pub fn is_fixed(&self, index: usize) -> bool { self.fixed[index] }

    /// Split borrow: positions and velocities mutable, the rest read-only.
    pub(crate) fn state_mut(&mut self) -> (&mut [Vec3<F>], &mut [Vec3<F>], &[F], &[bool]) {
        (&mut self.positions, &mut self.velocities, &self.masses, &self.fixed)
    }

    /// Σ m·v over free particles.
    pub fn linear_momentum(&self) -> Vec3<F> {
        let mut sum = Vec3::zero();
        for i in 0..self.len() {
            if !self.fixed[i] {
                sum += self.velocities[i].scale(self.masses[i]);
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Vec3<f32> {
        Vec3::zero()
    }

    #[test]
    fn add_vertex_returns_sequential_indices() {
        let mut store = VertexStore::new();
        assert_eq!(store.add_vertex(origin(), origin(), 1.0, false), Ok(0));
        assert_eq!(store.add_vertex(origin(), origin(), 2.0, true), Ok(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn inverse_mass_tracks_fixed_flag() {
        let mut store = VertexStore::new();
        let i = store.add_vertex(origin(), origin(), 4.0, false).unwrap();
        assert_eq!(store.inverse_mass(i), 0.25);
        store.set_fixed(i, true).unwrap();
        assert_eq!(store.inverse_mass(i), 0.0);
        store.set_fixed(i, false).unwrap();
        assert_eq!(store.inverse_mass(i), 0.25);
    }

    #[test]
    fn pinning_keeps_velocity() {
        let mut store = VertexStore::new();
        let v = Vec3::new(1.0f32, 2.0, 3.0);
        let i = store.add_vertex(origin(), v, 1.0, false).unwrap();
        store.set_fixed(i, true).unwrap();
        assert_eq!(store.velocity(i), v);
    }

    #[test]
    fn rejects_bad_mass() {
        let mut store = VertexStore::<f32>::new();
        assert_eq!(store.add_vertex(origin(), origin(), 0.0, false), Err(PhysicsError::InvalidMass));
        assert_eq!(store.add_vertex(origin(), origin(), -1.0, true), Err(PhysicsError::InvalidMass));
        assert_eq!(
            store.add_vertex(origin(), origin(), f32::INFINITY, false),
            Err(PhysicsError::InvalidMass)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_non_finite_state() {
        let mut store = VertexStore::<f32>::new();
        let bad = Vec3::new(f32::NAN, 0.0, 0.0);
        assert_eq!(store.add_vertex(bad, origin(), 1.0, false), Err(PhysicsError::NonFiniteState));
        assert_eq!(store.add_vertex(origin(), bad, 1.0, false), Err(PhysicsError::NonFiniteState));
    }

    #[test]
    fn set_fixed_out_of_range() {
        let mut store = VertexStore::<f32>::new();
        assert_eq!(
            store.set_fixed(3, true),
            Err(PhysicsError::ParticleOutOfBounds { index: 3, count: 0 })
        );
    }
}
