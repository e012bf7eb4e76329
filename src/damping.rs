//! Rigid-body velocity damping.
//!
//! Pulls the velocities of all free particles toward the rigid motion
//! `v_cm + ω × r_i` that has the same linear and angular momentum as the
//! cluster. This removes the energy that explicit integration tends to
//! inject without changing total momentum.

use crate::float::Float;
use crate::mat::Mat3;
use crate::vec::Vec3;
use crate::vertex::VertexStore;

/// Below this `|det(I)|` the inertia tensor is treated as singular.
pub const SINGULAR_INERTIA_EPSILON: f32 = 1e-8;

/// What the damping stage did to the velocities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DampingOutcome {
    /// Velocities were blended toward the rigid velocity field.
    Applied,
    /// Damping factor was zero; nothing to do.
    Disabled,
    /// No free particle carries mass; nothing to damp.
    NoFreeMass,
    /// Particles are coincident or collinear; left untouched.
    SingularInertia,
}

/// Damp the free particles of `store` with factor `k_damping`.
pub fn damp_velocities<F: Float>(store: &mut VertexStore<F>, k_damping: F) -> DampingOutcome {
    if k_damping == F::zero() {
        return DampingOutcome::Disabled;
    }
    let (positions, velocities, masses, fixed) = store.state_mut();
    damp(positions, velocities, masses, fixed, k_damping)
}

fn damp<F: Float>(
    positions: &[Vec3<F>],
    velocities: &mut [Vec3<F>],
    masses: &[F],
    fixed: &[bool],
    k_damping: F,
) -> DampingOutcome {
    let n = positions.len();
    let free = move || (0..n).filter(move |&i| !fixed[i]);

    let mut total_mass = F::zero();
    let mut xcm = Vec3::zero();
    let mut vcm = Vec3::zero();
    for i in free() {
        total_mass = total_mass + masses[i];
        xcm += positions[i].scale(masses[i]);
        vcm += velocities[i].scale(masses[i]);
    }
    if total_mass <= F::zero() {
        return DampingOutcome::NoFreeMass;
    }
    xcm = xcm.scale(F::one() / total_mass);
    vcm = vcm.scale(F::one() / total_mass);

    // r_i is taken relative to the final center of mass.
    let mut angular_momentum = Vec3::zero();
    let mut inertia = Mat3::zero();
    for i in free() {
        let r = positions[i] - xcm;
        angular_momentum += r.cross(velocities[i].scale(masses[i]));
        let r_tilde = Mat3::identity().scale(r.length_sq()) - Mat3::outer(r, r);
        inertia = inertia + r_tilde.scale(masses[i]);
    }

    let inv_inertia = match inertia.try_inverse(F::from_f32(SINGULAR_INERTIA_EPSILON)) {
        Some(inv) => inv,
        None => return DampingOutcome::SingularInertia,
    };
    let omega = inv_inertia.mul_vec(angular_momentum);

    for i in free() {
        let r = positions[i] - xcm;
        let dv = vcm + omega.cross(r) - velocities[i];
        velocities[i] += dv.scale(k_damping);
    }
    DampingOutcome::Applied
}
