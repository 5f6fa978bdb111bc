//! Fixed-step time integration for the SPH + gravity system
//!
//! A full step of size `dt` is two symmetric half-steps. Each
//! half-step rebuilds the octree over the current configuration,
//! recomputes densities and pressures, accumulates gravity and
//! pressure forces, then applies a kick (`v += a dt/2`,
//! `u += du dt/2`) followed by a drift (`x += v dt/2`). The tree is a
//! scoped resource: it never outlives the half-step that built it.
//!
//! Accelerations are zeroed before the force traversals of the first
//! half-step and again after its kick and drift; the second half-step
//! deliberately performs no zeroing of its own and relies on that
//! trailing clear. The energy-rate slot restarts from zero right after
//! each kick consumes it.

use anyhow::Result;

use crate::simulation::gravity::TreeGravity;
use crate::simulation::kernel::KernelTable;
use crate::simulation::octree::Node;
use crate::simulation::params::{Parameters, LEAF_CAPACITY, MAX_DEPTH};
use crate::simulation::sph::{update_pressure, SphDensity, SphForces};
use crate::simulation::states::{NVec3, System};

/// Advance the system by one full step of `params.dt`.
///
/// Fails only on a degenerate density (a particle with zero density
/// after the density pass), which indicates a broken configuration
/// rather than a recoverable state.
pub fn step(sys: &mut System, params: &Parameters, kernel: &KernelTable) -> Result<()> {
    half_step(sys, params, kernel, true)?;
    half_step(sys, params, kernel, false)?;
    sys.t += params.dt;
    Ok(())
}

/// Run the simulation until the first step that reaches `t_end`.
pub fn run(sys: &mut System, params: &Parameters, kernel: &KernelTable) -> Result<()> {
    while sys.t < params.t_end {
        step(sys, params, kernel)?;
    }
    Ok(())
}

fn half_step(sys: &mut System, params: &Parameters, kernel: &KernelTable, first: bool) -> Result<()> {
    // Fresh tree over the current positions; torn down when this frame ends
    let mut root = Node::from_system(sys);
    root.build(MAX_DEPTH, LEAF_CAPACITY);

    SphDensity { h: params.h }.compute(&root, kernel, sys);

    // First half: plain EOS. Second half: clamped form, so the step
    // never ends with negative pressure.
    update_pressure(sys, !first);

    // The tree copies must carry this half-step's densities and
    // pressures before the force traversal reads them as neighbors.
    root.propagate_densities(sys)?;

    if first {
        for p in sys.particles.iter_mut() {
            p.a = NVec3::zeros();
        }
    }

    TreeGravity {
        g: params.g,
        eps: params.eps,
        theta: params.theta,
    }
    .accumulate(&root, sys);

    SphForces { h: params.h }.accumulate(&root, kernel, sys);

    let half_dt = 0.5 * params.dt;

    // Kick: v += a dt/2, u += du dt/2
    for p in sys.particles.iter_mut() {
        p.v += half_dt * p.a;
        p.u += half_dt * p.du;
    }

    // Drift: x += v dt/2
    for p in sys.particles.iter_mut() {
        p.x += half_dt * p.v;
    }

    // The kick consumed du; the next traversal accumulates from zero.
    // The acceleration slot is cleared only at the end of the first
    // half; the second half leaves it holding the step's final forces.
    for p in sys.particles.iter_mut() {
        p.du = 0.0;
        if first {
            p.a = NVec3::zeros();
        }
    }

    Ok(())
}
