//! SPH density, equation of state, and pressure forces
//!
//! Both SPH passes restrict their neighbor search with the same
//! cell-versus-support overlap test ([`Node::overlaps`]) and treat
//! every overlapping single-particle cell as a neighbor. The density
//! pass includes the self term; the force pass excludes it via the
//! zero-separation guard.
//!
//! The force traversal reads the evaluated particle's own density and
//! pressure from the store, and the neighbor's from the copies held in
//! the tree (refreshed by [`Node::propagate_densities`] beforehand).

use std::f64::consts::PI;

use crate::simulation::kernel::KernelTable;
use crate::simulation::octree::Node;
use crate::simulation::params::GAMMA_MINUS_1;
use crate::simulation::states::{NVec3, System};

/// Tree-restricted SPH density summation.
pub struct SphDensity {
    pub h: f64, // smoothing length
}

impl SphDensity {
    /// Recompute the density of every particle from scratch:
    /// `rho_p = sum_q m_q W~(r_pq / h) / (pi h^3)` over all neighbors
    /// whose support overlaps, including p itself.
    pub fn compute(&self, tree: &Node, kernel: &KernelTable, sys: &mut System) {
        for p in sys.particles.iter_mut() {
            let mut rho = 0.0;
            self.traverse(tree, p.x, kernel, &mut rho);
            p.rho = rho;
        }
    }

    fn traverse(&self, node: &Node, x: NVec3, kernel: &KernelTable, rho: &mut f64) {
        if !node.overlaps(x, self.h) {
            return;
        }
        if node.count() > 1 {
            if let Some(children) = node.children.as_ref() {
                for child in children.iter() {
                    if child.count() > 0 {
                        self.traverse(child, x, kernel, rho);
                    }
                }
            }
        } else if node.count() == 1 {
            let q = &node.particles[0].particle;
            let r = (x - q.x).norm();
            let (w, _) = kernel.lookup(r / self.h);
            *rho += q.m * w / (PI * self.h.powi(3));
        }
    }
}

/// Ideal-gas equation of state: `P = (gamma - 1) u rho`.
///
/// The second half-step applies the clamped form, flooring the result
/// at zero; the first half-step leaves negative intermediates alone.
pub fn update_pressure(sys: &mut System, clamp: bool) {
    for p in sys.particles.iter_mut() {
        p.p = GAMMA_MINUS_1 * p.u * p.rho;
        if clamp && p.p < 0.0 {
            p.p = 0.0;
        }
    }
}

/// State of the evaluated particle, captured before the walk.
struct Target {
    x: NVec3,
    v: NVec3,
    rho: f64,
    p: f64,
}

/// Tree-restricted SPH pressure acceleration and internal-energy rate.
pub struct SphForces {
    pub h: f64, // smoothing length
}

impl SphForces {
    /// Add the symmetric pressure acceleration
    /// `-m_q (P_p/rho_p^2 + P_q/rho_q^2) grad W` and the energy rate
    /// `(P_p/rho_p) m_q (v_pq . grad W)` to every particle, on top of
    /// whatever the gravity traversal already accumulated.
    pub fn accumulate(&self, tree: &Node, kernel: &KernelTable, sys: &mut System) {
        for p in sys.particles.iter_mut() {
            let target = Target {
                x: p.x,
                v: p.v,
                rho: p.rho,
                p: p.p,
            };
            let mut acc = NVec3::zeros();
            let mut du = 0.0;
            self.traverse(tree, &target, kernel, &mut acc, &mut du);
            p.a += acc;
            p.du += du;
        }
    }

    fn traverse(&self, node: &Node, t: &Target, kernel: &KernelTable, acc: &mut NVec3, du: &mut f64) {
        if !node.overlaps(t.x, self.h) {
            return;
        }
        if node.count() > 1 {
            if let Some(children) = node.children.as_ref() {
                for child in children.iter() {
                    if child.count() > 0 {
                        self.traverse(child, t, kernel, acc, du);
                    }
                }
            }
        } else if node.count() == 1 {
            let q = &node.particles[0].particle;
            let rvec = t.x - q.x;
            let r = rvec.norm();
            if r == 0.0 {
                // self pair (or an exact positional coincidence): no force
                return;
            }
            let (_, dw) = kernel.lookup(r / self.h);
            // radial gradient of the physical kernel; dw <= 0, so this
            // points from the evaluated particle toward the neighbor
            let grad = rvec / r * (dw / (PI * self.h.powi(4)));

            *acc += -(q.m * (t.p / (t.rho * t.rho) + q.p / (q.rho * q.rho))) * grad;
            *du += t.p / t.rho * q.m * (t.v - q.v).dot(&grad);
        }
    }
}
