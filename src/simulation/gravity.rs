//! Gravitational acceleration, tree-approximated and direct
//!
//! `TreeGravity` walks the octree with the Barnes–Hut opening
//! criterion and accumulates monopole contributions into each
//! particle's acceleration slot. `direct_accelerations` is the exact
//! N^2 pairwise sum kept as the reference for tests and benchmarks.

use crate::simulation::octree::Node;
use crate::simulation::states::{NVec3, System};

/// Barnes–Hut gravity evaluated against a built octree.
///
/// A node is accepted as a single monopole when its angular size
/// `s / d` falls below `theta`, or when it has no children. Distances
/// are softened with `eps` so a particle can interact with the node
/// that contains it without a singularity; the resulting self-term is
/// zero for a single-particle leaf (the particle sits at the node's
/// center of mass) and negligible otherwise, which is cheaper than
/// threading identity checks through the traversal.
pub struct TreeGravity {
    pub g: f64, // gravitational constant
    pub eps: f64, // softening
    pub theta: f64, // opening angle
}

impl TreeGravity {
    /// Add tree-approximated gravitational accelerations to every
    /// particle, in store order.
    pub fn accumulate(&self, tree: &Node, sys: &mut System) {
        for p in sys.particles.iter_mut() {
            let mut acc = NVec3::zeros();
            self.traverse(tree, p.x, &mut acc);
            p.a += acc;
        }
    }

    /// Accumulate this subtree's contribution to the acceleration at `x`.
    ///
    /// - If the node passes the opening criterion (or is a leaf), add
    ///   the monopole `-G M (x - C) / d^3` with softened `d`, provided
    ///   the node carries mass.
    /// - Otherwise descend into every occupied child.
    fn traverse(&self, node: &Node, x: NVec3, acc: &mut NVec3) {
        let r = x - node.com;
        let d2 = r.norm_squared() + self.eps * self.eps;
        let d = d2.sqrt();

        if node.side / d < self.theta || node.children.is_none() {
            if node.mass > 0.0 && d > 0.0 {
                *acc += -self.g * node.mass / (d * d * d) * r;
            }
            return;
        }

        if let Some(children) = node.children.as_ref() {
            for child in children.iter() {
                if child.count() > 0 {
                    self.traverse(child, x, acc);
                }
            }
        }
    }
}

/// Direct N^2 gravitational accelerations with softening.
///
/// Walks each unordered pair once and applies equal and opposite
/// contributions, so the summed momentum change is zero to round-off.
pub fn direct_accelerations(sys: &System, g: f64, eps: f64, out: &mut [NVec3]) {
    for a in out.iter_mut() {
        *a = NVec3::zeros();
    }

    let n = sys.len();
    let eps2 = eps * eps;

    for i in 0..n {
        let xi = sys.particles[i].x;
        let mi = sys.particles[i].m;

        for j in (i + 1)..n {
            let xj = sys.particles[j].x;
            let mj = sys.particles[j].m;

            // displacement from i to j; i is pulled along +r, j along -r
            let r = xj - xi;
            let d2 = r.norm_squared() + eps2;

            let inv_r = d2.sqrt().recip();
            let inv_r3 = inv_r * inv_r * inv_r;
            let coef = g * inv_r3;

            out[i] += coef * mj * r;
            out[j] -= coef * mi * r;
        }
    }
}
