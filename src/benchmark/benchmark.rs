//! Wall-clock comparisons of the gravity solvers and the full pipeline
//!
//! Prints simple timing tables to stdout; reached from the CLI with
//! `--bench`.

use std::time::Instant;

use crate::simulation::gravity::{direct_accelerations, TreeGravity};
use crate::simulation::integrator;
use crate::simulation::kernel::KernelTable;
use crate::simulation::octree::Node;
use crate::simulation::params::{Parameters, LEAF_CAPACITY, MAX_DEPTH};
use crate::simulation::states::{NVec3, Particle, System};

/// Deterministic cloud filling a cubic box, no rand needed.
fn trig_cloud(n: usize, extent: f64) -> System {
    let mut particles = Vec::with_capacity(n);

    for i in 0..n {
        let i_f = i as f64;
        let x = NVec3::new(
            ((i_f * 0.37).sin() * 0.5 + 0.5) * extent,
            ((i_f * 0.13).cos() * 0.5 + 0.5) * extent,
            ((i_f * 0.07).sin() * 0.5 + 0.5) * extent,
        );

        particles.push(Particle {
            x,
            v: NVec3::zeros(),
            a: NVec3::zeros(),
            m: 100.0,
            rho: 0.0,
            u: 1.0,
            p: 1.0,
            du: 0.0,
        });
    }

    System { particles, t: 0.0 }
}

/// Time direct N^2 gravity against a tree build plus traversal for
/// a range of system sizes.
pub fn bench_gravity() {
    let ns = [200, 400, 800, 1600, 3200, 6400];
    let params = Parameters::default();

    for n in ns {
        let mut sys = trig_cloud(n, 12.0);
        let mut out = vec![NVec3::zeros(); n];

        let tree_gravity = TreeGravity {
            g: params.g,
            eps: params.eps,
            theta: params.theta,
        };

        // Warm up
        direct_accelerations(&sys, params.g, params.eps, &mut out);
        let mut root = Node::from_system(&sys);
        root.build(MAX_DEPTH, LEAF_CAPACITY);
        tree_gravity.accumulate(&root, &mut sys);

        // Time direct
        let t0 = Instant::now();
        direct_accelerations(&sys, params.g, params.eps, &mut out);
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time the tree, including its build
        let t1 = Instant::now();
        let mut root = Node::from_system(&sys);
        root.build(MAX_DEPTH, LEAF_CAPACITY);
        tree_gravity.accumulate(&root, &mut sys);
        let dt_tree = t1.elapsed().as_secs_f64();

        println!("N = {n:5}, direct = {dt_direct:8.6} s, tree = {dt_tree:8.6} s");
    }
}

/// Time full integration steps (two tree builds, both SPH passes,
/// gravity, kicks and drifts) for a range of system sizes.
pub fn bench_step() {
    let ns = [100, 200, 400, 800];
    let kernel = KernelTable::new();

    for n in ns {
        let params = Parameters::default();
        let mut sys = trig_cloud(n, 12.0);

        // Warm up one step, then time a handful
        integrator::step(&mut sys, &params, &kernel).expect("benchmark step failed");

        let steps = 5;
        let t0 = Instant::now();
        for _ in 0..steps {
            integrator::step(&mut sys, &params, &kernel).expect("benchmark step failed");
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!("N = {n:5}, step = {per_step:8.6} s");
    }
}
