use sphsim::simulation::integrator;
use sphsim::simulation::kernel::{spline_derivative, spline_value, KernelTable};
use sphsim::simulation::params::{Parameters, GAMMA_MINUS_1, LEAF_CAPACITY, MAX_DEPTH};
use sphsim::{
    direct_accelerations, update_pressure, NVec3, Node, Particle, SphDensity, SphForces, System,
    TreeGravity,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

/// Build a particle at rest with unit internal energy
fn particle_at(x: NVec3, m: f64) -> Particle {
    Particle {
        x,
        v: NVec3::zeros(),
        a: NVec3::zeros(),
        m,
        rho: 0.0,
        u: 1.0,
        p: 1.0,
        du: 0.0,
    }
}

/// Seeded uniform cloud in [0, extent)^3, equal masses
fn cloud(seed: u64, n: usize, extent: f64, mass: f64) -> System {
    let mut rng = StdRng::seed_from_u64(seed);
    let particles = (0..n)
        .map(|_| {
            particle_at(
                NVec3::new(
                    rng.gen::<f64>() * extent,
                    rng.gen::<f64>() * extent,
                    rng.gen::<f64>() * extent,
                ),
                mass,
            )
        })
        .collect();
    System { particles, t: 0.0 }
}

/// Root cell + full build over the current configuration
fn build_tree(sys: &System) -> Node {
    let mut root = Node::from_system(sys);
    root.build(MAX_DEPTH, LEAF_CAPACITY);
    root
}

/// Density, equation of state, and propagation: the stages that must
/// run before the force traversal
fn prepare_sph(sys: &mut System, tree: &mut Node, kernel: &KernelTable, h: f64) {
    SphDensity { h }.compute(tree, kernel, sys);
    update_pressure(sys, false);
    tree.propagate_densities(sys).expect("propagation failed");
}

fn for_each_node(node: &Node, f: &mut impl FnMut(&Node)) {
    f(node);
    if let Some(children) = node.children.as_ref() {
        for child in children.iter() {
            for_each_node(child, f);
        }
    }
}

// ==================================================================================
// Kernel tests
// ==================================================================================

#[test]
fn kernel_lookup_matches_piecewise_formula() {
    let table = KernelTable::new();

    // grid-aligned probes, so interpolation is exact up to round-off
    let probes = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5];
    let expected_w = [1.0, 0.71875, 0.25, 0.03125, 0.0, 0.0];
    let expected_dw = [0.0, -0.9375, -0.75, -0.1875, 0.0, 0.0];

    for i in 0..probes.len() {
        let (w, dw) = table.lookup(probes[i]);
        assert!(
            (w - expected_w[i]).abs() < 1e-9,
            "W~({}) = {}, expected {}",
            probes[i],
            w,
            expected_w[i]
        );
        assert!(
            (dw - expected_dw[i]).abs() < 1e-9,
            "dW~/dq({}) = {}, expected {}",
            probes[i],
            dw,
            expected_dw[i]
        );
    }
}

#[test]
fn kernel_is_smooth_at_the_piece_boundary() {
    // Both pieces agree in value and slope at q = 1 and vanish at q = 2
    assert!((spline_value(1.0) - 0.25).abs() < 1e-15);
    assert!((spline_derivative(1.0) + 0.75).abs() < 1e-15);
    assert!(spline_value(2.0).abs() < 1e-15);
    assert!(spline_derivative(2.0).abs() < 1e-15);
    assert!(spline_derivative(0.0).abs() < 1e-15);

    let below = spline_derivative(1.0 - 1e-9);
    let above = spline_derivative(1.0 + 1e-9);
    assert!((below - above).abs() < 1e-6, "kink at q = 1: {below} vs {above}");
}

#[test]
fn kernel_normalization_integrates_to_one() {
    // integral of W~(r/h)/(pi h^3) over all space, radially by midpoint rule
    let h = 10.0;
    let steps = 20_000;
    let dr = 2.0 * h / steps as f64;

    let mut integral = 0.0;
    for i in 0..steps {
        let r = (i as f64 + 0.5) * dr;
        let w = spline_value(r / h) / (PI * h.powi(3));
        integral += w * 4.0 * PI * r * r * dr;
    }

    assert!(
        (integral - 1.0).abs() < 1e-6,
        "kernel volume integral = {integral}"
    );
}

// ==================================================================================
// Octree tests
// ==================================================================================

#[test]
fn octree_separates_cube_corners_into_leaves() {
    let m = 2.0;
    let mut particles = Vec::new();
    for k in 0..8usize {
        let corner = NVec3::new(
            if k & 1 != 0 { 1.0 } else { -1.0 },
            if k & 2 != 0 { 1.0 } else { -1.0 },
            if k & 4 != 0 { 1.0 } else { -1.0 },
        );
        particles.push(particle_at(corner, m));
    }
    let sys = System { particles, t: 0.0 };

    let root = build_tree(&sys);

    assert!((root.mass - 8.0 * m).abs() < 1e-12, "root mass {}", root.mass);
    assert!(root.com.norm() < 1e-12, "root com {:?}", root.com);
    assert!((root.side - 2.0).abs() < 1e-12);

    let children = root.children.as_ref().expect("root should subdivide");
    for child in children.iter() {
        assert_eq!(child.count(), 1, "each corner in its own octant");
        assert!(child.children.is_none(), "octants should stay leaves");
    }
}

#[test]
fn octree_covers_every_particle_exactly_once() {
    let sys = cloud(7, 64, 10.0, 1.5);
    let root = build_tree(&sys);

    assert!(
        (root.mass - 1.5 * 64.0).abs() < 1e-9,
        "root mass should equal the total mass"
    );

    // every particle inside the root cell
    let half = 0.5 * root.side + 1e-9;
    for p in &sys.particles {
        for j in 0..3 {
            assert!(
                (p.x[j] - root.center[j]).abs() <= half,
                "particle escapes the root cell on axis {j}"
            );
        }
    }

    // every particle ends up in exactly one single-particle leaf
    let mut leaf_indices = Vec::new();
    for_each_node(&root, &mut |node| {
        if node.children.is_none() && node.count() == 1 {
            leaf_indices.push(node.particles[0].index);
        }
    });
    leaf_indices.sort_unstable();
    let expected: Vec<usize> = (0..sys.len()).collect();
    assert_eq!(leaf_indices, expected);
}

#[test]
fn zero_density_fails_propagation() {
    // fresh particles still carry rho = 0; propagating without a
    // density pass must abort
    let sys = cloud(11, 16, 10.0, 1.0);
    let mut root = build_tree(&sys);
    assert!(root.propagate_densities(&sys).is_err());
}

#[test]
fn propagation_refreshes_every_tree_copy() {
    let kernel = KernelTable::new();
    let mut sys = cloud(13, 32, 10.0, 100.0);
    let mut root = build_tree(&sys);

    prepare_sph(&mut sys, &mut root, &kernel, 10.0);

    for_each_node(&root, &mut |node| {
        for np in &node.particles {
            let p = &sys.particles[np.index];
            assert!(p.rho > 0.0);
            assert_eq!(np.particle.rho, p.rho, "copy density out of date");
            assert_eq!(np.particle.p, p.p, "copy pressure out of date");
        }
    });
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn tree_gravity_matches_direct_with_full_descent() {
    let n = 128;
    let g = 1.0;
    let eps = 1e-3;
    let theta = 0.0; // force full traversal down to leaves

    let mut sys = cloud(1, n, 10.0, 1.5);
    let root = build_tree(&sys);

    let mut direct = vec![NVec3::zeros(); n];
    direct_accelerations(&sys, g, eps, &mut direct);

    TreeGravity { g, eps, theta }.accumulate(&root, &mut sys);

    for i in 0..n {
        let diff = (sys.particles[i].a - direct[i]).norm();
        let scale = 1.0 + direct[i].norm();
        assert!(
            diff < 1e-9 * scale,
            "acc mismatch at {i}: diff {diff}"
        );
    }
}

#[test]
fn distant_cluster_is_absorbed_into_a_monopole() {
    let g = 1.0;
    let eps = 1e-5;
    let theta = 0.5;

    // a lone target at the origin and a tight cluster ten units away
    let mut particles = vec![particle_at(NVec3::zeros(), 1.0)];
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let offset = NVec3::new(
            rng.gen::<f64>() * 0.5 - 0.25,
            rng.gen::<f64>() * 0.5 - 0.25,
            rng.gen::<f64>() * 0.5 - 0.25,
        );
        particles.push(particle_at(NVec3::new(10.0, 0.0, 0.0) + offset, 1.0));
    }
    let mut sys = System { particles, t: 0.0 };

    let mut direct = vec![NVec3::zeros(); sys.len()];
    direct_accelerations(&sys, g, eps, &mut direct);

    let root = build_tree(&sys);
    TreeGravity { g, eps, theta }.accumulate(&root, &mut sys);

    let err = (sys.particles[0].a - direct[0]).norm() / direct[0].norm();
    assert!(
        err < 1e-2,
        "monopole approximation error {err} exceeds the opening-angle bound"
    );
}

// ==================================================================================
// SPH tests
// ==================================================================================

#[test]
fn isolated_particle_keeps_only_its_self_term() {
    let kernel = KernelTable::new();
    let h = 10.0;
    let m = 100.0;

    let mut sys = System {
        particles: vec![particle_at(NVec3::new(3.0, 4.0, 5.0), m)],
        t: 0.0,
    };
    let root = build_tree(&sys);
    SphDensity { h }.compute(&root, &kernel, &mut sys);

    let expected = m / (PI * h.powi(3)); // m W~(0) / (pi h^3)
    let rho = sys.particles[0].rho;
    assert!(
        (rho - expected).abs() < 1e-12 * expected,
        "self-term density {rho}, expected {expected}"
    );
}

#[test]
fn density_of_a_pair_sums_both_kernel_terms() {
    let kernel = KernelTable::new();
    let h = 10.0;
    let m = 3.0;

    let mut sys = System {
        particles: vec![
            particle_at(NVec3::zeros(), m),
            particle_at(NVec3::new(5.0, 0.0, 0.0), m),
        ],
        t: 0.0,
    };
    let root = build_tree(&sys);
    SphDensity { h }.compute(&root, &kernel, &mut sys);

    let expected = m * (spline_value(0.0) + spline_value(0.5)) / (PI * h.powi(3));
    for p in &sys.particles {
        assert!(
            (p.rho - expected).abs() < 1e-12,
            "pair density {}, expected {expected}",
            p.rho
        );
    }
}

#[test]
fn equation_of_state_with_and_without_clamp() {
    let mut sys = System {
        particles: vec![particle_at(NVec3::zeros(), 1.0), particle_at(NVec3::zeros(), 1.0)],
        t: 0.0,
    };
    sys.particles[0].u = 2.0;
    sys.particles[0].rho = 3.0;
    sys.particles[1].u = -1.0;
    sys.particles[1].rho = 3.0;

    update_pressure(&mut sys, false);
    assert!((sys.particles[0].p - GAMMA_MINUS_1 * 2.0 * 3.0).abs() < 1e-15);
    assert!(sys.particles[1].p < 0.0, "unclamped pressure may go negative");

    update_pressure(&mut sys, true);
    assert_eq!(sys.particles[1].p, 0.0, "clamped pressure floors at zero");
}

#[test]
fn pressure_forces_conserve_momentum() {
    let kernel = KernelTable::new();
    let h = 10.0;

    let mut sys = cloud(3, 24, 8.0, 100.0);
    let mut root = build_tree(&sys);
    prepare_sph(&mut sys, &mut root, &kernel, h);

    SphForces { h }.accumulate(&root, &kernel, &mut sys);

    let mut momentum_rate = NVec3::zeros();
    for p in &sys.particles {
        momentum_rate += p.m * p.a;
    }
    assert!(
        momentum_rate.norm() < 1e-9,
        "pressure forces changed total momentum: {:?}",
        momentum_rate
    );
}

#[test]
fn compression_heats_and_pressure_repels() {
    let kernel = KernelTable::new();
    let h = 10.0;

    // two particles closing head-on
    let mut sys = System {
        particles: vec![
            particle_at(NVec3::zeros(), 100.0),
            particle_at(NVec3::new(5.0, 0.0, 0.0), 100.0),
        ],
        t: 0.0,
    };
    sys.particles[0].v = NVec3::new(1.0, 0.0, 0.0);
    sys.particles[1].v = NVec3::new(-1.0, 0.0, 0.0);

    let mut root = build_tree(&sys);
    prepare_sph(&mut sys, &mut root, &kernel, h);
    SphForces { h }.accumulate(&root, &kernel, &mut sys);

    assert!(sys.particles[0].du > 0.0, "approach should heat");
    assert!(sys.particles[1].du > 0.0, "approach should heat");
    assert!(
        sys.particles[0].a.x < 0.0 && sys.particles[1].a.x > 0.0,
        "positive pressure should push the pair apart"
    );
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn two_body_step_stays_mirror_symmetric() {
    let kernel = KernelTable::new();
    let params = Parameters::default();

    let mut sys = System {
        particles: vec![
            particle_at(NVec3::zeros(), 1.0),
            particle_at(NVec3::new(1.0, 0.0, 0.0), 1.0),
        ],
        t: 0.0,
    };

    integrator::step(&mut sys, &params, &kernel).expect("step failed");

    let p0 = &sys.particles[0];
    let p1 = &sys.particles[1];

    // equal masses: the midpoint stays put and momentum cancels
    let momentum = p0.m * p0.v + p1.m * p1.v;
    assert!(momentum.norm() < 1e-12, "net momentum {:?}", momentum);

    let midpoint = 0.5 * (p0.x + p1.x);
    assert!((midpoint - NVec3::new(0.5, 0.0, 0.0)).norm() < 1e-12);

    // at this separation the pressure term dwarfs gravity, so the pair
    // moves apart along the line joining it
    assert!(p1.x.x - p0.x.x > 1.0, "pair did not separate");
    assert!(p0.x.y.abs() < 1e-15 && p0.x.z.abs() < 1e-15);
}

#[test]
fn single_particle_stays_inert() {
    let kernel = KernelTable::new();
    let params = Parameters::default();

    let x0 = NVec3::new(3.0, 4.0, 5.0);
    let mut sys = System {
        particles: vec![particle_at(x0, 100.0)],
        t: 0.0,
    };

    integrator::step(&mut sys, &params, &kernel).expect("step failed");

    let p = &sys.particles[0];
    assert_eq!(p.v.norm(), 0.0, "velocity should stay zero");
    assert_eq!((p.x - x0).norm(), 0.0, "position should stay put");
    assert_eq!(p.a.norm(), 0.0, "softened self-gravity must cancel");
    assert_eq!(p.u, 1.0, "no neighbors, no heating");
    assert!(p.rho > 0.0, "self-term density is still computed");
}

#[test]
fn run_advances_until_t_end() {
    let kernel = KernelTable::new();
    let params = Parameters {
        t_end: 2.0,
        ..Parameters::default()
    };

    let mut sys = cloud(17, 8, 12.0, 100.0);
    integrator::run(&mut sys, &params, &kernel).expect("run failed");

    // dt = 0.8: three steps to reach t >= 2.0
    assert!(sys.t >= params.t_end);
    assert!((sys.t - 2.4).abs() < 1e-12);
}
