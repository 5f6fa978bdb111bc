//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime
//! bundle consumed by the integrator:
//! - numerical parameters (`Parameters`)
//! - system state (`System` with the particle cloud at t = 0)

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::configuration::config::ScenarioConfig;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, Particle, System};

/// A fully-initialized simulation scenario.
pub struct Scenario {
    pub parameters: Parameters,
    pub system: System,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        // Parameters (runtime) from ParametersConfig; the physical
        // constants keep their built-in values
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            t_end: p_cfg.t_end,
            dt: p_cfg.dt,
            h: p_cfg.h,
            theta: p_cfg.theta,
            ..Parameters::default()
        };

        // Particles: a seeded uniform cloud in [0, extent)^3 at rest.
        // Density starts at zero and pressure at a placeholder; both
        // are overwritten by the first density + equation-of-state pass.
        let c = cfg.cloud;
        let mut rng = StdRng::seed_from_u64(c.seed);
        let particles = (0..c.n)
            .map(|_| Particle {
                x: NVec3::new(
                    rng.gen::<f64>() * c.extent,
                    rng.gen::<f64>() * c.extent,
                    rng.gen::<f64>() * c.extent,
                ),
                v: NVec3::zeros(),
                a: NVec3::zeros(),
                m: c.mass,
                rho: 0.0,
                u: c.u0,
                p: 1.0,
                du: 0.0,
            })
            .collect();

        // Initial system state: cloud at t = 0
        let system = System {
            particles,
            t: 0.0,
        };

        Self { parameters, system }
    }
}
