//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of
//! a simulation scenario:
//!
//! - [`ParametersConfig`] – numerical parameters of the run
//! - [`CloudConfig`]      – the initial particle cloud
//! - [`ScenarioConfig`]   – top-level wrapper used to load from YAML
//!
//! Every field carries a default equal to the reference setup, so an
//! empty document (or no scenario file at all) reproduces the reference
//! run: 500 particles of mass 100 in a 12-unit box, advanced with
//! dt = 0.8 to t = 1000.
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   t_end: 1000.0        # total simulation time
//!   dt: 0.8              # fixed step size
//!   theta: 0.5           # Barnes-Hut opening angle
//!   h: 10.0              # SPH smoothing length
//!
//! cloud:
//!   n: 500               # particle count
//!   extent: 12.0         # positions drawn uniformly from [0, extent)^3
//!   mass: 100.0          # per-particle mass
//!   u0: 1.0              # initial internal energy per unit mass
//!   seed: 42             # RNG seed for the position draw
//! ```

use serde::Deserialize;

/// Global numerical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub dt: f64, // step size
    pub theta: f64, // opening angle
    pub h: f64, // smoothing length
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            t_end: 1000.0,
            dt: 0.8,
            theta: 0.5,
            h: 10.0,
        }
    }
}

/// Configuration of the initial particle cloud
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CloudConfig {
    pub n: usize, // particle count
    pub extent: f64, // box side; positions are uniform in [0, extent)^3
    pub mass: f64, // mass per particle
    pub u0: f64, // initial internal energy per unit mass
    pub seed: u64, // deterministic seed to make runs reproducible
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            n: 500,
            extent: 12.0,
            mass: 100.0,
            u0: 1.0,
            seed: 42,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig, // numerical parameters
    pub cloud: CloudConfig, // initial particle cloud
}
