//! Core state types for the simulation.
//!
//! Defines the particle record and the particle store:
//! - `Particle` carries the kinematic and thermodynamic state of one
//!   SPH particle
//! - `System` holds the ordered particle list and the current time `t`
//!
//! The particle order assigned at initialization is preserved for the
//! whole run; every traversal consumes particles in this index order.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub a: NVec3, // acceleration (gravity + pressure, accumulated per half-step)
    pub m: f64, // mass
    pub rho: f64, // density
    pub u: f64, // internal energy per unit mass
    pub p: f64, // pressure
    pub du: f64, // internal energy rate du/dt
}

#[derive(Debug, Clone)]
pub struct System {
    pub particles: Vec<Particle>, // ordered collection of particles
    pub t: f64, // time
}

impl System {
    /// Number of particles in the store.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
