//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - integration step size and end time,
//! - gravitational constant and softening (`g`, `eps`),
//! - smoothing length and opening angle (`h`, `theta`)
//!
//! Structural constants that never vary at runtime (equation-of-state
//! factor, tree depth limit, leaf capacity) live here as `const`s.

/// Equation-of-state factor (gamma - 1) for an ideal gas with gamma = 5/3.
pub const GAMMA_MINUS_1: f64 = 2.0 / 3.0;

/// Recursion depth limit for the octree build.
pub const MAX_DEPTH: usize = 1000;

/// Maximum number of particles a node may hold before subdividing.
pub const LEAF_CAPACITY: usize = 1;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // time end
    pub dt: f64, // step size
    pub g: f64, // gravitational constant
    pub eps: f64, // softening
    pub h: f64, // smoothing length (kernel support is 2h)
    pub theta: f64, // opening angle for the tree gravity traversal
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: 1000.0,
            dt: 0.8,
            g: 6.67430e-11,
            eps: 1.0e-5,
            h: 10.0,
            theta: 0.5,
        }
    }
}
