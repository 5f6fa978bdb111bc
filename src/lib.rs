pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{NVec3, Particle, System};
pub use simulation::params::Parameters;
pub use simulation::kernel::KernelTable;
pub use simulation::octree::Node;
pub use simulation::gravity::{direct_accelerations, TreeGravity};
pub use simulation::sph::{update_pressure, SphDensity, SphForces};
pub use simulation::integrator::{run, step};
pub use simulation::scenario::Scenario;

pub use configuration::config::{CloudConfig, ParametersConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_gravity, bench_step};
