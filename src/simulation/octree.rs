//! # Spatial octree (3D)
//!
//! Cubic, axis-aligned hierarchical partition of the particle
//! configuration, rebuilt from scratch at the start of every half-step
//! and torn down at its end. The same tree serves two traversal
//! predicates:
//!
//! - the Barnes–Hut opening criterion for gravity (see `gravity`),
//! - the kernel-support overlap test for the SPH passes (see `sph`).
//!
//! Each node stores:
//! - the geometric center and side length of its cubic cell
//! - total mass and mass-weighted center of mass of its particles
//! - its own list of particle records (copies taken at build time)
//! - either zero or exactly eight owned children tiling the cell
//!
//! A node keeps its full particle list even after subdividing. That is
//! redundant storage, but it means "this node holds exactly one
//! particle" is checkable anywhere in the tree, which is the condition
//! the SPH neighbor search leans on.

use anyhow::{bail, Result};

use crate::simulation::states::{NVec3, Particle, System};

/// A particle record copied into the tree at build time.
///
/// `index` is the record's position in the particle store; the density
/// propagation pass uses it to refresh the copy from the store after
/// the density traversal has run.
#[derive(Debug, Clone)]
pub struct NodeParticle {
    pub index: usize,
    pub particle: Particle,
}

/// A single octree node covering a cubic region of space.
pub struct Node {
    pub center: NVec3, // geometric center of the cell
    pub side: f64, // side length of the cell
    pub mass: f64, // aggregate mass of the particles in this cell
    pub com: NVec3, // mass-weighted center of mass
    pub particles: Vec<NodeParticle>, // records in this cell, kept at every level
    pub children: Option<Box<[Node; 8]>>, // present iff subdivided
}

impl Node {
    /// Build the root cell for the current particle configuration.
    ///
    /// The cell center is the midpoint of the component-wise min/max
    /// positions and the side length is the largest component-wise
    /// extent, so every particle lies inside the cube. All particles
    /// are copied into the root's list in store order. The tree itself
    /// is built by a subsequent [`Node::build`] call.
    ///
    /// A coincident or empty configuration yields a zero-size cell; the
    /// build still terminates because of its depth limit.
    pub fn from_system(sys: &System) -> Self {
        let mut min = NVec3::repeat(f64::INFINITY);
        let mut max = NVec3::repeat(f64::NEG_INFINITY);
        for p in &sys.particles {
            for j in 0..3 {
                min[j] = min[j].min(p.x[j]);
                max[j] = max[j].max(p.x[j]);
            }
        }

        let (center, side) = if sys.is_empty() {
            (NVec3::zeros(), 0.0)
        } else {
            let extent = max - min;
            let side = extent.x.max(extent.y).max(extent.z);
            (0.5 * (min + max), side)
        };

        let particles = sys
            .particles
            .iter()
            .enumerate()
            .map(|(index, p)| NodeParticle {
                index,
                particle: p.clone(),
            })
            .collect();

        Self::cell(center, side, particles)
    }

    fn cell(center: NVec3, side: f64, particles: Vec<NodeParticle>) -> Self {
        Self {
            center,
            side,
            mass: 0.0,
            com: center,
            particles,
            children: None,
        }
    }

    /// Number of particles stored at this node.
    pub fn count(&self) -> usize {
        self.particles.len()
    }

    /// Recursively subdivide this node until every occupied cell holds
    /// at most `leaf_capacity` particles or the depth budget runs out.
    ///
    /// At each node, aggregate mass and center of mass are computed
    /// from the node's own particle list *before* any subdivision, so
    /// they equal the direct sum over the cell's particles rather than
    /// a recombination of child aggregates. A massless cell keeps its
    /// geometric center as its center of mass.
    ///
    /// Subdivision always allocates all eight octants; particles are
    /// classified by the sign of their offset from the cell center on
    /// each axis (bit 0 → x, bit 1 → y, bit 2 → z), and only occupied
    /// children are recursed into.
    pub fn build(&mut self, depth: usize, leaf_capacity: usize) {
        let mut mass = 0.0;
        let mut com = NVec3::zeros();
        for np in &self.particles {
            mass += np.particle.m;
            com += np.particle.m * np.particle.x;
        }
        if mass > 0.0 {
            self.com = com / mass;
        } else {
            self.com = self.center;
        }
        self.mass = mass;

        if self.particles.len() <= leaf_capacity || depth == 0 {
            return;
        }

        self.subdivide();
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if !child.particles.is_empty() {
                    child.build(depth - 1, leaf_capacity);
                }
            }
        }
    }

    /// Allocate the eight child octants and distribute copies of this
    /// node's particles among them. The parent list is left intact.
    fn subdivide(&mut self) {
        let half = self.side / 2.0;
        let quarter = self.side / 4.0;

        let mut children = Box::new(std::array::from_fn(|k: usize| {
            let offset = NVec3::new(
                if k & 1 != 0 { quarter } else { -quarter },
                if k & 2 != 0 { quarter } else { -quarter },
                if k & 4 != 0 { quarter } else { -quarter },
            );
            Node::cell(self.center + offset, half, Vec::new())
        }));

        for np in &self.particles {
            let mut k = 0usize;
            if np.particle.x.x > self.center.x {
                k |= 1;
            }
            if np.particle.x.y > self.center.y {
                k |= 2;
            }
            if np.particle.x.z > self.center.z {
                k |= 4;
            }
            children[k].particles.push(np.clone());
        }

        self.children = Some(children);
    }

    /// Whether this cell intersects the kernel support of radius `2h`
    /// centered on `x`: the per-axis offset from the cell center must
    /// stay below `2h + side/2` on every axis.
    pub fn overlaps(&self, x: NVec3, h: f64) -> bool {
        let reach = 2.0 * h + 0.5 * self.side;
        (x.x - self.center.x).abs() < reach
            && (x.y - self.center.y).abs() < reach
            && (x.z - self.center.z).abs() < reach
    }

    /// Refresh the density and pressure of every particle copy in the
    /// tree from the store entry it was taken from, so the force
    /// traversal reads neighbor state computed this half-step.
    ///
    /// Matching is by store index carried in each record, which is
    /// exact at every level of the tree. A zero density here means a
    /// particle ended up with no neighbors inside its own kernel
    /// support — not even itself — and the run aborts.
    pub fn propagate_densities(&mut self, sys: &System) -> Result<()> {
        for np in &mut self.particles {
            let p = &sys.particles[np.index];
            if p.rho == 0.0 {
                bail!(
                    "degenerate density: particle {} has no neighbors within its kernel support",
                    np.index
                );
            }
            np.particle.rho = p.rho;
            np.particle.p = p.p;
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if !child.particles.is_empty() {
                    child.propagate_densities(sys)?;
                }
            }
        }
        Ok(())
    }
}
