//! Per-frame step driver
//!
//! Each step runs four phases per particle in a fixed order: integrate,
//! contain, rebucket, resolve. With [`CollisionOrder::Sequential`] a particle
//! runs all four before the next one moves. With [`CollisionOrder::Deferred`]
//! every particle runs the first three, then a second sweep resolves.

use std::collections::HashSet;

use paper_physics::{Particle, ParticleDesc, ParticleInstance};

use crate::arena::{Entry, ParticleArena, ParticleId};
use crate::container::Container;
use crate::error::SimulationError;
use crate::grid::{GridError, Rebucket, SpatialGrid};
use crate::params::{CollisionOrder, ContainerParams, SimulationParams, TimeStep};

/// Counters gathered during one [`Simulation::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Neighbour handles visited by the broad phase
    pub candidates: usize,
    /// Pairs that overlapped and were handed to the resolver
    pub collisions: usize,
    /// Resolved pairs still penetrating by more than the slop
    pub unresolved: usize,
    /// Grid cell changes
    pub rebucketed: usize,
}

pub struct Simulation {
    params: SimulationParams,
    container: Container,
    particles: ParticleArena,
    /// Canonically ordered pairs already resolved this step
    resolved_pairs: HashSet<(ParticleId, ParticleId)>,
}

impl Simulation {
    pub fn new(container: ContainerParams, params: SimulationParams) -> Result<Self, SimulationError> {
        let container = Container::new(container)?;

        let dims = container.grid().dimensions();
        log::info!(
            "Simulation initialized: bounds {} to {}, {}x{}x{} cells of size {}",
            container.bounds().min(),
            container.bounds().max(),
            dims.x,
            dims.y,
            dims.z,
            container.grid().cell_size()
        );

        Ok(Self {
            params,
            container,
            particles: ParticleArena::new(),
            resolved_pairs: HashSet::new(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SimulationParams) {
        self.params = params;
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn grid(&self) -> &SpatialGrid {
        self.container.grid()
    }

    /// Validate, contain and file a new particle
    pub fn spawn(&mut self, desc: ParticleDesc) -> Result<ParticleId, SimulationError> {
        let mut particle = desc.build()?;
        self.container.check_fits(&particle)?;
        if self.params.contain {
            self.container.bounds().contain(&mut particle);
        }

        let cell = self.container.grid().cell_of(particle.position);
        let id = self.particles.insert(particle, cell);
        self.container.grid_mut().insert(id, cell);

        log::trace!("spawned {:?} at {} in cell {}", id, particle.position, cell);
        Ok(id)
    }

    /// Detach a particle from its cell and the arena
    pub fn remove(&mut self, id: ParticleId) -> Result<Particle, SimulationError> {
        let entry = self
            .particles
            .remove(id)
            .ok_or(SimulationError::UnknownParticle(id))?;

        if !self.container.grid_mut().remove(id, entry.cell) {
            log::warn!("removed particle {:?} was not in its cell {}", id, entry.cell);
        }
        Ok(entry.particle)
    }

    pub fn remove_oldest(&mut self) -> Option<(ParticleId, Particle)> {
        let id = self.particles.oldest()?;
        self.remove(id).ok().map(|particle| (id, particle))
    }

    pub fn get(&self, id: ParticleId) -> Result<&Particle, SimulationError> {
        self.particles
            .get(id)
            .map(|entry| &entry.particle)
            .ok_or(SimulationError::UnknownParticle(id))
    }

    /// Edit a particle in place. It is contained and rebucketed afterwards.
    pub fn update(&mut self, id: ParticleId, f: impl FnOnce(&mut Particle)) -> Result<(), SimulationError> {
        let entry = self
            .particles
            .get_mut(id)
            .ok_or(SimulationError::UnknownParticle(id))?;

        f(&mut entry.particle);
        settle(&mut self.container, self.params.contain, id, entry);
        Ok(())
    }

    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.particles.iter().map(|(id, entry)| (id, &entry.particle))
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Render hand-off, one instance per live particle
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles
            .iter()
            .map(|(_, entry)| entry.particle.instance())
            .collect()
    }

    /// Check that every live particle is filed once, in its canonical cell
    pub fn verify_grid(&self) -> Result<(), SimulationError> {
        let grid = self.container.grid();
        for (id, entry) in self.particles.iter() {
            let expected = grid.cell_of(entry.particle.position);
            if entry.cell != expected {
                return Err(GridError::Misplaced {
                    id,
                    expected,
                    found: entry.cell,
                }
                .into());
            }
        }

        grid.verify(
            self.particles
                .iter()
                .map(|(id, entry)| (id, entry.particle.position)),
        )?;
        Ok(())
    }

    /// Advance the world by `dt`
    pub fn step(&mut self, dt: f32) -> StepStats {
        let mut stats = StepStats::default();
        self.resolved_pairs.clear();

        let ids: Vec<ParticleId> = self.particles.ids().collect();
        match self.params.order {
            CollisionOrder::Sequential => {
                for &id in &ids {
                    self.advance(id, dt, &mut stats);
                    self.resolve_neighbours(id, &mut stats);
                }
            }
            CollisionOrder::Deferred => {
                for &id in &ids {
                    self.advance(id, dt, &mut stats);
                }
                for &id in &ids {
                    self.resolve_neighbours(id, &mut stats);
                }
            }
        }

        if stats.unresolved > 0 {
            log::warn!("{} collisions left penetrating after this step", stats.unresolved);
        }
        log::debug!(
            "step: {} particles, {} candidates, {} collisions, {} rebucketed",
            ids.len(),
            stats.candidates,
            stats.collisions,
            stats.rebucketed
        );
        stats
    }

    /// Integrate, contain and rebucket one particle
    fn advance(&mut self, id: ParticleId, dt: f32, stats: &mut StepStats) {
        let Some(entry) = self.particles.get_mut(id) else {
            return;
        };

        integrate(&mut entry.particle, &self.params, dt);
        if settle(&mut self.container, self.params.contain, id, entry) {
            stats.rebucketed += 1;
        }
    }

    /// Resolve `id` against every overlapping neighbour not yet handled this step
    fn resolve_neighbours(&mut self, id: ParticleId, stats: &mut StepStats) {
        let Some(cell) = self.particles.get(id).map(|entry| entry.cell) else {
            return;
        };
        let neighbours = self.container.grid().adjacent(id, cell);

        for other in neighbours {
            stats.candidates += 1;

            let key = if id < other { (id, other) } else { (other, id) };
            if self.resolved_pairs.contains(&key) {
                continue;
            }
            let Some((a, b)) = self.particles.pair_mut(id, other) else {
                continue;
            };
            let Some(collision) = self.params.resolver.resolve(&mut a.particle, &mut b.particle) else {
                continue;
            };

            self.resolved_pairs.insert(key);
            stats.collisions += 1;
            log::trace!(
                "{:?} <-> {:?}: penetration {:.4}, impulse {:.4}",
                id,
                other,
                collision.contact.penetration,
                collision.impulse
            );

            for (handle, entry) in [(id, &mut *a), (other, &mut *b)] {
                if settle(&mut self.container, self.params.contain, handle, entry) {
                    stats.rebucketed += 1;
                }
            }

            let gap = a.particle.position.distance(b.particle.position);
            if gap < a.particle.radius + b.particle.radius - self.params.slop {
                stats.unresolved += 1;
                log::trace!("collision not resolved: {:?} <-> {:?}", id, other);
            }
        }
    }
}

/// Apply gravity, then move the particle by its velocity
fn integrate(particle: &mut Particle, params: &SimulationParams, dt: f32) {
    let dt = match params.time_step {
        TimeStep::Scaled => dt,
        TimeStep::Fixed => 1.0,
    };

    particle.velocity += params.gravity * dt;
    particle.position += particle.velocity * dt;
    if params.rotation() {
        particle.integrate_rotation(dt);
    }
}

/// Contain (if enabled) and rebucket. Returns whether the cell changed.
fn settle(container: &mut Container, contain: bool, id: ParticleId, entry: &mut Entry) -> bool {
    if contain && container.bounds().contain(&mut entry.particle).any() {
        log::trace!("{:?} hit a wall at {}", id, entry.particle.position);
    }

    match container
        .grid_mut()
        .correct_cell(id, entry.cell, entry.particle.position)
    {
        Rebucket::Moved { to, .. } => {
            entry.cell = to;
            true
        }
        Rebucket::Unchanged => false,
    }
}
