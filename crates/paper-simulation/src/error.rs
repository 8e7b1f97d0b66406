use paper_physics::ParticleError;
use thiserror::Error;

use crate::arena::ParticleId;
use crate::grid::GridError;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SimulationError {
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    #[error("particle of radius {radius} does not fit in a container of size {size:?}")]
    ParticleTooLarge { radius: f32, size: [f32; 3] },
    #[error("no live particle for handle {0:?}")]
    UnknownParticle(ParticleId),
    #[error(transparent)]
    Particle(#[from] ParticleError),
    #[error(transparent)]
    Grid(#[from] GridError),
}
