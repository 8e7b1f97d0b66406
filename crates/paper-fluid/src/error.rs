use glam::UVec3;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FluidError {
    #[error("grid resolution must be at least 3, got {0}")]
    ResolutionTooSmall(usize),
    #[error("diffusion must be non-negative, got {0}")]
    NegativeDiffusion(f32),
    #[error("viscosity must be non-negative, got {0}")]
    NegativeViscosity(f32),
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("solver needs at least one relaxation sweep")]
    NoIterations,
    #[error("cell {cell} lies outside a grid of resolution {resolution}")]
    OutOfRange { cell: UVec3, resolution: usize },
}
