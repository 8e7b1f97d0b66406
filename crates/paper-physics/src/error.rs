use thiserror::Error;

/// Rejected particle or bounds configuration
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ParticleError {
    #[error("particle mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("particle radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("collision damping must lie in [0, 1], got {0}")]
    InvalidDamping(f32),
    #[error("inertia tensor diagonal must be positive, got {0:?}")]
    InvalidInertia([f32; 3]),
    #[error("bounds size must be positive on every axis, got {0:?}")]
    InvalidBounds([f32; 3]),
}
