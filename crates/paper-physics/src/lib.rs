//! # Paper Physics
//!
//! Rigid-sphere particles, their bounding box, and sphere-sphere collision
//! resolution (positional push or contact impulse with optional rotation).

pub mod bounds;
pub mod collision;
pub mod constants;
pub mod error;
pub mod math;
pub mod particle;

pub use bounds::*;
pub use collision::*;
pub use constants::*;
pub use error::*;
pub use particle::*;
