//! # Paper Simulation
//!
//! Spatial-grid broad phase and the per-frame step driver. Particles live in
//! a generational arena; the grid files their handles by cell.

pub mod arena;
pub mod container;
pub mod error;
pub mod grid;
pub mod params;
pub mod simulation;

pub use arena::{ParticleArena, ParticleId};
pub use container::Container;
pub use error::SimulationError;
pub use grid::{round_to_cell, GridError, Rebucket, SpatialGrid};
pub use params::*;
pub use simulation::{Simulation, StepStats};
