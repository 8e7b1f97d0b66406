//! # Paper Fluid
//!
//! Semi-Lagrangian "stable fluids" solver on a cubic cell grid: implicit
//! diffusion, pressure projection and back-traced advection, with optional
//! solid obstacles voxelized into the grid.

pub mod cube;
pub mod error;
pub mod lattice;
pub mod params;
pub mod solver;

pub use cube::FluidCube;
pub use error::FluidError;
pub use lattice::{Boundary, CellState, Lattice};
pub use params::FluidParams;
