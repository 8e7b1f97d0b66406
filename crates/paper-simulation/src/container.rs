//! The bounded universe: walls plus the broad-phase grid over them

use paper_physics::{Bounds, Particle};

use crate::error::SimulationError;
use crate::grid::SpatialGrid;
use crate::params::ContainerParams;

#[derive(Debug, Clone)]
pub struct Container {
    bounds: Bounds,
    grid: SpatialGrid,
}

impl Container {
    pub fn new(params: ContainerParams) -> Result<Self, SimulationError> {
        if !(params.cell_size > 0.0) || !params.cell_size.is_finite() {
            return Err(SimulationError::InvalidCellSize(params.cell_size));
        }
        let bounds = Bounds::from_center_size(params.center, params.size)?;
        let grid = SpatialGrid::new(&bounds, params.cell_size);

        Ok(Self { bounds, grid })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut SpatialGrid {
        &mut self.grid
    }

    /// Reject spheres that cannot sit inside the walls on every axis
    pub fn check_fits(&self, particle: &Particle) -> Result<(), SimulationError> {
        if self.bounds.fits(particle.radius) {
            Ok(())
        } else {
            Err(SimulationError::ParticleTooLarge {
                radius: particle.radius,
                size: self.bounds.size().to_array(),
            })
        }
    }
}
