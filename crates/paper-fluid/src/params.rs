//! Fluid solver parameters

use crate::error::FluidError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidParams {
    /// Cells along each axis, boundary layer included
    pub resolution: usize,
    pub dt: f32,
    /// Dye diffusion rate
    pub diffusion: f32,
    pub viscosity: f32,
    /// Gauss-Seidel sweeps per linear solve
    pub iterations: usize,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            resolution: 64,
            dt: 0.2,
            diffusion: 0.0,
            viscosity: 1.0e-7,
            iterations: 4,
        }
    }
}

impl FluidParams {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_diffusion(mut self, diffusion: f32) -> Self {
        self.diffusion = diffusion;
        self
    }

    pub fn with_viscosity(mut self, viscosity: f32) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<(), FluidError> {
        if self.resolution < 3 {
            return Err(FluidError::ResolutionTooSmall(self.resolution));
        }
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(FluidError::InvalidTimeStep(self.dt));
        }
        if !(self.diffusion >= 0.0) {
            return Err(FluidError::NegativeDiffusion(self.diffusion));
        }
        if !(self.viscosity >= 0.0) {
            return Err(FluidError::NegativeViscosity(self.viscosity));
        }
        if self.iterations == 0 {
            return Err(FluidError::NoIterations);
        }
        Ok(())
    }
}
