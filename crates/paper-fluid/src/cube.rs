//! Fluid state and the per-step solver sequence

use glam::{UVec3, Vec3};

use crate::error::FluidError;
use crate::lattice::{Boundary, CellState, Lattice};
use crate::params::FluidParams;
use crate::solver::{advect, diffuse, project};

#[derive(Debug, Clone)]
pub struct FluidCube {
    params: FluidParams,
    lattice: Lattice,

    // Dye
    s: Vec<f32>,
    density: Vec<f32>,

    // Velocity and its scratch copy
    vx: Vec<f32>,
    vy: Vec<f32>,
    vz: Vec<f32>,
    vx0: Vec<f32>,
    vy0: Vec<f32>,
    vz0: Vec<f32>,
}

impl FluidCube {
    pub fn new(params: FluidParams) -> Result<Self, FluidError> {
        params.validate()?;
        let lattice = Lattice::new(params.resolution);
        let zeros = vec![0.0; lattice.cell_count()];

        log::info!(
            "Fluid cube initialized: {}³ cells, dt {}, diffusion {}, viscosity {}",
            params.resolution,
            params.dt,
            params.diffusion,
            params.viscosity
        );

        Ok(Self {
            params,
            lattice,
            s: zeros.clone(),
            density: zeros.clone(),
            vx: zeros.clone(),
            vy: zeros.clone(),
            vz: zeros.clone(),
            vx0: zeros.clone(),
            vy0: zeros.clone(),
            vz0: zeros,
        })
    }

    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    pub fn resolution(&self) -> usize {
        self.lattice.resolution()
    }

    fn index(&self, cell: UVec3) -> Result<usize, FluidError> {
        if !self.lattice.contains(cell) {
            return Err(FluidError::OutOfRange {
                cell,
                resolution: self.lattice.resolution(),
            });
        }
        Ok(self
            .lattice
            .ix(cell.x as usize, cell.y as usize, cell.z as usize))
    }

    /// Add dye to a cell
    pub fn add_density(&mut self, cell: UVec3, amount: f32) -> Result<(), FluidError> {
        let i = self.index(cell)?;
        self.density[i] += amount;
        Ok(())
    }

    pub fn add_velocity(&mut self, cell: UVec3, amount: Vec3) -> Result<(), FluidError> {
        let i = self.index(cell)?;
        self.vx[i] += amount.x;
        self.vy[i] += amount.y;
        self.vz[i] += amount.z;
        Ok(())
    }

    pub fn density(&self, cell: UVec3) -> Result<f32, FluidError> {
        Ok(self.density[self.index(cell)?])
    }

    pub fn velocity(&self, cell: UVec3) -> Result<Vec3, FluidError> {
        let i = self.index(cell)?;
        Ok(Vec3::new(self.vx[i], self.vy[i], self.vz[i]))
    }

    pub fn cell_state(&self, cell: UVec3) -> Result<CellState, FluidError> {
        self.index(cell)?;
        Ok(self
            .lattice
            .state(cell.x as usize, cell.y as usize, cell.z as usize))
    }

    /// Whole density field, flat `x + y·N + z·N²`
    pub fn densities(&self) -> &[f32] {
        &self.density
    }

    pub fn total_density(&self) -> f32 {
        self.density.iter().sum()
    }

    /// Voxelize a box given in cell units into solid cells.
    /// Returns how many cells became solid.
    pub fn add_obstacle(&mut self, min: Vec3, max: Vec3) -> usize {
        let marked = self.lattice.voxelize(min, max);
        for &i in self.lattice.solids() {
            self.density[i] = 0.0;
            self.vx[i] = 0.0;
            self.vy[i] = 0.0;
            self.vz[i] = 0.0;
        }
        log::debug!("obstacle {} to {} marked {} solid cells", min, max, marked);
        marked
    }

    pub fn clear_obstacles(&mut self) {
        self.lattice.clear_solids();
    }

    /// Zero every field. Obstacles are kept.
    pub fn reset(&mut self) {
        for field in [
            &mut self.s,
            &mut self.density,
            &mut self.vx,
            &mut self.vy,
            &mut self.vz,
            &mut self.vx0,
            &mut self.vy0,
            &mut self.vz0,
        ] {
            field.fill(0.0);
        }
    }

    /// Advance one time step
    pub fn step(&mut self) {
        let FluidParams {
            dt,
            diffusion,
            viscosity,
            iterations,
            ..
        } = self.params;
        let lattice = &self.lattice;

        diffuse(lattice, Boundary::VelocityX, &mut self.vx0, &self.vx, viscosity, dt, iterations);
        diffuse(lattice, Boundary::VelocityY, &mut self.vy0, &self.vy, viscosity, dt, iterations);
        diffuse(lattice, Boundary::VelocityZ, &mut self.vz0, &self.vz, viscosity, dt, iterations);

        project(
            lattice,
            &mut self.vx0,
            &mut self.vy0,
            &mut self.vz0,
            &mut self.vx,
            &mut self.vy,
            iterations,
        );

        let flow = [self.vx0.as_slice(), self.vy0.as_slice(), self.vz0.as_slice()];
        advect(lattice, Boundary::VelocityX, &mut self.vx, &self.vx0, flow, dt);
        advect(lattice, Boundary::VelocityY, &mut self.vy, &self.vy0, flow, dt);
        advect(lattice, Boundary::VelocityZ, &mut self.vz, &self.vz0, flow, dt);

        project(
            lattice,
            &mut self.vx,
            &mut self.vy,
            &mut self.vz,
            &mut self.vx0,
            &mut self.vy0,
            iterations,
        );

        diffuse(lattice, Boundary::Scalar, &mut self.s, &self.density, diffusion, dt, iterations);
        let flow = [self.vx.as_slice(), self.vy.as_slice(), self.vz.as_slice()];
        advect(lattice, Boundary::Scalar, &mut self.density, &self.s, flow, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(n: usize) -> FluidCube {
        FluidCube::new(FluidParams::default().with_resolution(n).with_viscosity(0.0)).unwrap()
    }

    #[test]
    fn test_new_rejects_small_grid() {
        assert_eq!(
            FluidCube::new(FluidParams::default().with_resolution(2)).unwrap_err(),
            FluidError::ResolutionTooSmall(2)
        );
    }

    #[test]
    fn test_add_and_read_back() {
        let mut fluid = cube(8);
        let cell = UVec3::new(3, 4, 5);
        fluid.add_density(cell, 2.5).unwrap();
        fluid.add_density(cell, 0.5).unwrap();
        fluid.add_velocity(cell, Vec3::new(1.0, -1.0, 0.5)).unwrap();

        assert_eq!(fluid.density(cell), Ok(3.0));
        assert_eq!(fluid.velocity(cell), Ok(Vec3::new(1.0, -1.0, 0.5)));
        assert_eq!(fluid.total_density(), 3.0);
    }

    #[test]
    fn test_out_of_range_cell() {
        let mut fluid = cube(8);
        let cell = UVec3::new(8, 0, 0);
        assert_eq!(
            fluid.add_density(cell, 1.0),
            Err(FluidError::OutOfRange { cell, resolution: 8 })
        );
        assert!(fluid.velocity(cell).is_err());
    }

    #[test]
    fn test_still_fluid_is_unchanged_by_step() {
        let mut fluid = cube(8);
        fluid.add_density(UVec3::new(3, 3, 3), 4.0).unwrap();
        fluid.add_density(UVec3::new(5, 2, 4), 1.5).unwrap();

        fluid.step();

        assert_eq!(fluid.density(UVec3::new(3, 3, 3)), Ok(4.0));
        assert_eq!(fluid.density(UVec3::new(5, 2, 4)), Ok(1.5));
        assert_eq!(fluid.density(UVec3::new(4, 3, 3)), Ok(0.0));
        assert_eq!(fluid.velocity(UVec3::new(3, 3, 3)), Ok(Vec3::ZERO));
    }

    #[test]
    fn test_velocity_carries_dye() {
        let mut fluid = cube(16);
        let source = UVec3::new(4, 8, 8);
        for x in 1..15 {
            for y in 1..15 {
                for z in 1..15 {
                    fluid.add_velocity(UVec3::new(x, y, z), Vec3::new(0.5, 0.0, 0.0)).unwrap();
                }
            }
        }
        fluid.add_density(source, 10.0).unwrap();

        for _ in 0..3 {
            fluid.step();
        }

        let downstream: f32 = (5..15).map(|x| fluid.density(UVec3::new(x, 8, 8)).unwrap()).sum();
        let upstream: f32 = (1..4).map(|x| fluid.density(UVec3::new(x, 8, 8)).unwrap()).sum();
        assert!(fluid.density(source).unwrap() < 10.0);
        assert!(downstream > upstream);
    }

    #[test]
    fn test_obstacle_cells_stay_empty() {
        let mut fluid = cube(10);
        let inside = UVec3::new(5, 5, 5);
        fluid.add_density(inside, 3.0).unwrap();

        let marked = fluid.add_obstacle(Vec3::splat(4.5), Vec3::splat(6.0));
        assert_eq!(marked, 8);
        assert_eq!(fluid.cell_state(inside), Ok(CellState::Solid));
        assert_eq!(fluid.density(inside), Ok(0.0));

        fluid.add_density(inside, 3.0).unwrap();
        fluid.add_velocity(UVec3::new(3, 5, 5), Vec3::new(2.0, 0.0, 0.0)).unwrap();
        fluid.step();

        assert_eq!(fluid.density(inside), Ok(0.0));
        assert_eq!(fluid.velocity(inside), Ok(Vec3::ZERO));

        fluid.clear_obstacles();
        assert_eq!(fluid.cell_state(inside), Ok(CellState::Fluid));
    }

    #[test]
    fn test_reset_clears_fields() {
        let mut fluid = cube(6);
        fluid.add_density(UVec3::splat(2), 1.0).unwrap();
        fluid.add_velocity(UVec3::splat(2), Vec3::ONE).unwrap();
        fluid.step();

        fluid.reset();

        assert_eq!(fluid.total_density(), 0.0);
        assert_eq!(fluid.velocity(UVec3::splat(2)), Ok(Vec3::ZERO));
    }
}
