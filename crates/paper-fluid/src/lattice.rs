//! Cubic cell lattice: flat indexing and per-cell solid/fluid state

use glam::{UVec3, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Fluid,
    Solid,
}

/// Which field a boundary pass is applied to.
/// Velocity components are mirrored negated across the faces perpendicular to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Scalar,
    VelocityX,
    VelocityY,
    VelocityZ,
}

#[derive(Debug, Clone)]
pub struct Lattice {
    n: usize,
    state: Vec<CellState>,
    /// Flat indices of every solid cell
    solids: Vec<usize>,
}

impl Lattice {
    /// `n` must already be validated (at least 3)
    pub fn new(n: usize) -> Self {
        Self {
            n,
            state: vec![CellState::Fluid; n * n * n],
            solids: Vec::new(),
        }
    }

    pub fn resolution(&self) -> usize {
        self.n
    }

    pub fn cell_count(&self) -> usize {
        self.n * self.n * self.n
    }

    /// Flat index `x + y·N + z·N²`, each coordinate clamped into the grid
    pub fn ix(&self, x: usize, y: usize, z: usize) -> usize {
        let last = self.n - 1;
        x.min(last) + y.min(last) * self.n + z.min(last) * self.n * self.n
    }

    pub fn contains(&self, cell: UVec3) -> bool {
        (cell.max_element() as usize) < self.n
    }

    pub fn state(&self, x: usize, y: usize, z: usize) -> CellState {
        self.state[self.ix(x, y, z)]
    }

    pub fn is_solid_at(&self, index: usize) -> bool {
        self.state[index] == CellState::Solid
    }

    pub fn solids(&self) -> &[usize] {
        &self.solids
    }

    /// Mark every cell whose unit box `[c, c + 1)` overlaps `[min, max]` as solid.
    /// Returns how many cells changed state.
    pub fn voxelize(&mut self, min: Vec3, max: Vec3) -> usize {
        let mut marked = 0;
        for z in 0..self.n {
            for y in 0..self.n {
                for x in 0..self.n {
                    let low = Vec3::new(x as f32, y as f32, z as f32);
                    let high = low + Vec3::ONE;
                    if !(low.cmplt(max).all() && high.cmpgt(min).all()) {
                        continue;
                    }

                    let index = self.ix(x, y, z);
                    if self.state[index] == CellState::Fluid {
                        self.state[index] = CellState::Solid;
                        self.solids.push(index);
                        marked += 1;
                    }
                }
            }
        }
        marked
    }

    pub fn clear_solids(&mut self) {
        self.state.fill(CellState::Fluid);
        self.solids.clear();
    }
}
