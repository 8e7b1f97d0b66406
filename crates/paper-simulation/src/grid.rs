//! Uniform broad-phase grid
//!
//! Space is cut into cubic cells of `cell_size`. Cells are keyed by their
//! integer index triple; the cell-aligned world coordinate of a cell is
//! `index * cell_size` (see [`SpatialGrid::cell_origin`]). The grid only stores
//! handles, never particles, and a handle lives in at most one cell.

use std::collections::HashMap;

use glam::{IVec3, UVec3, Vec3};
use paper_physics::Bounds;
use thiserror::Error;

use crate::arena::ParticleId;

/// Outcome of [`SpatialGrid::correct_cell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebucket {
    Unchanged,
    Moved { from: IVec3, to: IVec3 },
}

/// Broken grid bookkeeping found by [`SpatialGrid::verify`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("particle {id:?} is missing from the grid (expected in cell {expected})")]
    Missing { id: ParticleId, expected: IVec3 },
    #[error("particle {id:?} is filed under cell {found} but belongs in {expected}")]
    Misplaced {
        id: ParticleId,
        expected: IVec3,
        found: IVec3,
    },
    #[error("particle {id:?} appears in more than one cell slot")]
    Duplicate { id: ParticleId },
    #[error("grid holds stale handle {id:?}")]
    Stale { id: ParticleId },
}

/// Index of the cell containing `value` along one axis.
///
/// The remainder `r = value % cell_size` keeps the sign of `value`. When
/// `2|r| >= cell_size` the value rounds away from zero to the next cell
/// boundary, otherwise toward zero. Cells are therefore centered on multiples
/// of `cell_size` and the partition is symmetric around the origin.
pub fn round_to_cell(value: f32, cell_size: f32) -> i32 {
    let r = value % cell_size;
    let toward_zero = ((value - r) / cell_size).round() as i32;
    if 2.0 * r.abs() >= cell_size {
        toward_zero + value.signum() as i32
    } else {
        toward_zero
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    /// Cells along x, y, z (columns, rows, planes)
    dimensions: UVec3,
    /// Lowest and highest cell indices that overlap the bounds
    min_cell: IVec3,
    max_cell: IVec3,
    cells: HashMap<IVec3, Vec<ParticleId>>,
}

impl SpatialGrid {
    /// Grid covering `bounds`. `cell_size` must already be validated.
    pub fn new(bounds: &Bounds, cell_size: f32) -> Self {
        let size = bounds.size();
        let dimensions = UVec3::new(
            (size.x / cell_size) as u32,
            (size.y / cell_size) as u32,
            (size.z / cell_size) as u32,
        );

        let to_cell = |p: Vec3| {
            IVec3::new(
                round_to_cell(p.x, cell_size),
                round_to_cell(p.y, cell_size),
                round_to_cell(p.z, cell_size),
            )
        };

        Self {
            cell_size,
            dimensions,
            min_cell: to_cell(bounds.min()),
            max_cell: to_cell(bounds.max()),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Canonical cell of a world position
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        IVec3::new(
            round_to_cell(position.x, self.cell_size),
            round_to_cell(position.y, self.cell_size),
            round_to_cell(position.z, self.cell_size),
        )
    }

    /// Cell-aligned world coordinate (center) of a cell
    pub fn cell_origin(&self, cell: IVec3) -> Vec3 {
        cell.as_vec3() * self.cell_size
    }

    /// Whether a cell overlaps the grid's bounds
    pub fn in_range(&self, cell: IVec3) -> bool {
        cell.cmpge(self.min_cell).all() && cell.cmple(self.max_cell).all()
    }

    pub fn particles_in(&self, cell: IVec3) -> &[ParticleId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, id: ParticleId, cell: IVec3) {
        self.cells.entry(cell).or_default().push(id);
    }

    /// Detach `id` from `cell`. Returns `false` if it was not there.
    pub fn remove(&mut self, id: ParticleId, cell: IVec3) -> bool {
        let Some(list) = self.cells.get_mut(&cell) else {
            return false;
        };
        let Some(slot) = list.iter().position(|&other| other == id) else {
            return false;
        };

        list.swap_remove(slot);
        if list.is_empty() {
            self.cells.remove(&cell);
        }
        true
    }

    /// Move `id` from `old_cell` to the canonical cell of `position` if they differ.
    ///
    /// A handle missing from `old_cell` is still filed under its new cell; the
    /// mismatch is logged and the step carries on.
    pub fn correct_cell(&mut self, id: ParticleId, old_cell: IVec3, position: Vec3) -> Rebucket {
        let new_cell = self.cell_of(position);
        if new_cell == old_cell {
            return Rebucket::Unchanged;
        }

        if !self.remove(id, old_cell) {
            log::warn!("particle {:?} not found in its cell {}", id, old_cell);
        }
        self.insert(id, new_cell);

        Rebucket::Moved {
            from: old_cell,
            to: new_cell,
        }
    }

    /// In-range cells of the 3×3×3 block around `cell`, including `cell` itself
    pub fn neighborhood(&self, cell: IVec3) -> impl Iterator<Item = IVec3> + '_ {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).filter_map(move |dx| {
                    let target = cell + IVec3::new(dx, dy, dz);
                    self.in_range(target).then_some(target)
                })
            })
        })
    }

    /// Call `f(id, other)` for every other handle in the 27 cells around `cell`
    pub fn for_adjacent(&self, id: ParticleId, cell: IVec3, mut f: impl FnMut(ParticleId, ParticleId)) {
        for target in self.neighborhood(cell) {
            for &other in self.particles_in(target) {
                if other != id {
                    f(id, other);
                }
            }
        }
    }

    /// Handles in the 27 cells around `cell`, excluding `id`
    pub fn adjacent(&self, id: ParticleId, cell: IVec3) -> Vec<ParticleId> {
        let mut out = Vec::new();
        self.for_adjacent(id, cell, |_, other| out.push(other));
        out
    }

    /// Cell currently holding `id` (linear scan, for diagnostics)
    pub fn locate(&self, id: ParticleId) -> Option<IVec3> {
        self.cells
            .iter()
            .find_map(|(&cell, list)| list.contains(&id).then_some(cell))
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = (IVec3, &[ParticleId])> + '_ {
        self.cells.iter().map(|(&cell, list)| (cell, list.as_slice()))
    }

    /// Total number of filed handles
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check that every `(id, position)` pair is filed exactly once, in its
    /// canonical cell, and that nothing else is filed.
    pub fn verify(&self, live: impl IntoIterator<Item = (ParticleId, Vec3)>) -> Result<(), GridError> {
        let mut filed: HashMap<ParticleId, IVec3> = HashMap::new();
        for (&cell, list) in &self.cells {
            for &id in list {
                if filed.insert(id, cell).is_some() {
                    return Err(GridError::Duplicate { id });
                }
            }
        }

        for (id, position) in live {
            let expected = self.cell_of(position);
            match filed.remove(&id) {
                None => return Err(GridError::Missing { id, expected }),
                Some(found) if found != expected => {
                    return Err(GridError::Misplaced { id, expected, found })
                }
                Some(_) => {}
            }
        }

        match filed.into_keys().next() {
            Some(id) => Err(GridError::Stale { id }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> ParticleId {
        ParticleId::new(index, 0)
    }

    fn grid() -> SpatialGrid {
        let bounds = Bounds::from_center_size(Vec3::ZERO, Vec3::splat(100.0)).unwrap();
        SpatialGrid::new(&bounds, 10.0)
    }

    #[test]
    fn test_round_to_cell() {
        assert_eq!(round_to_cell(0.0, 10.0), 0);
        assert_eq!(round_to_cell(4.9, 10.0), 0);
        assert_eq!(round_to_cell(5.0, 10.0), 1);
        assert_eq!(round_to_cell(14.0, 10.0), 1);
        assert_eq!(round_to_cell(15.0, 10.0), 2);
        assert_eq!(round_to_cell(-4.9, 10.0), 0);
        assert_eq!(round_to_cell(-5.0, 10.0), -1);
        assert_eq!(round_to_cell(-23.0, 10.0), -2);
        assert_eq!(round_to_cell(-26.0, 10.0), -3);
        assert_eq!(round_to_cell(0.75, 0.5), 2);
        assert_eq!(round_to_cell(0.7, 0.5), 1);
    }

    #[test]
    fn test_dimensions_and_range() {
        let g = grid();
        assert_eq!(g.dimensions(), UVec3::splat(10));
        assert!(g.in_range(IVec3::new(-5, 0, 5)));
        assert!(!g.in_range(IVec3::new(-6, 0, 0)));
        assert!(!g.in_range(IVec3::new(0, 6, 0)));
        assert_eq!(g.cell_origin(IVec3::new(1, -2, 3)), Vec3::new(10.0, -20.0, 30.0));
    }

    #[test]
    fn test_correct_cell_moves_handle() {
        let mut g = grid();
        let a = id(0);
        g.insert(a, IVec3::ZERO);

        let result = g.correct_cell(a, IVec3::ZERO, Vec3::new(12.0, 0.0, 0.0));

        assert_eq!(
            result,
            Rebucket::Moved {
                from: IVec3::ZERO,
                to: IVec3::new(1, 0, 0)
            }
        );
        assert!(g.particles_in(IVec3::ZERO).is_empty());
        assert_eq!(g.particles_in(IVec3::new(1, 0, 0)), &[a]);
        assert_eq!(g.locate(a), Some(IVec3::new(1, 0, 0)));
    }

    #[test]
    fn test_correct_cell_is_idempotent() {
        let mut g = grid();
        let a = id(0);
        g.insert(a, IVec3::new(1, 0, 0));

        let first = g.correct_cell(a, IVec3::new(1, 0, 0), Vec3::new(12.0, 0.0, 0.0));
        let second = g.correct_cell(a, IVec3::new(1, 0, 0), Vec3::new(12.0, 0.0, 0.0));

        assert_eq!(first, Rebucket::Unchanged);
        assert_eq!(second, Rebucket::Unchanged);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_remove_only_matches_exact_handle() {
        let mut g = grid();
        g.insert(id(0), IVec3::ZERO);
        g.insert(id(1), IVec3::ZERO);

        assert!(!g.remove(ParticleId::new(0, 1), IVec3::ZERO));
        assert!(g.remove(id(0), IVec3::ZERO));
        assert!(!g.remove(id(0), IVec3::ZERO));
        assert_eq!(g.particles_in(IVec3::ZERO), &[id(1)]);
    }

    #[test]
    fn test_missing_handle_is_refiled() {
        let mut g = grid();
        let result = g.correct_cell(id(3), IVec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
        assert!(matches!(result, Rebucket::Moved { .. }));
        assert_eq!(g.locate(id(3)), Some(IVec3::new(0, 3, 0)));
    }

    #[test]
    fn test_for_adjacent_visits_27_cells() {
        let mut g = grid();
        let center = IVec3::ZERO;
        let mut next = 1;
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    g.insert(id(next), IVec3::new(dx, dy, dz));
                    next += 1;
                }
            }
        }
        g.insert(id(0), center);
        g.insert(id(100), IVec3::new(2, 0, 0));

        let mut seen = Vec::new();
        g.for_adjacent(id(0), center, |a, b| {
            assert_eq!(a, id(0));
            seen.push(b);
        });

        assert_eq!(seen.len(), 27);
        assert!(!seen.contains(&id(0)));
        assert!(!seen.contains(&id(100)));
    }

    #[test]
    fn test_neighborhood_clips_at_bounds() {
        let g = grid();
        assert_eq!(g.neighborhood(IVec3::ZERO).count(), 27);
        assert_eq!(g.neighborhood(IVec3::new(5, 5, 5)).count(), 8);
        assert_eq!(g.neighborhood(IVec3::new(-5, 0, 0)).count(), 18);
    }

    #[test]
    fn test_empty_neighbourhood_yields_no_calls() {
        let mut g = grid();
        g.insert(id(0), IVec3::ZERO);
        g.insert(id(1), IVec3::new(3, 0, 0));

        let mut calls = 0;
        g.for_adjacent(id(0), IVec3::ZERO, |_, _| calls += 1);

        assert_eq!(calls, 0);
    }

    #[test]
    fn test_verify() {
        let mut g = grid();
        let p = Vec3::new(12.0, 0.0, 0.0);
        g.insert(id(0), IVec3::new(1, 0, 0));
        assert_eq!(g.verify([(id(0), p)]), Ok(()));

        assert_eq!(
            g.verify([(id(0), Vec3::ZERO)]),
            Err(GridError::Misplaced {
                id: id(0),
                expected: IVec3::ZERO,
                found: IVec3::new(1, 0, 0)
            })
        );
        assert_eq!(g.verify(std::iter::empty()), Err(GridError::Stale { id: id(0) }));

        g.insert(id(0), IVec3::ZERO);
        assert_eq!(g.verify([(id(0), p)]), Err(GridError::Duplicate { id: id(0) }));
    }
}
