use log::{error, warn};
use serde::{Deserialize, Serialize};
use sphere_common::Vec3;

use crate::sphere::Sphere;

/// Uniform spatial grid mapping cells to the indices of the spheres inside them.
///
/// The grid stores sphere *indices*, so it must be told about every change to
/// the owning collection: `add` and `remove` shift the stored indices above the
/// affected slot the same way `Vec::insert` / `Vec::remove` shift the spheres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    cell_counts: [usize; 3],
    min: Vec3,
    max: Vec3,
    inv_cell_size: Vec3,
    /// Sphere indices per cell, flattened x-fastest.
    cells: Vec<Vec<usize>>,
    /// Flat cell of every sphere index currently tracked.
    locations: Vec<usize>,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new([1, 1, 1], Vec3::zero(), Vec3::splat(1.0))
    }
}

/// Largest number of cells along one axis.
pub const MAX_CELLS_PER_AXIS: usize = 128;

impl Grid {
    /// Creates an empty grid of `cell_counts` cells spanning `[min, max]`.
    /// Each count is clamped to `1..=MAX_CELLS_PER_AXIS`.
    pub fn new(cell_counts: [usize; 3], min: Vec3, max: Vec3) -> Self {
        let cell_counts = cell_counts.map(|c| c.clamp(1, MAX_CELLS_PER_AXIS));
        let extent = max - min;
        let inv = |axis: usize| {
            let e = extent[axis];
            if e > 0.0 { cell_counts[axis] as f64 / e } else { 0.0 }
        };
        let num_cells: usize = cell_counts.iter().product();
        Self {
            cell_counts,
            min,
            max,
            inv_cell_size: Vec3::new(inv(0), inv(1), inv(2)),
            cells: vec![Vec::new(); num_cells],
            locations: Vec::new(),
        }
    }

    pub fn cell_counts(&self) -> [usize; 3] {
        self.cell_counts
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of sphere indices currently tracked.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Cell containing `pos`. Positions outside the domain are clamped to the edge cells.
    #[inline(always)]
    pub fn cell_of(&self, pos: Vec3) -> [usize; 3] {
        let mut cell = [0usize; 3];
        for (axis, c) in cell.iter_mut().enumerate() {
            let raw = ((pos[axis] - self.min[axis]) * self.inv_cell_size[axis]).floor() as i64;
            *c = raw.clamp(0, self.cell_counts[axis] as i64 - 1) as usize;
        }
        cell
    }

    /// Cell currently recorded for sphere `index`.
    pub fn location(&self, index: usize) -> Option<[usize; 3]> {
        self.locations.get(index).map(|&flat| self.unflatten(flat))
    }

    /// Sphere indices recorded in `cell`.
    pub fn members(&self, cell: [usize; 3]) -> &[usize] {
        if (0..3).any(|k| cell[k] >= self.cell_counts[k]) {
            return &[];
        }
        &self.cells[self.flatten(cell)]
    }

    /// Records `sphere` at `index`. Indices already at or above `index` move up by one.
    pub fn add(&mut self, sphere: &Sphere, index: usize) {
        if index > self.locations.len() {
            error!(
                "Grid add at index {} past the {} tracked spheres; ignoring.",
                index,
                self.locations.len()
            );
            return;
        }
        if index < self.locations.len() {
            self.shift_indices(|m| if m >= index { m + 1 } else { m });
        }
        let flat = self.flatten(self.cell_of(sphere.x));
        self.cells[flat].push(index);
        self.locations.insert(index, flat);
    }

    /// Forgets sphere `index`. Indices above it move down by one.
    pub fn remove(&mut self, _sphere: &Sphere, index: usize) {
        if index >= self.locations.len() {
            warn!("Grid remove of untracked index {} (len {}).", index, self.locations.len());
            return;
        }
        let flat = self.locations.remove(index);
        self.cells[flat].retain(|&m| m != index);
        if index < self.locations.len() {
            self.shift_indices(|m| if m > index { m - 1 } else { m });
        }
    }

    /// Moves sphere `index` to the cell of its current position, if that changed.
    pub fn update(&mut self, sphere: &Sphere, index: usize) {
        let Some(&old) = self.locations.get(index) else {
            warn!("Grid update of untracked index {} (len {}).", index, self.locations.len());
            return;
        };
        let new = self.flatten(self.cell_of(sphere.x));
        if new != old {
            self.cells[old].retain(|&m| m != index);
            self.cells[new].push(index);
            self.locations[index] = new;
        }
    }

    /// Indices in the 3x3x3 block of cells around sphere `index`, excluding `index` itself.
    pub fn get_neighbors(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(center) = self.location(index) else {
            return out;
        };

        for dz in -1i64..=1 {
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let check = [center[0] as i64 + dx, center[1] as i64 + dy, center[2] as i64 + dz];
                    // Check if grid cell is within bounds
                    if (0..3).all(|k| check[k] >= 0 && check[k] < self.cell_counts[k] as i64) {
                        let flat = self.flatten(check.map(|c| c as usize));
                        out.extend(self.cells[flat].iter().copied().filter(|&m| m != index));
                    }
                }
            }
        }
        out
    }

    /// Discards all membership and reinserts every sphere at its slice index.
    pub fn complete_refresh(&mut self, spheres: &[Sphere]) {
        self.cells.iter_mut().for_each(Vec::clear);
        self.locations.clear();
        self.locations.reserve(spheres.len());
        for (i, s) in spheres.iter().enumerate() {
            let flat = self.flatten(self.cell_of(s.x));
            self.cells[flat].push(i);
            self.locations.push(flat);
        }
    }

    /// True when the grid tracks exactly `spheres`, each in the cell of its current position.
    pub fn matches(&self, spheres: &[Sphere]) -> bool {
        if self.locations.len() != spheres.len() {
            return false;
        }
        let total: usize = self.cells.iter().map(Vec::len).sum();
        if total != spheres.len() {
            return false;
        }
        spheres.iter().enumerate().all(|(i, s)| {
            let flat = self.locations[i];
            flat == self.flatten(self.cell_of(s.x)) && self.cells[flat].contains(&i)
        })
    }

    #[inline(always)]
    fn flatten(&self, cell: [usize; 3]) -> usize {
        (cell[2] * self.cell_counts[1] + cell[1]) * self.cell_counts[0] + cell[0]
    }

    #[inline(always)]
    fn unflatten(&self, flat: usize) -> [usize; 3] {
        let nx = self.cell_counts[0];
        let ny = self.cell_counts[1];
        [flat % nx, (flat / nx) % ny, flat / (nx * ny)]
    }

    fn shift_indices(&mut self, f: impl Fn(usize) -> usize) {
        for cell in &mut self.cells {
            for m in cell.iter_mut() {
                *m = f(*m);
            }
        }
    }
}
