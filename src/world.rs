use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, trace, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sphere_common::{Snapshot, Vec3};

use crate::brick::Brick;
use crate::error::{Result, WorldError};
use crate::grid::{Grid, MAX_CELLS_PER_AXIS};
use crate::interactor::{Interactor, RestSpring};
use crate::sphere::{Sphere, SphereState};

/// Lower corner of the fixed unit domain used by [`World::new`].
pub const UNIT_MIN_BOX: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
/// Upper corner of the fixed unit domain used by [`World::new`].
pub const UNIT_MAX_BOX: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

/// Owns the spheres, bricks, interaction law, clock and spatial grid, and
/// advances them one fixed time step at a time.
///
/// Every change to the sphere collection goes through a `World` method so the
/// grid can be told about it at the same point.
#[derive(Debug, Serialize, Deserialize)]
pub struct World<I = RestSpring> {
    spheres: Vec<Sphere>,
    bricks: Vec<Brick>,
    interactor: I,
    cell_counts: [usize; 3],
    min_box: Vec3,
    max_box: Vec3,
    t: f64,
    dt: f64,
    grid: Grid,
}

impl<I: Default> Default for World<I> {
    /// Unit domain, a single grid cell and a zero time step placeholder.
    fn default() -> Self {
        let cell_counts = [1, 1, 1];
        Self {
            spheres: Vec::new(),
            bricks: Vec::new(),
            interactor: I::default(),
            cell_counts,
            min_box: UNIT_MIN_BOX,
            max_box: UNIT_MAX_BOX,
            t: 0.0,
            dt: 0.0,
            grid: Grid::new(cell_counts, UNIT_MIN_BOX, UNIT_MAX_BOX),
        }
    }
}

/// Cells per axis for a requested cell size, rounded to the nearest integer
/// and kept within `1..=MAX_CELLS_PER_AXIS`. An axis whose cell size is not a
/// positive finite number gets a single cell.
pub fn cell_counts_for(min_box: Vec3, max_box: Vec3, cell_size: Vec3) -> [usize; 3] {
    let mut counts = [1usize; 3];
    for (axis, c) in counts.iter_mut().enumerate() {
        let size = cell_size[axis];
        if !(size.is_finite() && size > 0.0) {
            warn!("Unusable cell size {} on axis {}; using a single cell.", size, axis);
            continue;
        }
        let n = ((max_box[axis] - min_box[axis]) / size + 0.5) as usize;
        if n > MAX_CELLS_PER_AXIS {
            warn!("{} cells requested on axis {}; capping at {}.", n, axis, MAX_CELLS_PER_AXIS);
        }
        *c = n.clamp(1, MAX_CELLS_PER_AXIS);
    }
    counts
}

impl<I: Interactor> World<I> {
    /// World over the unit domain with grid cells of roughly `cell_size`.
    pub fn new(cell_size: Vec3, interactor: I, dt: f64) -> Self {
        Self::with_bounds(UNIT_MIN_BOX, UNIT_MAX_BOX, cell_size, interactor, dt)
    }

    /// World over `[min_box, max_box]`. The bounds never change afterwards.
    pub fn with_bounds(min_box: Vec3, max_box: Vec3, cell_size: Vec3, interactor: I, dt: f64) -> Self {
        let cell_counts = cell_counts_for(min_box, max_box, cell_size);
        debug!("World grid: {:?} cells over {:?}..{:?}", cell_counts, min_box, max_box);
        Self {
            spheres: Vec::new(),
            bricks: Vec::new(),
            interactor,
            cell_counts,
            min_box,
            max_box,
            t: 0.0,
            dt,
            grid: Grid::new(cell_counts, min_box, max_box),
        }
    }

    /// Stamps the reference position and inserts the sphere into the grid and the collection.
    pub fn add_sphere(&mut self, mut s: Sphere) {
        s.x0 = s.x;
        // the grid index must be the slot the sphere is about to occupy
        self.grid.add(&s, self.spheres.len());
        self.spheres.push(s);
    }

    pub fn add_brick(&mut self, b: Brick) {
        self.bricks.push(b);
    }

    pub fn num_spheres(&self) -> usize {
        self.spheres.len()
    }

    pub fn num_bricks(&self) -> usize {
        self.bricks.len()
    }

    pub fn get_sphere(&self, i: usize) -> Result<Sphere> {
        self.spheres.get(i).cloned().ok_or(WorldError::OutOfRange {
            kind: "sphere",
            index: i,
            len: self.spheres.len(),
        })
    }

    pub fn get_brick(&self, i: usize) -> Result<Brick> {
        self.bricks.get(i).cloned().ok_or(WorldError::OutOfRange {
            kind: "brick",
            index: i,
            len: self.bricks.len(),
        })
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn interactor(&self) -> &I {
        &self.interactor
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn cell_counts(&self) -> [usize; 3] {
        self.cell_counts
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.min_box, self.max_box)
    }

    /// Flags every sphere outside `[min_box, max_box]` on any axis for removal.
    pub fn update_flags(&mut self) {
        for s in &mut self.spheres {
            for axis in 0..3 {
                if s.x[axis] < self.min_box[axis] || s.x[axis] > self.max_box[axis] {
                    s.flag = SphereState::Kill;
                }
            }
        }
    }

    /// Erases flagged spheres, highest index first. Returns how many were removed.
    pub fn clean(&mut self) -> usize {
        let mut removed = 0;
        for i in (0..self.spheres.len()).rev() {
            if self.spheres[i].flag == SphereState::Kill {
                // grid first, while `i` still names this sphere
                self.grid.remove(&self.spheres[i], i);
                self.spheres.remove(i);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Removed {} spheres outside the domain at t = {:.6}.", removed, self.t);
        }
        removed
    }

    /// Advances the world by one time step. Returns the number of spheres removed.
    pub fn step(&mut self) -> usize {
        // --- 1. Flag and remove escapees ---
        self.update_flags();
        let removed = self.clean();

        // --- 2. Resync the grid with the latest positions ---
        self.sync_grid();
        debug_assert!(self.grid.matches(&self.spheres));

        // --- 3. Sphere-sphere interactions, once per unordered pair ---
        for i in 0..self.spheres.len() {
            for j in self.grid.get_neighbors(i) {
                if i < j {
                    let (a, b) = pair_mut(&mut self.spheres, i, j);
                    self.interactor.interact_pair(a, b);
                }
            }
        }

        // --- 4. Fixed bodies ---
        for b in &self.bricks {
            for s in &mut self.spheres {
                self.interactor.interact_fixed(b, s);
            }
        }

        // --- 5. Explicit first-order update; orientation is not renormalized ---
        let dt = self.dt;
        for s in &mut self.spheres {
            s.x = s.x + s.v * dt;
            s.q = s.q + s.w * dt;
        }
        // neighbor queries between steps see the integrated positions
        self.sync_grid();

        self.t += dt;
        trace!("Step done: t = {:.6}, {} spheres", self.t, self.spheres.len());
        removed
    }

    /// Runs `n` full steps. Returns the total number of spheres removed.
    pub fn step_n(&mut self, n: u32) -> usize {
        (0..n).map(|_| self.step()).sum()
    }

    /// Summary of the current state; `kinetic_energy` is per unit mass.
    pub fn snapshot(&self, step: u32, removed_total: u32, with_positions: bool) -> Snapshot {
        Snapshot {
            time: self.t,
            step,
            sphere_count: self.spheres.len() as u32,
            removed_total,
            kinetic_energy: self.spheres.iter().map(|s| s.kinetic_energy(1.0)).sum(),
            positions: with_positions.then(|| self.spheres.iter().map(|s| s.x.to_array()).collect()),
        }
    }

    fn sync_grid(&mut self) {
        for (i, s) in self.spheres.iter().enumerate() {
            self.grid.update(s, i);
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid = Grid::new(self.cell_counts, self.min_box, self.max_box);
        self.grid.complete_refresh(&self.spheres);
    }
}

impl<I: Interactor + Serialize + DeserializeOwned> World<I> {
    /// Writes the whole world, grid included, as a bincode blob.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        info!("Saved world ({} spheres, t = {:.6}) to {}", self.spheres.len(), self.t, path.display());
        Ok(())
    }

    /// Replaces this world's state with the one stored at `path`.
    ///
    /// The blob is decoded into a separate staging value and its fields are moved
    /// over one by one. The stored grid is dropped: after out-of-domain spheres are
    /// cleaned, a fresh grid is built from the restored spheres.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let staged: World<I> = bincode::deserialize_from(BufReader::new(File::open(path)?))?;
        let World {
            spheres,
            bricks,
            interactor,
            cell_counts,
            min_box,
            max_box,
            t,
            dt,
            grid: _,
        } = staged;

        self.spheres = spheres;
        self.bricks = bricks;
        self.interactor = interactor;
        self.cell_counts = cell_counts;
        self.min_box = min_box;
        self.max_box = max_box;
        self.t = t;
        self.dt = dt;

        // cleanup needs a grid that tracks the restored indices
        self.rebuild_grid();
        self.update_flags();
        let removed = self.clean();
        self.rebuild_grid();

        info!(
            "Loaded world from {}: {} spheres ({} dropped as out of domain), {} bricks, t = {:.6}",
            path.display(),
            self.spheres.len(),
            removed,
            self.bricks.len(),
            self.t
        );
        Ok(())
    }
}

/// Two distinct mutable elements of `v`, with `i < j`.
fn pair_mut<T>(v: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (lo, hi) = v.split_at_mut(j);
    (&mut lo[i], &mut hi[0])
}
