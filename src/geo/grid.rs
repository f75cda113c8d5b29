//! Sparse spatial index over roughly 10-meter grid cells.
//!
//! Cells are keyed by the quantised coordinates divided by the cell
//! edge. Most cells in real histories hold a single point, so the map
//! stores a packed `i32` per cell: `+k` is the single index `k - 1`,
//! `-k` points at slot `k - 1` of an auxiliary multi-index table. Empty
//! cells are simply absent.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::FlatBoundingBox;
use crate::collection::LatLongE7Source;
use crate::constants::GRID_CELL_E7;

/// A grid cell address: quantised latitude and longitude divided by
/// the cell edge.
pub type GridCell = (u32, u32);

// One 64-bit key per cell; the high half carries the latitude cell so
// nearby cells spread over the map.
fn cell_key(latitude_e7: u32, longitude_e7: u32) -> u64 {
    let lat_cell = latitude_e7 / GRID_CELL_E7;
    let long_cell = longitude_e7 / GRID_CELL_E7;
    ((lat_cell as u64) << 32) | long_cell as u64
}

fn key_to_cell(key: u64) -> GridCell {
    ((key >> 32) as u32, key as u32)
}

/// Indices stored in one grid cell.
#[derive(Debug, Clone, Copy)]
pub enum CellIndices<'a> {
    Empty,
    Single(u32),
    Many(&'a [u32]),
}

impl CellIndices<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let (single, many): (Option<u32>, &[u32]) = match *self {
            Self::Empty => (None, &[]),
            Self::Single(index) => (Some(index), &[]),
            Self::Many(indices) => (None, indices),
        };
        single.into_iter().chain(many.iter().copied())
    }
}

/// Immutable-after-build spatial index mapping grid cells to the
/// indices of the points inside them.
#[derive(Debug, Clone, Default)]
pub struct SparseGrid {
    cells: HashMap<u64, i32>,
    multi: Vec<Vec<u32>>,
    items: usize,
}

impl SparseGrid {
    /// Build in a single pass over the collection's quantised
    /// coordinates.
    pub fn from_collection<C: LatLongE7Source>(collection: &C) -> Self {
        let mut grid = Self::default();
        collection.for_each_lat_long_e7(|index, latitude_e7, longitude_e7| {
            grid.insert(latitude_e7, longitude_e7, index as u32);
        });
        grid
    }

    fn insert(&mut self, latitude_e7: u32, longitude_e7: u32, index: u32) {
        self.items += 1;
        match self.cells.entry(cell_key(latitude_e7, longitude_e7)) {
            Entry::Vacant(slot) => {
                slot.insert(index as i32 + 1);
            }
            Entry::Occupied(mut slot) => {
                let packed = *slot.get();
                if packed > 0 {
                    // Second hit: move the cell to the multi table.
                    self.multi.push(vec![(packed - 1) as u32, index]);
                    slot.insert(-(self.multi.len() as i32));
                } else {
                    self.multi[(-packed - 1) as usize].push(index);
                }
            }
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Indices of points whose quantised position falls in the same
    /// cell as the given coordinates.
    pub fn indices_at(&self, latitude_e7: u32, longitude_e7: u32) -> CellIndices<'_> {
        match self.cells.get(&cell_key(latitude_e7, longitude_e7)) {
            None => CellIndices::Empty,
            Some(&packed) if packed > 0 => CellIndices::Single((packed - 1) as u32),
            Some(&packed) => CellIndices::Many(&self.multi[(-packed - 1) as usize]),
        }
    }

    /// Visit every non-empty cell with its indices. Iteration order is
    /// unspecified.
    pub fn for_each_cell<F: FnMut(GridCell, &[u32])>(&self, mut f: F) {
        for (&key, &packed) in &self.cells {
            let cell = key_to_cell(key);
            if packed > 0 {
                f(cell, &[(packed - 1) as u32]);
            } else {
                f(cell, &self.multi[(-packed - 1) as usize]);
            }
        }
    }

    /// Bulk scan: indices of all points inside a flat bounding box,
    /// cell by cell. Cells are tested by their corner coordinates, so
    /// the result is per-point exact only up to the ~10 m cell edge.
    pub fn indices_in_box(&self, bbox: &FlatBoundingBox) -> Vec<u32> {
        let mut out = Vec::new();
        self.for_each_cell(|(lat_cell, long_cell), indices| {
            let latitude_e7 = lat_cell * GRID_CELL_E7;
            let longitude_e7 = long_cell * GRID_CELL_E7;
            if bbox.contains(latitude_e7, longitude_e7) {
                out.extend_from_slice(indices);
            }
        });
        out.sort_unstable();
        out
    }
}
