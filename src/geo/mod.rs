//! Geodetic primitives: distance formulas, bounding boxes and the
//! sparse spatial grid.

mod bbox;
mod distance;
mod grid;

pub use bbox::{FlatBoundingBox, GeodeticBoundingBox};
pub use distance::{
    average_position, distance, distance_equirectangular, distance_haversine,
    distance_lambert, distance_super_fast, DistanceMethod,
};
pub use grid::{CellIndices, GridCell, SparseGrid};
