//! Store, filter and query large GPS location histories with a small
//! memory footprint.
//!
//! Points live in column-packed collections: fixed-stride binary
//! records in one contiguous buffer, quantised to sensor precision
//! (16 bytes for a plain point, 24 for stays and full measurements).
//! A streaming byte-level parser extracts points from Google
//! location-history JSON without materialising the document, and a
//! query layer answers time and space questions over the collections.
//!
//! ```rs
//! use gps_history_rs::{
//!     ColumnarCollection, FileParseOptions, GpsMeasurement, parser,
//!     query,
//! };
//! use std::path::Path;
//!
//! fn main() -> Result<(), gps_history_rs::GpsHistoryError> {
//!     // Parse a Takeout export, in parallel over byte ranges.
//!     let points = parser::parse_file(
//!         Path::new("Location History.json"),
//!         &FileParseOptions::default(),
//!     )?;
//!
//!     // Pack into 24-byte columnar records.
//!     let collection: ColumnarCollection<GpsMeasurement> =
//!         points.iter().map(|p| p.as_measurement()).collect();
//!
//!     // When was data recorded?
//!     let info = query::query_collection_info(&collection);
//!     println!("{info:?}");
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod constants;
mod errors;
pub mod export;
pub(crate) mod files;
pub mod geo;
pub mod parser;
pub mod persist;
pub mod query;
mod search;
mod stays;
mod types;

pub use collection::{
    ColumnarCollection, LatLongE7Source, ListCollection, PackedPoint, PointStore,
    SortingEnforcement,
};
pub use errors::GpsHistoryError;
pub use geo::{
    average_position, distance, DistanceMethod, FlatBoundingBox, GeodeticBoundingBox,
    SparseGrid,
};
pub use parser::{FileParseOptions, ParserOptions, PointParser, PointStream};
pub use persist::{read_stream, write_stream, Signature};
pub use query::{
    query_collection_info, query_collection_items, query_data_availability,
    query_location_by_time, Availability, CollectionInfo, DataAvailability, LocationByTime,
};
pub use search::{
    find_any, find_by_time, find_first, search, select_algorithm, time_comparator,
    time_distance, SearchAlgorithm,
};
pub use stays::{stays_from_points, StayMergeOptions, StayMerger, StayStream};
pub use types::codec;
pub use types::{
    compare_span, compare_time, span_contains, GpsMeasurement, GpsPoint,
    GpsPointWithAccuracy, GpsStay, GpsTime, ParsedPoint, PointLike, TimeOrdering,
};
