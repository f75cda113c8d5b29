//! Crate-wide error type.

use std::fmt;

/// Various errors for parsing, storing and querying GPS histories.
#[derive(Debug)]
pub enum GpsHistoryError {
    /// A numeric construction argument is outside its valid domain,
    /// e.g. a latitude beyond 90 degrees or a reversed bounding box.
    Range { what: &'static str, value: f64 },
    /// Indexed access outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// Attempted to shrink a collection's capacity below its length.
    CapacityBelowLength { capacity: usize, len: usize },
    /// An appended item broke time order under the rejecting sort policy.
    /// The collection is left unchanged.
    SortOrderViolation,
    /// A persisted stream's signature was malformed or did not match.
    InvalidSignature(String),
    /// A persisted stream was written by a newer version of this crate.
    UnsupportedVersion { version: u16, supported: u16 },
    /// Failed to format a timestamp as a string.
    TimeFormat(time::error::Format),
    /// IO error wrapper.
    Io(std::io::Error),
    /// Binary read/write error wrapper (persisted streams).
    BinRw(binrw::Error),
}

impl std::error::Error for GpsHistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::BinRw(err) => Some(err),
            Self::TimeFormat(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for GpsHistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { what, value } => {
                write!(f, "{what} out of range: {value}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range for collection of length {len}")
            }
            Self::CapacityBelowLength { capacity, len } => {
                write!(f, "Cannot set capacity {capacity} below current length {len}")
            }
            Self::SortOrderViolation => {
                write!(f, "Item breaks time order of the collection")
            }
            Self::InvalidSignature(msg) => {
                write!(f, "Invalid stream signature: {msg}")
            }
            Self::UnsupportedVersion { version, supported } => {
                write!(f, "Stream version {version} is newer than supported version {supported}")
            }
            Self::TimeFormat(err) => {
                write!(f, "Failed to format timestamp: {err}")
            }
            Self::Io(err) => {
                write!(f, "IO error: {err}")
            }
            Self::BinRw(err) => {
                write!(f, "Binary stream error: {err}")
            }
        }
    }
}

impl From<std::io::Error> for GpsHistoryError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<binrw::Error> for GpsHistoryError {
    fn from(value: binrw::Error) -> Self {
        Self::BinRw(value)
    }
}

impl From<time::error::Format> for GpsHistoryError {
    fn from(value: time::error::Format) -> Self {
        Self::TimeFormat(value)
    }
}
