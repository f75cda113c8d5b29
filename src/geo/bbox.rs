//! Geographic bounding boxes, in degrees and in the quantised integer
//! space of the packed records.
//!
//! Both variants share one contract: `contains` is true for a point on
//! or inside the edges. A box whose right longitude lies left of its
//! left longitude wraps across the antimeridian. A box touching a pole
//! contains every point at that pole regardless of longitude.

use crate::types::codec::{
    encode_latitude, encode_longitude, LATITUDE_E7_MAX, LONGITUDE_E7_MAX,
};
use crate::GpsHistoryError;

/// Bounding box in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticBoundingBox {
    pub bottom_latitude: f64,
    pub left_longitude: f64,
    pub top_latitude: f64,
    pub right_longitude: f64,
}

impl GeodeticBoundingBox {
    pub fn new(
        bottom_latitude: f64,
        left_longitude: f64,
        top_latitude: f64,
        right_longitude: f64,
    ) -> Result<Self, GpsHistoryError> {
        for (what, value) in [
            ("bottom latitude degrees", bottom_latitude),
            ("top latitude degrees", top_latitude),
        ] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(GpsHistoryError::Range { what, value });
            }
        }
        for (what, value) in [
            ("left longitude degrees", left_longitude),
            ("right longitude degrees", right_longitude),
        ] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(GpsHistoryError::Range { what, value });
            }
        }
        if top_latitude < bottom_latitude {
            return Err(GpsHistoryError::Range {
                what: "top latitude below bottom latitude",
                value: top_latitude,
            });
        }
        Ok(Self {
            bottom_latitude,
            left_longitude,
            top_latitude,
            right_longitude,
        })
    }

    /// Whether the box wraps across the antimeridian.
    pub fn wraps(&self) -> bool {
        self.right_longitude < self.left_longitude
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        // Points on a pole the box touches are inside at any longitude.
        if self.top_latitude == 90.0 && latitude == 90.0 {
            return true;
        }
        if self.bottom_latitude == -90.0 && latitude == -90.0 {
            return true;
        }
        if latitude < self.bottom_latitude || latitude > self.top_latitude {
            return false;
        }
        if self.wraps() {
            longitude >= self.left_longitude || longitude <= self.right_longitude
        } else {
            (self.left_longitude..=self.right_longitude).contains(&longitude)
        }
    }
}

/// Bounding box over quantised offset-binary E7 coordinates, matching
/// the packed record encoding. Avoids per-point float work in bulk
/// scans over columnar storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatBoundingBox {
    pub bottom_latitude_e7: u32,
    pub left_longitude_e7: u32,
    pub top_latitude_e7: u32,
    pub right_longitude_e7: u32,
}

impl FlatBoundingBox {
    pub fn new(
        bottom_latitude_e7: u32,
        left_longitude_e7: u32,
        top_latitude_e7: u32,
        right_longitude_e7: u32,
    ) -> Result<Self, GpsHistoryError> {
        for (what, value, max) in [
            ("bottom latitude E7", bottom_latitude_e7, LATITUDE_E7_MAX),
            ("top latitude E7", top_latitude_e7, LATITUDE_E7_MAX),
            ("left longitude E7", left_longitude_e7, LONGITUDE_E7_MAX),
            ("right longitude E7", right_longitude_e7, LONGITUDE_E7_MAX),
        ] {
            if value > max {
                return Err(GpsHistoryError::Range {
                    what,
                    value: value as f64,
                });
            }
        }
        if top_latitude_e7 < bottom_latitude_e7 {
            return Err(GpsHistoryError::Range {
                what: "top latitude below bottom latitude",
                value: top_latitude_e7 as f64,
            });
        }
        Ok(Self {
            bottom_latitude_e7,
            left_longitude_e7,
            top_latitude_e7,
            right_longitude_e7,
        })
    }

    pub fn from_geodetic(geodetic: &GeodeticBoundingBox) -> Self {
        Self {
            bottom_latitude_e7: encode_latitude(geodetic.bottom_latitude),
            left_longitude_e7: encode_longitude(geodetic.left_longitude),
            top_latitude_e7: encode_latitude(geodetic.top_latitude),
            right_longitude_e7: encode_longitude(geodetic.right_longitude),
        }
    }

    pub fn wraps(&self) -> bool {
        self.right_longitude_e7 < self.left_longitude_e7
    }

    pub fn contains(&self, latitude_e7: u32, longitude_e7: u32) -> bool {
        if self.top_latitude_e7 == LATITUDE_E7_MAX && latitude_e7 == LATITUDE_E7_MAX {
            return true;
        }
        if self.bottom_latitude_e7 == 0 && latitude_e7 == 0 {
            return true;
        }
        if latitude_e7 < self.bottom_latitude_e7 || latitude_e7 > self.top_latitude_e7 {
            return false;
        }
        if self.wraps() {
            longitude_e7 >= self.left_longitude_e7 || longitude_e7 <= self.right_longitude_e7
        } else {
            (self.left_longitude_e7..=self.right_longitude_e7).contains(&longitude_e7)
        }
    }
}
