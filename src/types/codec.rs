//! Fixed-width quantisation codecs for packed point records.
//!
//! Every codec is lossy but bounded: a decoded value differs from the
//! encoded input by at most half the quantum, well below typical GPS
//! sensor noise. Out-of-range inputs clamp to the codec's edge values;
//! dedicated sentinels encode null.

use super::GpsTime;

/// Storage null for quantised times.
pub const TIME_NULL: u32 = u32::MAX;
/// Storage null for quantised altitudes.
pub const ALTITUDE_NULL: i16 = i16::MAX;
/// Storage null for deci-quantised u16 values (accuracy, speed,
/// speed accuracy, heading).
pub const DECI_NULL: u16 = u16::MAX;
/// Largest quantised latitude: 180 degrees in E7 units.
pub const LATITUDE_E7_MAX: u32 = 1_800_000_000;
/// Largest quantised longitude: 360 degrees in E7 units.
pub const LONGITUDE_E7_MAX: u32 = 3_600_000_000;

const ALTITUDE_HALF_METERS_MAX: f64 = 32_766.0;
const DECI_MAX: f64 = 65_534.0;

/// Latitude degrees to offset-binary E7: `round((deg + 90) * 1e7)`.
pub fn encode_latitude(degrees: f64) -> u32 {
    ((degrees + 90.0) * 1e7).round().clamp(0.0, LATITUDE_E7_MAX as f64) as u32
}

pub fn decode_latitude(raw: u32) -> f64 {
    raw as f64 * 1e-7 - 90.0
}

/// Longitude degrees to offset-binary E7: `round((deg + 180) * 1e7)`.
pub fn encode_longitude(degrees: f64) -> u32 {
    ((degrees + 180.0) * 1e7).round().clamp(0.0, LONGITUDE_E7_MAX as f64) as u32
}

pub fn decode_longitude(raw: u32) -> f64 {
    raw as f64 * 1e-7 - 180.0
}

/// Altitude meters to half-meter steps; `None` maps to the i16 sentinel.
pub fn encode_altitude(meters: Option<f64>) -> i16 {
    match meters {
        Some(m) => (2.0 * m)
            .round()
            .clamp(-ALTITUDE_HALF_METERS_MAX, ALTITUDE_HALF_METERS_MAX)
            as i16,
        None => ALTITUDE_NULL,
    }
}

pub fn decode_altitude(raw: i16) -> Option<f64> {
    (raw != ALTITUDE_NULL).then(|| raw as f64 / 2.0)
}

/// Non-negative magnitudes (accuracy, speed, speed accuracy) to tenths;
/// `None` maps to the u16 sentinel.
pub fn encode_deci(value: Option<f64>) -> u16 {
    match value {
        Some(v) => (10.0 * v).round().clamp(0.0, DECI_MAX) as u16,
        None => DECI_NULL,
    }
}

pub fn decode_deci(raw: u16) -> Option<f64> {
    (raw != DECI_NULL).then(|| raw as f64 / 10.0)
}

/// Heading degrees to tenths after reduction into `[0, 360)`. Rounding
/// may land on a full circle, which wraps back to zero.
pub fn encode_heading(degrees: Option<f64>) -> u16 {
    match degrees {
        Some(h) => {
            let normalised = h.rem_euclid(360.0);
            ((10.0 * normalised).round() as u32 % 3600) as u16
        }
        None => DECI_NULL,
    }
}

pub fn decode_heading(raw: u16) -> Option<f64> {
    (raw != DECI_NULL).then(|| raw as f64 / 10.0)
}

/// Optional time to its raw storage form; `None` maps to the sentinel.
pub fn encode_time(time: Option<GpsTime>) -> u32 {
    match time {
        Some(t) => t.as_secs(),
        None => TIME_NULL,
    }
}

pub fn decode_time(raw: u32) -> Option<GpsTime> {
    (raw != TIME_NULL).then(|| GpsTime::clamped(raw as i64))
}
