//! GPS point variants and their shared accessor trait.
//!
//! Four value types with progressively richer fields: a bare point, a
//! point with a horizontal accuracy estimate, a stay spanning a time
//! interval at one location, and a full measurement with motion data.

use super::time::{compare_span, compare_time, GpsTime, TimeOrdering};
use crate::GpsHistoryError;

fn validate(what: &'static str, value: f64, min: f64, max: f64) -> Result<f64, GpsHistoryError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(GpsHistoryError::Range { what, value })
    }
}

fn validate_latitude(degrees: f64) -> Result<f64, GpsHistoryError> {
    validate("latitude degrees", degrees, -90.0, 90.0)
}

fn validate_longitude(degrees: f64) -> Result<f64, GpsHistoryError> {
    validate("longitude degrees", degrees, -180.0, 180.0)
}

fn validate_non_negative(
    what: &'static str,
    value: Option<f64>,
) -> Result<Option<f64>, GpsHistoryError> {
    match value {
        Some(v) if v < 0.0 => Err(GpsHistoryError::Range { what, value: v }),
        other => Ok(other),
    }
}

/// Shared read access for all point variants.
///
/// Span variants set [`PointLike::IS_SPAN`] and report a real
/// [`PointLike::end_time`]; everything else behaves as an instant.
pub trait PointLike {
    /// Span variants compare with the span rules instead of instant
    /// order.
    const IS_SPAN: bool = false;

    fn time(&self) -> GpsTime;
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;

    fn altitude(&self) -> Option<f64> {
        None
    }

    fn accuracy(&self) -> Option<f64> {
        None
    }

    /// End of the item's time span; equals [`PointLike::time`] for
    /// instant variants.
    fn end_time(&self) -> GpsTime {
        self.time()
    }

    /// Ordering of `self` relative to `other` on the time axis.
    fn time_order(&self, other: &Self) -> TimeOrdering {
        if Self::IS_SPAN {
            compare_span(self.time(), self.end_time(), other.time(), other.end_time())
        } else {
            compare_time(self.time(), other.time())
        }
    }

    /// Whether `next` may directly follow `self` in a time-sorted
    /// collection: strictly after for instants, before-or-same for
    /// spans.
    fn sorts_before(&self, next: &Self) -> bool {
        match self.time_order(next) {
            TimeOrdering::Before => true,
            TimeOrdering::Same => Self::IS_SPAN,
            _ => false,
        }
    }
}

/// A timestamped WGS-84 position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsPoint {
    pub time: GpsTime,
    /// Degrees in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees in `[-180, 180]`.
    pub longitude: f64,
    /// Meters above the WGS-84 ellipsoid.
    pub altitude: Option<f64>,
}

impl GpsPoint {
    pub fn new(
        time: GpsTime,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
    ) -> Result<Self, GpsHistoryError> {
        Ok(Self {
            time,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            altitude,
        })
    }
}

impl PointLike for GpsPoint {
    fn time(&self) -> GpsTime {
        self.time
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn altitude(&self) -> Option<f64> {
        self.altitude
    }
}

/// A position with a horizontal accuracy estimate in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsPointWithAccuracy {
    pub time: GpsTime,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Estimated horizontal error radius in meters; smaller is better.
    pub accuracy: Option<f64>,
}

impl GpsPointWithAccuracy {
    pub fn new(
        time: GpsTime,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        accuracy: Option<f64>,
    ) -> Result<Self, GpsHistoryError> {
        Ok(Self {
            time,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            altitude,
            accuracy: validate_non_negative("accuracy meters", accuracy)?,
        })
    }
}

impl From<GpsPoint> for GpsPointWithAccuracy {
    fn from(point: GpsPoint) -> Self {
        Self {
            time: point.time,
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: point.altitude,
            accuracy: None,
        }
    }
}

impl PointLike for GpsPointWithAccuracy {
    fn time(&self) -> GpsTime {
        self.time
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }
}

/// A dwell at one location over the half-open span `[time, end_time)`.
/// A stay with `time == end_time` stands for that single instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsStay {
    pub time: GpsTime,
    /// Never before `time`.
    pub end_time: GpsTime,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
}

impl GpsStay {
    pub fn new(
        time: GpsTime,
        end_time: GpsTime,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        accuracy: Option<f64>,
    ) -> Result<Self, GpsHistoryError> {
        if end_time < time {
            return Err(GpsHistoryError::Range {
                what: "stay end time seconds",
                value: end_time.as_secs() as f64,
            });
        }
        Ok(Self {
            time,
            end_time,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            altitude,
            accuracy: validate_non_negative("accuracy meters", accuracy)?,
        })
    }

    /// Degenerate or inherited stay at the point's position, spanning
    /// the point's own time span.
    pub fn from_point<P: PointLike>(point: &P) -> Self {
        let time = point.time();
        Self {
            time,
            end_time: point.end_time().max(time),
            latitude: point.latitude(),
            longitude: point.longitude(),
            altitude: point.altitude(),
            accuracy: point.accuracy(),
        }
    }

    /// Span length in whole seconds.
    pub fn duration_secs(&self) -> u32 {
        self.end_time.diff(&self.time)
    }
}

impl PointLike for GpsStay {
    const IS_SPAN: bool = true;

    fn time(&self) -> GpsTime {
        self.time
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    fn end_time(&self) -> GpsTime {
        self.end_time
    }
}

/// A full sensor measurement: position, accuracy and motion data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsMeasurement {
    pub time: GpsTime,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    /// Course over ground in degrees, `[0, 360)`.
    pub heading: Option<f64>,
    /// Speed over ground in meters per second.
    pub speed: Option<f64>,
    /// Estimated speed error in meters per second.
    pub speed_accuracy: Option<f64>,
}

impl GpsMeasurement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: GpsTime,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        accuracy: Option<f64>,
        heading: Option<f64>,
        speed: Option<f64>,
        speed_accuracy: Option<f64>,
    ) -> Result<Self, GpsHistoryError> {
        if let Some(h) = heading {
            if !(0.0..360.0).contains(&h) {
                return Err(GpsHistoryError::Range {
                    what: "heading degrees",
                    value: h,
                });
            }
        }
        Ok(Self {
            time,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            altitude,
            accuracy: validate_non_negative("accuracy meters", accuracy)?,
            heading,
            speed: validate_non_negative("speed m/s", speed)?,
            speed_accuracy: validate_non_negative("speed accuracy m/s", speed_accuracy)?,
        })
    }
}

impl From<GpsPoint> for GpsMeasurement {
    fn from(point: GpsPoint) -> Self {
        Self {
            time: point.time,
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: point.altitude,
            ..Self::default()
        }
    }
}

impl From<GpsPointWithAccuracy> for GpsMeasurement {
    fn from(point: GpsPointWithAccuracy) -> Self {
        Self {
            time: point.time,
            latitude: point.latitude,
            longitude: point.longitude,
            altitude: point.altitude,
            accuracy: point.accuracy,
            ..Self::default()
        }
    }
}

impl PointLike for GpsMeasurement {
    fn time(&self) -> GpsTime {
        self.time
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }
}

/// What the streaming parser emits: a bare point, or a measurement when
/// the source carried an accuracy estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedPoint {
    Point(GpsPoint),
    Measurement(GpsMeasurement),
}

impl ParsedPoint {
    pub fn as_measurement(&self) -> GpsMeasurement {
        match *self {
            Self::Point(p) => p.into(),
            Self::Measurement(m) => m,
        }
    }
}

impl PointLike for ParsedPoint {
    fn time(&self) -> GpsTime {
        match self {
            Self::Point(p) => p.time,
            Self::Measurement(m) => m.time,
        }
    }

    fn latitude(&self) -> f64 {
        match self {
            Self::Point(p) => p.latitude,
            Self::Measurement(m) => m.latitude,
        }
    }

    fn longitude(&self) -> f64 {
        match self {
            Self::Point(p) => p.longitude,
            Self::Measurement(m) => m.longitude,
        }
    }

    fn altitude(&self) -> Option<f64> {
        match self {
            Self::Point(p) => p.altitude,
            Self::Measurement(m) => m.altitude,
        }
    }

    fn accuracy(&self) -> Option<f64> {
        match self {
            Self::Point(_) => None,
            Self::Measurement(m) => m.accuracy,
        }
    }
}
