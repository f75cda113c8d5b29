//! Integer-second GPS time and the ordering primitives built on it.

use time::format_description::well_known::Iso8601;
use time::{Duration, OffsetDateTime};

use crate::GpsHistoryError;

/// Whole seconds since the Unix epoch, the time resolution of all stored
/// points.
///
/// The representable range is `[0, u32::MAX - 1]`; the raw value
/// `u32::MAX` is reserved as the storage null sentinel and can never be
/// constructed as a `GpsTime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpsTime(u32);

impl GpsTime {
    /// Largest representable time, one below the storage sentinel.
    pub const MAX: GpsTime = GpsTime(u32::MAX - 1);

    /// Validating constructor.
    pub fn new(seconds: i64) -> Result<Self, GpsHistoryError> {
        if !(0..=Self::MAX.0 as i64).contains(&seconds) {
            return Err(GpsHistoryError::Range {
                what: "GpsTime seconds",
                value: seconds as f64,
            });
        }
        Ok(Self(seconds as u32))
    }

    /// Clamping constructor: out-of-range values saturate to the nearest
    /// representable time instead of failing.
    pub fn clamped(seconds: i64) -> Self {
        Self(seconds.clamp(0, Self::MAX.0 as i64) as u32)
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// Absolute difference in whole seconds.
    pub fn diff(&self, other: &Self) -> u32 {
        self.0.abs_diff(other.0)
    }

    /// Signed difference `self - other` in whole seconds.
    pub fn signed_diff(&self, other: &Self) -> i64 {
        self.0 as i64 - other.0 as i64
    }

    /// Time advanced by `seconds`, saturating at [`GpsTime::MAX`].
    pub fn add_secs(&self, seconds: i64) -> Self {
        Self::clamped(self.0 as i64 + seconds)
    }

    pub fn to_datetime(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(self.0 as i64)
    }

    pub fn from_datetime(datetime: OffsetDateTime) -> Result<Self, GpsHistoryError> {
        Self::new(datetime.unix_timestamp())
    }

    /// ISO 8601 rendering, mostly for exports and diagnostics.
    pub fn to_iso8601(&self) -> Result<String, GpsHistoryError> {
        Ok(self.to_datetime().format(&Iso8601::DEFAULT)?)
    }
}

/// Result of comparing two times or time spans on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrdering {
    Before,
    Same,
    After,
    /// Spans that share time without being identical. Instants never
    /// compare as overlapping.
    Overlapping,
}

impl TimeOrdering {
    /// Ordering seen from the other operand. `Same` and `Overlapping`
    /// are reflexive.
    pub fn inverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            other => other,
        }
    }

    /// Whether the operands occupy the same part of the time axis.
    pub fn is_match(self) -> bool {
        matches!(self, Self::Same | Self::Overlapping)
    }
}

/// Compare two instants.
pub fn compare_time(a: GpsTime, b: GpsTime) -> TimeOrdering {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => TimeOrdering::Before,
        std::cmp::Ordering::Equal => TimeOrdering::Same,
        std::cmp::Ordering::Greater => TimeOrdering::After,
    }
}

/// Compare two half-open spans `[start, end)`. A degenerate span with
/// `start == end` stands for that single instant.
///
/// `a` is before `b` iff `a` ends at or before `b` starts and the two do
/// not share their start; identical spans compare as `Same`; anything
/// else overlaps. Sorting by this comparator is well-defined only when
/// all spans are pairwise non-overlapping.
pub fn compare_span(
    start_a: GpsTime,
    end_a: GpsTime,
    start_b: GpsTime,
    end_b: GpsTime,
) -> TimeOrdering {
    if start_a == start_b && end_a == end_b {
        return TimeOrdering::Same;
    }
    if end_a <= start_b && start_a != start_b {
        return TimeOrdering::Before;
    }
    if end_b <= start_a && start_b != start_a {
        return TimeOrdering::After;
    }
    TimeOrdering::Overlapping
}

/// Whether the instant `at` falls within the half-open span
/// `[start, end)`, where a degenerate span contains exactly its own
/// instant.
pub fn span_contains(start: GpsTime, end: GpsTime, at: GpsTime) -> bool {
    compare_span(at, at, start, end).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_validates_and_clamps() {
        assert_eq!(GpsTime::new(0).unwrap().as_secs(), 0);
        assert_eq!(GpsTime::new(86_400).unwrap().as_secs(), 86_400);
        assert!(GpsTime::new(-1).is_err());
        assert!(GpsTime::new(u32::MAX as i64).is_err());
        assert_eq!(GpsTime::clamped(-5).as_secs(), 0);
        assert_eq!(GpsTime::clamped(i64::MAX), GpsTime::MAX);
    }

    #[test]
    fn instant_comparison() {
        let a = GpsTime::new(10).unwrap();
        let b = GpsTime::new(20).unwrap();
        assert_eq!(compare_time(a, b), TimeOrdering::Before);
        assert_eq!(compare_time(b, a), TimeOrdering::After);
        assert_eq!(compare_time(a, a), TimeOrdering::Same);
    }

    #[test]
    fn span_comparison_is_inverse_commutative() {
        let t = |s| GpsTime::new(s).unwrap();
        let spans = [
            (t(0), t(5), t(5), t(9)),
            (t(0), t(5), t(3), t(9)),
            (t(5), t(5), t(5), t(9)),
            (t(2), t(4), t(2), t(4)),
        ];
        for (sa, ea, sb, eb) in spans {
            assert_eq!(
                compare_span(sa, ea, sb, eb),
                compare_span(sb, eb, sa, ea).inverse()
            );
        }
    }

    #[test]
    fn adjacent_spans_do_not_overlap() {
        let t = |s| GpsTime::new(s).unwrap();
        assert_eq!(compare_span(t(0), t(5), t(5), t(9)), TimeOrdering::Before);
        assert_eq!(compare_span(t(5), t(9), t(0), t(5)), TimeOrdering::After);
    }

    #[test]
    fn degenerate_span_is_the_contained_instant() {
        let t = |s| GpsTime::new(s).unwrap();
        // An instant at the shared start is inside the span.
        assert_eq!(compare_span(t(5), t(5), t(5), t(9)), TimeOrdering::Overlapping);
        // The half-open end excludes the instant.
        assert_eq!(compare_span(t(9), t(9), t(5), t(9)), TimeOrdering::After);
        assert_eq!(compare_span(t(5), t(5), t(5), t(5)), TimeOrdering::Same);
        assert!(span_contains(t(5), t(5), t(5)));
        assert!(span_contains(t(5), t(9), t(7)));
        assert!(!span_contains(t(5), t(9), t(9)));
    }

    #[test]
    fn iso8601_rendering() {
        let t = GpsTime::new(0).unwrap();
        assert!(t.to_iso8601().unwrap().starts_with("1970-01-01T00:00:00"));
    }
}
