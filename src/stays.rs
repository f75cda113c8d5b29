//! Streaming conversion of a point sequence into stays.
//!
//! Temporally and spatially close points collapse into a single stay
//! whose span covers them all. The merger holds at most one pending
//! stay, so it runs in constant memory over arbitrarily long streams.

use crate::geo::{distance, DistanceMethod};
use crate::types::{GpsStay, PointLike};

/// Thresholds deciding when a point still belongs to the pending stay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayMergeOptions {
    /// Largest tolerated gap between the pending stay's end and the
    /// next point, in seconds.
    pub max_time_gap_seconds: u32,
    /// Largest tolerated distance between the pending stay and the
    /// next point, in meters.
    pub max_distance_gap_meters: f64,
}

impl Default for StayMergeOptions {
    fn default() -> Self {
        Self {
            max_time_gap_seconds: 180,
            max_distance_gap_meters: 50.0,
        }
    }
}

// A point improves the pending position when its accuracy is strictly
// better; an unknown accuracy is the worst.
fn better_accuracy(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(c), Some(cur)) => c < cur,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Stateful merger: push points in stream order, collect the stays it
/// completes along the way, then [`StayMerger::finish`].
#[derive(Debug, Clone, Default)]
pub struct StayMerger {
    options: StayMergeOptions,
    pending: Option<GpsStay>,
}

impl StayMerger {
    pub fn new(options: StayMergeOptions) -> Self {
        Self {
            options,
            pending: None,
        }
    }

    /// Consume one point. Returns a stay when this point lies beyond
    /// the time or distance gap of the pending one, which then ends.
    pub fn push<P: PointLike>(&mut self, point: &P) -> Option<GpsStay> {
        let Some(pending) = self.pending.as_mut() else {
            self.pending = Some(GpsStay::from_point(point));
            return None;
        };

        let time_gap = point.time().signed_diff(&pending.end_time);
        let position_gap = distance(
            pending.latitude,
            pending.longitude,
            point.latitude(),
            point.longitude(),
            DistanceMethod::Auto,
        );

        if time_gap <= self.options.max_time_gap_seconds as i64
            && position_gap <= self.options.max_distance_gap_meters
        {
            // Extend the span; points that are themselves spans push
            // the end out by their own end time.
            let end = point.end_time().max(point.time());
            if end > pending.end_time {
                pending.end_time = end;
            }
            if better_accuracy(point.accuracy(), pending.accuracy) {
                pending.latitude = point.latitude();
                pending.longitude = point.longitude();
                pending.altitude = point.altitude();
                pending.accuracy = point.accuracy();
            }
            None
        } else {
            self.pending.replace(GpsStay::from_point(point))
        }
    }

    /// Flush the pending stay, if any. The merger is reusable
    /// afterwards.
    pub fn finish(&mut self) -> Option<GpsStay> {
        self.pending.take()
    }
}

/// Iterator adapter over [`StayMerger`]: lazily turns any point
/// iterator into a stay iterator.
pub fn stays_from_points<I>(
    points: I,
    options: StayMergeOptions,
) -> StayStream<<I as IntoIterator>::IntoIter>
where
    I: IntoIterator,
    I::Item: PointLike,
{
    StayStream {
        merger: StayMerger::new(options),
        points: points.into_iter(),
        done: false,
    }
}

pub struct StayStream<I> {
    merger: StayMerger,
    points: I,
    done: bool,
}

impl<I> Iterator for StayStream<I>
where
    I: Iterator,
    I::Item: PointLike,
{
    type Item = GpsStay;

    fn next(&mut self) -> Option<GpsStay> {
        if self.done {
            return None;
        }
        loop {
            match self.points.next() {
                Some(point) => {
                    if let Some(stay) = self.merger.push(&point) {
                        return Some(stay);
                    }
                }
                None => {
                    self.done = true;
                    return self.merger.finish();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GpsPoint, GpsPointWithAccuracy, GpsTime};

    fn t(seconds: i64) -> GpsTime {
        GpsTime::new(seconds).unwrap()
    }

    fn p(seconds: i64, latitude: f64, longitude: f64) -> GpsPoint {
        GpsPoint::new(t(seconds), latitude, longitude, None).unwrap()
    }

    fn options(gap_seconds: u32, gap_meters: f64) -> StayMergeOptions {
        StayMergeOptions {
            max_time_gap_seconds: gap_seconds,
            max_distance_gap_meters: gap_meters,
        }
    }

    #[test]
    fn close_points_merge_into_one_stay() {
        let points = vec![p(0, 10.0, 20.0), p(5, 10.0, 20.0)];
        let stays: Vec<_> = stays_from_points(points, options(10, 5.0)).collect();
        assert_eq!(stays.len(), 1);
        assert_eq!(stays[0].time, t(0));
        assert_eq!(stays[0].end_time, t(5));
    }

    #[test]
    fn time_gap_splits_stays() {
        let points = vec![p(0, 10.0, 20.0), p(100, 10.0, 20.0)];
        let stays: Vec<_> = stays_from_points(points, options(10, 5.0)).collect();
        assert_eq!(stays.len(), 2);
        assert_eq!(stays[0].time, t(0));
        assert_eq!(stays[1].time, t(100));
    }

    #[test]
    fn distance_gap_splits_stays() {
        // Roughly 111 m apart: beyond a 50 m threshold.
        let points = vec![p(0, 10.0, 20.0), p(5, 10.001, 20.0)];
        let stays: Vec<_> = stays_from_points(points, options(10, 50.0)).collect();
        assert_eq!(stays.len(), 2);
    }

    #[test]
    fn merging_a_stay_with_itself_is_idempotent() {
        let stay = GpsStay::new(t(10), t(50), 10.0, 20.0, None, Some(8.0)).unwrap();
        let mut merger = StayMerger::new(options(10, 5.0));
        assert_eq!(merger.push(&stay), None);
        assert_eq!(merger.push(&stay), None);
        assert_eq!(merger.finish(), Some(stay));
    }

    #[test]
    fn incoming_span_extends_the_end_time() {
        let mut merger = StayMerger::new(options(30, 50.0));
        merger.push(&p(0, 10.0, 20.0));
        let span = GpsStay::new(t(10), t(90), 10.0, 20.0, None, None).unwrap();
        assert_eq!(merger.push(&span), None);
        let merged = merger.finish().unwrap();
        assert_eq!(merged.time, t(0));
        assert_eq!(merged.end_time, t(90));
    }

    #[test]
    fn better_accuracy_adopts_position_but_keeps_start() {
        let coarse = GpsPointWithAccuracy::new(t(0), 10.0, 20.0, None, Some(30.0)).unwrap();
        let fine =
            GpsPointWithAccuracy::new(t(5), 10.0001, 20.0001, Some(12.0), Some(4.0)).unwrap();
        let mut merger = StayMerger::new(options(60, 100.0));
        merger.push(&coarse);
        merger.push(&fine);
        let merged = merger.finish().unwrap();
        assert_eq!(merged.time, t(0));
        assert_eq!(merged.end_time, t(5));
        assert_eq!(merged.latitude, 10.0001);
        assert_eq!(merged.accuracy, Some(4.0));
        assert_eq!(merged.altitude, Some(12.0));
    }

    #[test]
    fn worse_accuracy_keeps_pending_position() {
        let fine = GpsPointWithAccuracy::new(t(0), 10.0, 20.0, None, Some(4.0)).unwrap();
        let coarse = GpsPointWithAccuracy::new(t(5), 10.0001, 20.0, None, None).unwrap();
        let mut merger = StayMerger::new(options(60, 100.0));
        merger.push(&fine);
        merger.push(&coarse);
        let merged = merger.finish().unwrap();
        assert_eq!(merged.latitude, 10.0);
        assert_eq!(merged.accuracy, Some(4.0));
        assert_eq!(merged.end_time, t(5));
    }

    #[test]
    fn finish_flushes_and_resets() {
        let mut merger = StayMerger::new(StayMergeOptions::default());
        assert_eq!(merger.finish(), None);
        merger.push(&p(0, 1.0, 2.0));
        assert!(merger.finish().is_some());
        assert_eq!(merger.finish(), None);
    }
}
