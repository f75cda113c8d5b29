//! Availability queries over point stores: summary info, item pages,
//! nearest-in-time lookup and per-interval data availability.

use crate::collection::PointStore;
use crate::geo::GeodeticBoundingBox;
use crate::search::find_by_time;
use crate::types::{compare_span, GpsTime, PointLike, TimeOrdering};
use crate::GpsHistoryError;

/// Summary of a store: first start time, last end time and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionInfo {
    pub first_item_start_time: Option<GpsTime>,
    pub last_item_end_time: Option<GpsTime>,
    pub length: usize,
}

/// O(1) on a sorted store, a full scan otherwise.
pub fn query_collection_info<P, S>(store: &S) -> CollectionInfo
where
    P: PointLike,
    S: PointStore<P>,
{
    let length = store.len();
    if length == 0 {
        return CollectionInfo {
            first_item_start_time: None,
            last_item_end_time: None,
            length,
        };
    }
    if store.sorted_by_time() {
        let first = store.get(0).ok().map(|item| item.time());
        let last = store
            .get(length - 1)
            .ok()
            .map(|item| item.end_time().max(item.time()));
        return CollectionInfo {
            first_item_start_time: first,
            last_item_end_time: last,
            length,
        };
    }
    let mut first: Option<GpsTime> = None;
    let mut last: Option<GpsTime> = None;
    for index in 0..length {
        let Ok(item) = store.get(index) else {
            continue;
        };
        let start = item.time();
        let end = item.end_time().max(start);
        first = Some(first.map_or(start, |f| f.min(start)));
        last = Some(last.map_or(end, |l| l.max(end)));
    }
    CollectionInfo {
        first_item_start_time: first,
        last_item_end_time: last,
        length,
    }
}

/// A page of items copied out of a store.
#[derive(Debug, Clone)]
pub struct CollectionItems<S> {
    /// Effective (clamped) start index.
    pub start_index: usize,
    pub items: S,
}

/// Copy `nr_items` items starting at `start_index` into a new store of
/// the same kind. Out-of-range requests clamp to an empty page.
pub fn query_collection_items<P, S>(
    store: &S,
    start_index: usize,
    nr_items: usize,
) -> Result<CollectionItems<S>, GpsHistoryError>
where
    P: PointLike,
    S: PointStore<P>,
{
    let start = start_index.min(store.len());
    let end = start_index.saturating_add(nr_items).min(store.len());
    Ok(CollectionItems {
        start_index: start,
        items: store.sublist(start, end)?,
    })
}

/// Result of a nearest-in-time location lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationByTime {
    /// The queried time, echoed.
    pub time: GpsTime,
    /// Latitude/longitude of a matching item, absent when nothing lies
    /// within tolerance.
    pub location: Option<(f64, f64)>,
    /// The tolerance, echoed.
    pub tolerance_seconds: u32,
}

/// Find a location within `tolerance_seconds` of `time`, using the
/// search framework's algorithm selection.
pub fn query_location_by_time<P, S>(
    store: &S,
    time: GpsTime,
    tolerance_seconds: u32,
) -> LocationByTime
where
    P: PointLike,
    S: PointStore<P>,
{
    let location = find_by_time(store, time, tolerance_seconds)
        .and_then(|index| store.get(index).ok())
        .map(|item| (item.latitude(), item.longitude()));
    LocationByTime {
        time,
        location,
        tolerance_seconds,
    }
}

/// Availability of data within one query interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    NotAvailable,
    AvailableWithinBoundingBox,
    AvailableOutsideBoundingBox,
}

/// Result of a data-availability query; parameters are echoed even
/// when they were invalid and produced no data.
#[derive(Debug, Clone)]
pub struct DataAvailability {
    pub start_time: GpsTime,
    pub end_time: GpsTime,
    pub nr_intervals: usize,
    pub bounding_box: Option<GeodeticBoundingBox>,
    pub data: Vec<Availability>,
}

// Interval boundary i of nr_intervals over [start, end].
fn interval_boundary(start: GpsTime, end: GpsTime, nr_intervals: usize, i: usize) -> GpsTime {
    let span = end.signed_diff(&start) as u128;
    let offset = span * i as u128 / nr_intervals as u128;
    GpsTime::clamped(start.as_secs() as i64 + offset as i64)
}

fn item_availability<P: PointLike>(
    item: &P,
    bounding_box: Option<&GeodeticBoundingBox>,
) -> Availability {
    match bounding_box {
        None => Availability::AvailableWithinBoundingBox,
        Some(bbox) if bbox.contains(item.latitude(), item.longitude()) => {
            Availability::AvailableWithinBoundingBox
        }
        Some(_) => Availability::AvailableOutsideBoundingBox,
    }
}

/// Divide `[start_time, end_time]` into `nr_intervals` equal intervals
/// and classify each as empty, populated inside the bounding box, or
/// populated only outside it. Without a bounding box, populated
/// intervals always classify as within.
///
/// Sorted stores are scanned once in lockstep with the intervals;
/// unsorted stores fall back to one scan per interval. Reversed times
/// or zero intervals yield an empty data vector with the parameters
/// echoed.
pub fn query_data_availability<P, S>(
    store: &S,
    start_time: GpsTime,
    end_time: GpsTime,
    nr_intervals: usize,
    bounding_box: Option<GeodeticBoundingBox>,
) -> DataAvailability
where
    P: PointLike,
    S: PointStore<P>,
{
    let mut result = DataAvailability {
        start_time,
        end_time,
        nr_intervals,
        bounding_box,
        data: Vec::new(),
    };
    if end_time < start_time || nr_intervals == 0 {
        return result;
    }
    result.data.reserve(nr_intervals);

    let bbox = bounding_box.as_ref();
    // The final interval is closed at end_time; with whole-second
    // resolution that equals extending its half-open end by one.
    let interval = |i: usize| {
        let lo = interval_boundary(start_time, end_time, nr_intervals, i);
        let hi = interval_boundary(start_time, end_time, nr_intervals, i + 1);
        let hi = if i + 1 == nr_intervals {
            hi.add_secs(1)
        } else {
            hi
        };
        (lo, hi)
    };

    if store.sorted_by_time() {
        // Lockstep scan: one pass over the store for all intervals.
        let mut next_item = 0;
        for i in 0..nr_intervals {
            let (lo, hi) = interval(i);
            let mut availability = Availability::NotAvailable;
            let mut k = next_item;
            while k < store.len() {
                let Ok(item) = store.get(k) else {
                    break;
                };
                let start = item.time();
                let end = item.end_time().max(start);
                match compare_span(start, end, lo, hi) {
                    TimeOrdering::Before => {
                        // Fully before this interval, thus before all
                        // later ones too.
                        if k == next_item {
                            next_item += 1;
                        }
                        k += 1;
                    }
                    TimeOrdering::After => break,
                    _ => {
                        match item_availability(&item, bbox) {
                            Availability::AvailableWithinBoundingBox => {
                                availability = Availability::AvailableWithinBoundingBox;
                            }
                            other => {
                                if availability == Availability::NotAvailable {
                                    availability = other;
                                }
                            }
                        }
                        if availability == Availability::AvailableWithinBoundingBox {
                            break;
                        }
                        k += 1;
                    }
                }
            }
            result.data.push(availability);
        }
    } else {
        // Unsorted: one scan per interval.
        for i in 0..nr_intervals {
            let (lo, hi) = interval(i);
            let mut availability = Availability::NotAvailable;
            for k in 0..store.len() {
                let Ok(item) = store.get(k) else {
                    continue;
                };
                let start = item.time();
                let end = item.end_time().max(start);
                if !compare_span(start, end, lo, hi).is_match() {
                    continue;
                }
                match item_availability(&item, bbox) {
                    Availability::AvailableWithinBoundingBox => {
                        availability = Availability::AvailableWithinBoundingBox;
                        break;
                    }
                    other => {
                        if availability == Availability::NotAvailable {
                            availability = other;
                        }
                    }
                }
            }
            result.data.push(availability);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ColumnarCollection, ListCollection, SortingEnforcement};
    use crate::types::{GpsPoint, GpsStay};

    fn t(seconds: i64) -> GpsTime {
        GpsTime::new(seconds).unwrap()
    }

    fn p(seconds: i64, latitude: f64, longitude: f64) -> GpsPoint {
        GpsPoint::new(t(seconds), latitude, longitude, None).unwrap()
    }

    #[test]
    fn info_for_sorted_and_unsorted_stores() {
        let mut sorted = ColumnarCollection::<GpsPoint>::new();
        for seconds in [100, 200, 300] {
            sorted.append(&p(seconds, 1.0, 2.0)).unwrap();
        }
        let info = query_collection_info(&sorted);
        assert_eq!(info.first_item_start_time, Some(t(100)));
        assert_eq!(info.last_item_end_time, Some(t(300)));
        assert_eq!(info.length, 3);

        let mut unsorted = ColumnarCollection::<GpsPoint>::new();
        for seconds in [200, 100, 300, 150] {
            unsorted.append(&p(seconds, 1.0, 2.0)).unwrap();
        }
        assert!(!unsorted.sorted_by_time());
        let info = query_collection_info(&unsorted);
        assert_eq!(info.first_item_start_time, Some(t(100)));
        assert_eq!(info.last_item_end_time, Some(t(300)));

        let empty = ColumnarCollection::<GpsPoint>::new();
        let info = query_collection_info(&empty);
        assert_eq!(info.first_item_start_time, None);
        assert_eq!(info.last_item_end_time, None);
        assert_eq!(info.length, 0);
    }

    #[test]
    fn info_uses_stay_end_times() {
        let mut stays = ColumnarCollection::<GpsStay>::new();
        stays
            .append(&GpsStay::new(t(100), t(500), 0.0, 0.0, None, None).unwrap())
            .unwrap();
        let info = query_collection_info(&stays);
        assert_eq!(info.last_item_end_time, Some(t(500)));
    }

    #[test]
    fn item_pages_clamp_to_empty() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        for seconds in 0..10 {
            c.append(&p(seconds, 1.0, 2.0)).unwrap();
        }
        let page = query_collection_items(&c, 4, 3).unwrap();
        assert_eq!(page.start_index, 4);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items.get(0).unwrap().time, t(4));

        // Beyond the end: clamped to an empty page.
        let page = query_collection_items(&c, 100, 5).unwrap();
        assert_eq!(page.start_index, 10);
        assert_eq!(page.items.len(), 0);

        // Partly beyond the end: clamped to the tail.
        let page = query_collection_items(&c, 8, 5).unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn location_by_time_echoes_parameters() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        c.append(&p(100, 12.0, 34.0)).unwrap();
        let hit = query_location_by_time(&c, t(103), 5);
        assert_eq!(hit.time, t(103));
        assert_eq!(hit.tolerance_seconds, 5);
        let (latitude, longitude) = hit.location.unwrap();
        assert!((latitude - 12.0).abs() <= 0.5e-7);
        assert!((longitude - 34.0).abs() <= 0.5e-7);

        let miss = query_location_by_time(&c, t(200), 5);
        assert_eq!(miss.location, None);
    }

    fn availability_scenario() -> ColumnarCollection<GpsPoint> {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        c.append(&p(150, 5.0, 5.0)).unwrap();
        c
    }

    #[test]
    fn single_point_lands_in_its_interval() {
        let c = availability_scenario();
        let bbox = GeodeticBoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, Some(bbox));
        assert_eq!(
            result.data,
            vec![
                Availability::NotAvailable,
                Availability::NotAvailable,
                Availability::AvailableWithinBoundingBox,
                Availability::NotAvailable,
            ]
        );
    }

    #[test]
    fn without_bounding_box_outside_is_never_reported() {
        let c = availability_scenario();
        let result = query_data_availability(&c, t(100), t(200), 4, None);
        assert_eq!(result.data[2], Availability::AvailableWithinBoundingBox);
        assert_eq!(result.data[0], Availability::NotAvailable);
    }

    #[test]
    fn point_outside_the_box_reports_outside() {
        let c = availability_scenario();
        let bbox = GeodeticBoundingBox::new(40.0, 40.0, 50.0, 50.0).unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, Some(bbox));
        assert_eq!(result.data[2], Availability::AvailableOutsideBoundingBox);
    }

    #[test]
    fn inside_beats_outside_within_one_interval() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        c.append(&p(150, 45.0, 45.0)).unwrap();
        c.append(&p(155, 5.0, 5.0)).unwrap();
        let bbox = GeodeticBoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, Some(bbox));
        assert_eq!(result.data[2], Availability::AvailableWithinBoundingBox);
    }

    #[test]
    fn unsorted_store_gives_the_same_answer() {
        let mut c = ListCollection::with_enforcement(SortingEnforcement::NotRequired);
        c.append(p(150, 5.0, 5.0)).unwrap();
        c.append(p(20, 5.0, 5.0)).unwrap();
        assert!(!c.sorted_by_time());
        let bbox = GeodeticBoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, Some(bbox));
        assert_eq!(
            result.data,
            vec![
                Availability::NotAvailable,
                Availability::NotAvailable,
                Availability::AvailableWithinBoundingBox,
                Availability::NotAvailable,
            ]
        );
    }

    #[test]
    fn stay_spanning_intervals_marks_them_all() {
        let mut c = ColumnarCollection::<GpsStay>::new();
        c.append(&GpsStay::new(t(110), t(160), 5.0, 5.0, None, None).unwrap())
            .unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, None);
        assert_eq!(
            result.data,
            vec![
                Availability::AvailableWithinBoundingBox,
                Availability::AvailableWithinBoundingBox,
                Availability::AvailableWithinBoundingBox,
                Availability::NotAvailable,
            ]
        );
    }

    #[test]
    fn closed_end_includes_a_point_at_end_time() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        c.append(&p(200, 5.0, 5.0)).unwrap();
        let result = query_data_availability(&c, t(100), t(200), 4, None);
        assert_eq!(result.data[3], Availability::AvailableWithinBoundingBox);
    }

    #[test]
    fn invalid_parameters_echo_with_empty_data() {
        let c = availability_scenario();
        let reversed = query_data_availability(&c, t(200), t(100), 4, None);
        assert_eq!(reversed.start_time, t(200));
        assert_eq!(reversed.end_time, t(100));
        assert_eq!(reversed.nr_intervals, 4);
        assert!(reversed.data.is_empty());

        let zero = query_data_availability(&c, t(100), t(200), 0, None);
        assert!(zero.data.is_empty());
    }
}
