//! Time-keyed search over point stores.
//!
//! Algorithm selection is a two-bit decision: columnar-or-list crossed
//! with sorted-or-not. Sorted stores get a binary search, everything
//! else a linear scan. Linear search succeeds on unsorted input; binary
//! search may miss an existing element there, which is why the
//! dispatching entry point consults the conservative sorted flag.

use crate::collection::PointStore;
use crate::types::{GpsTime, PointLike, TimeOrdering};

/// The four concrete search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAlgorithm {
    LinearSlow,
    LinearFast,
    BinarySlow,
    BinaryFast,
}

/// Strategy for a store described by its `(fast, sorted)` key.
pub fn select_algorithm(fast: bool, sorted_by_time: bool) -> SearchAlgorithm {
    match (fast, sorted_by_time) {
        (true, true) => SearchAlgorithm::BinaryFast,
        (true, false) => SearchAlgorithm::LinearFast,
        (false, true) => SearchAlgorithm::BinarySlow,
        (false, false) => SearchAlgorithm::LinearSlow,
    }
}

/// First index whose comparator reports a match. Correct on any store,
/// sorted or not.
pub fn find_first<P, S, F>(store: &S, cmp: F) -> Option<usize>
where
    P: PointLike,
    S: PointStore<P>,
    F: Fn(&P) -> TimeOrdering,
{
    for index in 0..store.len() {
        if let Ok(item) = store.get(index) {
            if cmp(&item).is_match() {
                return Some(index);
            }
        }
    }
    None
}

/// Any index whose comparator reports a match, by bisection. Ties
/// between equal keys break arbitrarily. Only meaningful on a sorted
/// store.
pub fn find_any<P, S, F>(store: &S, cmp: F) -> Option<usize>
where
    P: PointLike,
    S: PointStore<P>,
    F: Fn(&P) -> TimeOrdering,
{
    let mut low = 0;
    let mut high = store.len();
    while low < high {
        let mid = low + (high - low) / 2;
        let item = store.get(mid).ok()?;
        match cmp(&item) {
            TimeOrdering::Before => low = mid + 1,
            TimeOrdering::After => high = mid,
            TimeOrdering::Same | TimeOrdering::Overlapping => return Some(mid),
        }
    }
    None
}

/// Dispatching search: bisection when the store is known sorted,
/// linear scan otherwise.
pub fn search<P, S, F>(store: &S, cmp: F) -> Option<usize>
where
    P: PointLike,
    S: PointStore<P>,
    F: Fn(&P) -> TimeOrdering,
{
    if store.sorted_by_time() {
        find_any(store, cmp)
    } else {
        find_first(store, cmp)
    }
}

/// Seconds between an item's span and an instant; zero when the
/// instant falls inside the span.
pub fn time_distance<P: PointLike>(item: &P, target: GpsTime) -> u32 {
    let start = item.time();
    let end = item.end_time().max(start);
    if target < start {
        start.diff(&target)
    } else if crate::types::span_contains(start, end, target) {
        0
    } else {
        target.diff(&end)
    }
}

/// Comparator matching items within `tolerance_seconds` of `target`.
/// Monotone over a time-sorted store, so it works under bisection.
pub fn time_comparator<P: PointLike>(
    target: GpsTime,
    tolerance_seconds: u32,
) -> impl Fn(&P) -> TimeOrdering {
    move |item| {
        if time_distance(item, target) <= tolerance_seconds {
            TimeOrdering::Same
        } else if item.end_time() <= target {
            TimeOrdering::Before
        } else {
            TimeOrdering::After
        }
    }
}

/// Index of an item within `tolerance_seconds` of `target`, using the
/// best algorithm for the store.
pub fn find_by_time<P, S>(store: &S, target: GpsTime, tolerance_seconds: u32) -> Option<usize>
where
    P: PointLike,
    S: PointStore<P>,
{
    search(store, time_comparator(target, tolerance_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ColumnarCollection, ListCollection};
    use crate::types::{compare_time, GpsPoint, GpsStay};

    fn t(seconds: i64) -> GpsTime {
        GpsTime::new(seconds).unwrap()
    }

    fn p(seconds: i64) -> GpsPoint {
        GpsPoint::new(t(seconds), 1.0, 2.0, None).unwrap()
    }

    #[test]
    fn algorithm_selection_covers_all_four_cells() {
        assert_eq!(select_algorithm(true, true), SearchAlgorithm::BinaryFast);
        assert_eq!(select_algorithm(true, false), SearchAlgorithm::LinearFast);
        assert_eq!(select_algorithm(false, true), SearchAlgorithm::BinarySlow);
        assert_eq!(select_algorithm(false, false), SearchAlgorithm::LinearSlow);
    }

    #[test]
    fn binary_search_finds_in_sorted_columnar() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        for seconds in (0..1000).step_by(10) {
            c.append(&p(seconds)).unwrap();
        }
        let target = t(500);
        let index = find_any(&c, |item: &GpsPoint| compare_time(item.time, target)).unwrap();
        assert_eq!(c.get(index).unwrap().time, target);
        assert_eq!(
            find_any(&c, |item: &GpsPoint| compare_time(item.time, t(505))),
            None
        );
    }

    #[test]
    fn linear_search_finds_first_in_unsorted_list() {
        let mut c = ListCollection::new();
        for seconds in [50, 10, 30, 10] {
            c.append(p(seconds)).unwrap();
        }
        assert!(!c.sorted_by_time());
        let index = find_first(&c, |item: &GpsPoint| compare_time(item.time, t(10)));
        assert_eq!(index, Some(1));
    }

    #[test]
    fn binary_search_may_miss_on_unsorted_input() {
        let mut c = ListCollection::new();
        for seconds in [50, 10, 30] {
            c.append(p(seconds)).unwrap();
        }
        // Bisection starts at 10, concludes the target 50 lies to the
        // right and never revisits index 0.
        let by_binary = find_any(&c, |item: &GpsPoint| compare_time(item.time, t(50)));
        assert_eq!(by_binary, None);
        // The dispatcher notices the cleared flag and falls back.
        let by_search = search(&c, |item: &GpsPoint| compare_time(item.time, t(50)));
        assert_eq!(by_search, Some(0));
    }

    #[test]
    fn tolerance_comparator_matches_near_items() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        for seconds in [100, 200, 300] {
            c.append(&p(seconds)).unwrap();
        }
        assert_eq!(find_by_time(&c, t(205), 10), Some(1));
        assert_eq!(find_by_time(&c, t(250), 10), None);
        assert_eq!(find_by_time(&c, t(250), 50), Some(1));
    }

    #[test]
    fn span_items_match_inside_their_span() {
        let mut c = ColumnarCollection::<GpsStay>::new();
        c.append(&GpsStay::new(t(100), t(200), 0.0, 0.0, None, None).unwrap())
            .unwrap();
        c.append(&GpsStay::new(t(300), t(400), 0.0, 0.0, None, None).unwrap())
            .unwrap();
        assert_eq!(find_by_time(&c, t(150), 0), Some(0));
        assert_eq!(find_by_time(&c, t(200), 0), Some(0));
        assert_eq!(find_by_time(&c, t(250), 0), None);
        // Both stays are 50 s away; the tie may resolve either way.
        assert!(find_by_time(&c, t(250), 50).is_some());
    }

    #[test]
    fn time_distance_handles_spans_and_instants() {
        let stay = GpsStay::new(t(100), t(200), 0.0, 0.0, None, None).unwrap();
        assert_eq!(time_distance(&stay, t(150)), 0);
        assert_eq!(time_distance(&stay, t(90)), 10);
        assert_eq!(time_distance(&stay, t(230)), 30);
        let point = p(100);
        assert_eq!(time_distance(&point, t(100)), 0);
        assert_eq!(time_distance(&point, t(140)), 40);
    }
}
