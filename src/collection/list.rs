//! List-backed fallback collection: fully materialised point values in
//! a `Vec`, with the same surface and sort policy as the columnar
//! store. Mostly useful for tests and for mixed parser output.

use super::{LatLongE7Source, PointStore, SortingEnforcement};
use crate::types::{codec, PointLike};
use crate::GpsHistoryError;

/// The slow collection. Items are stored unquantised.
#[derive(Debug, Clone)]
pub struct ListCollection<P: PointLike + Clone> {
    items: Vec<P>,
    enforcement: SortingEnforcement,
    sorted_by_time: bool,
}

impl<P: PointLike + Clone> Default for ListCollection<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PointLike + Clone> ListCollection<P> {
    pub fn new() -> Self {
        Self::with_enforcement(SortingEnforcement::default())
    }

    pub fn with_enforcement(enforcement: SortingEnforcement) -> Self {
        Self {
            items: Vec::new(),
            enforcement,
            sorted_by_time: true,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn enforcement(&self) -> SortingEnforcement {
        self.enforcement
    }

    pub fn sorted_by_time(&self) -> bool {
        self.sorted_by_time
    }

    /// Reserve or release backing storage; shrinking below the current
    /// length fails.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), GpsHistoryError> {
        if capacity < self.items.len() {
            return Err(GpsHistoryError::CapacityBelowLength {
                capacity,
                len: self.items.len(),
            });
        }
        if capacity > self.items.capacity() {
            self.items.reserve_exact(capacity - self.items.len());
        } else {
            self.items.shrink_to(capacity);
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<P, GpsHistoryError> {
        self.items
            .get(index)
            .cloned()
            .ok_or(GpsHistoryError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    pub fn first(&self) -> Option<&P> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&P> {
        self.items.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.items.iter()
    }

    pub fn append(&mut self, point: P) -> Result<bool, GpsHistoryError> {
        if let Some(last) = self.items.last() {
            if !last.sorts_before(&point) {
                match self.enforcement {
                    SortingEnforcement::RejectWrongItems => {
                        return Err(GpsHistoryError::SortOrderViolation);
                    }
                    SortingEnforcement::SkipWrongItems => return Ok(false),
                    SortingEnforcement::NotRequired => self.sorted_by_time = false,
                }
            }
        }
        self.items.push(point);
        Ok(true)
    }

    pub fn extend<I>(&mut self, points: I) -> Result<usize, GpsHistoryError>
    where
        I: IntoIterator<Item = P>,
    {
        let mut appended = 0;
        for point in points {
            if self.append(point)? {
                appended += 1;
            }
        }
        Ok(appended)
    }

    /// Overwrite item `index`; the sorted flag is re-derived from the
    /// two neighbours.
    pub fn set(&mut self, index: usize, point: P) -> Result<(), GpsHistoryError> {
        if index >= self.items.len() {
            return Err(GpsHistoryError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        if self.sorted_by_time {
            let before_ok = index == 0 || self.items[index - 1].sorts_before(&point);
            let after_ok =
                index + 1 == self.items.len() || point.sorts_before(&self.items[index + 1]);
            self.sorted_by_time = before_ok && after_ok;
        }
        self.items[index] = point;
        Ok(())
    }

    /// Append another collection's items after this one's. The sort
    /// policy is not consulted; the sorted flag survives only when
    /// both halves are sorted and the seam is in order.
    pub fn merge_mut(&mut self, other: &Self) {
        if other.items.is_empty() {
            return;
        }
        if let (Some(last), Some(first)) = (self.items.last(), other.items.first()) {
            if !last.sorts_before(first) {
                self.sorted_by_time = false;
            }
        }
        if !other.sorted_by_time {
            self.sorted_by_time = false;
        }
        self.items.extend(other.items.iter().cloned());
    }

    /// Merged copy of two collections, leaving `self` untouched.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_mut(other);
        merged
    }

    /// Remove items whose accuracy estimate is worse than
    /// `max_accuracy` meters; unknown accuracies are kept. Returns the
    /// number removed.
    pub fn prune_accuracy_mut(&mut self, max_accuracy: f64) -> usize {
        let before = self.items.len();
        self.items
            .retain(|item| item.accuracy().map_or(true, |a| a <= max_accuracy));
        before - self.items.len()
    }

    /// Latitude-dependent average position of all items, or `None` for
    /// an empty collection.
    pub fn center(&self) -> Option<(f64, f64)> {
        crate::geo::average_position(
            self.items.iter().map(|item| (item.latitude(), item.longitude())),
        )
    }

    pub fn sublist(&self, start: usize, end: usize) -> Result<Self, GpsHistoryError> {
        if start > end || end > self.items.len() {
            return Err(GpsHistoryError::IndexOutOfRange {
                index: start.max(end),
                len: self.items.len(),
            });
        }
        Ok(Self {
            items: self.items[start..end].to_vec(),
            enforcement: self.enforcement,
            sorted_by_time: self.sorted_by_time,
        })
    }
}

impl<P: PointLike + Clone> LatLongE7Source for ListCollection<P> {
    // Quantises on the fly; the columnar stores are the fast path here.
    fn for_each_lat_long_e7<F: FnMut(usize, u32, u32)>(&self, mut f: F) {
        for (index, item) in self.items.iter().enumerate() {
            f(
                index,
                codec::encode_latitude(item.latitude()),
                codec::encode_longitude(item.longitude()),
            );
        }
    }
}

impl<P: PointLike + Clone> PointStore<P> for ListCollection<P> {
    const FAST: bool = false;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Result<P, GpsHistoryError> {
        ListCollection::get(self, index)
    }

    fn sorted_by_time(&self) -> bool {
        self.sorted_by_time
    }

    fn sublist(&self, start: usize, end: usize) -> Result<Self, GpsHistoryError> {
        ListCollection::sublist(self, start, end)
    }
}

impl<P: PointLike + Clone> FromIterator<P> for ListCollection<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut collection = Self::new();
        for point in iter {
            let _ = collection.append(point);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GpsPoint, GpsTime};

    fn p(seconds: i64) -> GpsPoint {
        GpsPoint::new(GpsTime::new(seconds).unwrap(), 1.0, 2.0, None).unwrap()
    }

    #[test]
    fn mirrors_columnar_policy_behaviour() {
        let mut c = ListCollection::with_enforcement(SortingEnforcement::SkipWrongItems);
        assert!(c.append(p(10)).unwrap());
        assert!(!c.append(p(5)).unwrap());
        assert_eq!(c.len(), 1);
        assert!(c.sorted_by_time());

        let mut c = ListCollection::with_enforcement(SortingEnforcement::RejectWrongItems);
        c.append(p(10)).unwrap();
        assert!(c.append(p(5)).is_err());

        let mut c = ListCollection::new();
        c.append(p(10)).unwrap();
        c.append(p(5)).unwrap();
        assert!(!c.sorted_by_time());
    }

    #[test]
    fn stores_exact_values() {
        let mut c = ListCollection::new();
        let point = GpsPoint::new(
            GpsTime::new(3).unwrap(),
            12.345678951,
            -9.876543211,
            Some(1.23),
        )
        .unwrap();
        c.append(point).unwrap();
        // The slow collection does not quantise.
        assert_eq!(c.get(0).unwrap(), point);
    }

    #[test]
    fn merge_and_prune_mirror_the_columnar_store() {
        use crate::types::GpsPointWithAccuracy;
        let point = |seconds: i64, accuracy: Option<f64>| {
            GpsPointWithAccuracy::new(
                GpsTime::new(seconds).unwrap(),
                1.0,
                2.0,
                None,
                accuracy,
            )
            .unwrap()
        };
        let mut first = ListCollection::new();
        first.append(point(10, Some(5.0))).unwrap();
        let mut second = ListCollection::new();
        second.append(point(20, Some(80.0))).unwrap();
        let mut merged = first.merge(&second);
        assert_eq!(merged.len(), 2);
        assert!(merged.sorted_by_time());
        assert_eq!(merged.prune_accuracy_mut(50.0), 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get(0).unwrap().accuracy, Some(5.0));
    }

    #[test]
    fn center_averages_positions() {
        let mut c = ListCollection::new();
        c.append(p(0)).unwrap();
        let (latitude, longitude) = c.center().unwrap();
        assert!((latitude - 1.0).abs() < 1e-9);
        assert!((longitude - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sublist_and_capacity() {
        let mut c = ListCollection::new();
        for seconds in 0..10 {
            c.append(p(seconds)).unwrap();
        }
        let sub = c.sublist(4, 8).unwrap();
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.get(0).unwrap().time.as_secs(), 4);
        assert!(c.set_capacity(5).is_err());
        c.set_capacity(32).unwrap();
        assert!(c.capacity() >= 32);
    }
}
