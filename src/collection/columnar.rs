//! Column-packed point storage: fixed-stride records in one contiguous
//! byte buffer, addressed by index.

use std::marker::PhantomData;

use super::record::PackedPoint;
use super::{LatLongE7Source, PointStore, SortingEnforcement};
use crate::types::PointLike;
use crate::GpsHistoryError;

// Upper bound on any record stride, sizing the append scratch buffer.
const MAX_STRIDE: usize = 32;

/// The fast collection: one point variant packed into a byte buffer of
/// `capacity * STRIDE` bytes plus a length counter.
///
/// Appends are amortised O(1) through geometric buffer growth. The
/// `sorted_by_time` flag is a conservative underapproximation: when
/// true, the stored records are guaranteed to be in time order.
#[derive(Debug, Clone)]
pub struct ColumnarCollection<R: PackedPoint> {
    buf: Vec<u8>,
    len: usize,
    enforcement: SortingEnforcement,
    sorted_by_time: bool,
    _variant: PhantomData<R>,
}

impl<R: PackedPoint> Default for ColumnarCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PackedPoint> ColumnarCollection<R> {
    pub fn new() -> Self {
        Self::with_enforcement(SortingEnforcement::default())
    }

    pub fn with_enforcement(enforcement: SortingEnforcement) -> Self {
        Self {
            buf: Vec::new(),
            len: 0,
            enforcement,
            sorted_by_time: true,
            _variant: PhantomData,
        }
    }

    /// Pre-allocated collection for a known point count.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut collection = Self::new();
        collection.buf = vec![0; capacity * R::STRIDE];
        collection
    }

    /// Rebuild from raw record bytes, e.g. a persisted stream payload.
    /// `sorted_by_time` must only be true when the records are known to
    /// be in time order.
    pub(crate) fn from_raw_bytes(
        bytes: Vec<u8>,
        len: usize,
        sorted_by_time: bool,
    ) -> Result<Self, GpsHistoryError> {
        if bytes.len() < len * R::STRIDE {
            return Err(GpsHistoryError::IndexOutOfRange {
                index: len,
                len: bytes.len() / R::STRIDE,
            });
        }
        Ok(Self {
            buf: bytes,
            len,
            enforcement: SortingEnforcement::default(),
            sorted_by_time,
            _variant: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of records the buffer can hold without growing.
    pub fn capacity(&self) -> usize {
        self.buf.len() / R::STRIDE
    }

    pub fn enforcement(&self) -> SortingEnforcement {
        self.enforcement
    }

    pub fn sorted_by_time(&self) -> bool {
        self.sorted_by_time
    }

    /// The encoded records `[0, len)` as raw bytes.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.buf[..self.len * R::STRIDE]
    }

    /// Grow or shrink the buffer to hold exactly `capacity` records.
    /// Shrinking below the current length fails and leaves the
    /// collection unchanged.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), GpsHistoryError> {
        if capacity < self.len {
            return Err(GpsHistoryError::CapacityBelowLength {
                capacity,
                len: self.len,
            });
        }
        self.buf.resize(capacity * R::STRIDE, 0);
        self.buf.shrink_to_fit();
        Ok(())
    }

    fn record_slice(&self, index: usize) -> &[u8] {
        &self.buf[index * R::STRIDE..(index + 1) * R::STRIDE]
    }

    // Decode without a bounds check; callers guarantee `index < len`.
    fn record(&self, index: usize) -> R {
        R::decode_from(self.record_slice(index))
    }

    pub fn get(&self, index: usize) -> Result<R, GpsHistoryError> {
        if index >= self.len {
            return Err(GpsHistoryError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(self.record(index))
    }

    pub fn first(&self) -> Option<R> {
        (self.len > 0).then(|| self.record(0))
    }

    pub fn last(&self) -> Option<R> {
        (self.len > 0).then(|| self.record(self.len - 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = R> + '_ {
        (0..self.len).map(|i| self.record(i))
    }

    fn grow_for(&mut self, needed_records: usize) {
        let capacity = self.capacity();
        if needed_records <= capacity {
            return;
        }
        // Geometric growth keeps appends amortised O(1).
        let grown = capacity + capacity / 2;
        let new_capacity = needed_records.max(grown).max(8);
        self.buf.resize(new_capacity * R::STRIDE, 0);
    }

    /// Quantise and append one point.
    ///
    /// Returns `Ok(false)` when the skipping policy dropped an
    /// out-of-order item; fails with
    /// [`GpsHistoryError::SortOrderViolation`] under the rejecting
    /// policy, leaving the collection unchanged.
    pub fn append(&mut self, point: &R) -> Result<bool, GpsHistoryError> {
        let mut scratch = [0u8; MAX_STRIDE];
        let scratch = &mut scratch[..R::STRIDE];
        point.encode_into(scratch);
        // Order is checked against the value as stored, i.e. after
        // quantisation.
        let quantised = R::decode_from(scratch);

        if self.len > 0 {
            let last = self.record(self.len - 1);
            if !last.sorts_before(&quantised) {
                match self.enforcement {
                    SortingEnforcement::RejectWrongItems => {
                        return Err(GpsHistoryError::SortOrderViolation);
                    }
                    SortingEnforcement::SkipWrongItems => return Ok(false),
                    SortingEnforcement::NotRequired => self.sorted_by_time = false,
                }
            }
        }

        self.grow_for(self.len + 1);
        let offset = self.len * R::STRIDE;
        self.buf[offset..offset + R::STRIDE].copy_from_slice(scratch);
        self.len += 1;
        Ok(true)
    }

    /// Repeated append with batched growth; the sort policy applies per
    /// item. Returns the number of items actually stored.
    pub fn extend<I>(&mut self, points: I) -> Result<usize, GpsHistoryError>
    where
        I: IntoIterator<Item = R>,
    {
        let points = points.into_iter();
        let (lower, _) = points.size_hint();
        self.grow_for(self.len + lower);
        let mut appended = 0;
        for point in points {
            if self.append(&point)? {
                appended += 1;
            }
        }
        Ok(appended)
    }

    /// Overwrite record `index` in place. The sorted flag is re-derived
    /// from the two neighbours, which is exact for an already-sorted
    /// collection and conservative otherwise.
    pub fn set(&mut self, index: usize, point: &R) -> Result<(), GpsHistoryError> {
        if index >= self.len {
            return Err(GpsHistoryError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let mut scratch = [0u8; MAX_STRIDE];
        let scratch = &mut scratch[..R::STRIDE];
        point.encode_into(scratch);
        let quantised = R::decode_from(scratch);

        if self.sorted_by_time {
            let before_ok = index == 0 || self.record(index - 1).sorts_before(&quantised);
            let after_ok =
                index + 1 == self.len || quantised.sorts_before(&self.record(index + 1));
            self.sorted_by_time = before_ok && after_ok;
        }

        let offset = index * R::STRIDE;
        self.buf[offset..offset + R::STRIDE].copy_from_slice(scratch);
        Ok(())
    }

    /// Append another collection's records after this one's, reusing
    /// the packed bytes directly. The sort policy is not consulted;
    /// the sorted flag survives only when both halves are sorted and
    /// the seam is in order.
    pub fn merge_mut(&mut self, other: &Self) {
        if other.len == 0 {
            return;
        }
        if let (Some(last), Some(first)) = (self.last(), other.first()) {
            if !last.sorts_before(&first) {
                self.sorted_by_time = false;
            }
        }
        if !other.sorted_by_time {
            self.sorted_by_time = false;
        }
        self.grow_for(self.len + other.len);
        let offset = self.len * R::STRIDE;
        self.buf[offset..offset + other.len * R::STRIDE].copy_from_slice(other.raw_bytes());
        self.len += other.len;
    }

    /// Merged copy of two collections, leaving `self` untouched.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge_mut(other);
        merged
    }

    /// Remove records whose accuracy estimate is worse than
    /// `max_accuracy` meters, compacting the buffer in place. Records
    /// without an estimate are kept. Returns the number removed.
    pub fn prune_accuracy_mut(&mut self, max_accuracy: f64) -> usize {
        let mut kept = 0usize;
        for index in 0..self.len {
            let record = self.record(index);
            if record.accuracy().map_or(true, |a| a <= max_accuracy) {
                if kept != index {
                    let src = index * R::STRIDE;
                    self.buf.copy_within(src..src + R::STRIDE, kept * R::STRIDE);
                }
                kept += 1;
            }
        }
        let removed = self.len - kept;
        self.len = kept;
        removed
    }

    /// Latitude-dependent average position of all records, or `None`
    /// for an empty collection.
    pub fn center(&self) -> Option<(f64, f64)> {
        crate::geo::average_position(self.iter().map(|r| (r.latitude(), r.longitude())))
    }

    /// Copy of records `[start, end)` as a new collection of the same
    /// variant and policy.
    pub fn sublist(&self, start: usize, end: usize) -> Result<Self, GpsHistoryError> {
        if start > end || end > self.len {
            return Err(GpsHistoryError::IndexOutOfRange {
                index: start.max(end),
                len: self.len,
            });
        }
        Ok(Self {
            buf: self.buf[start * R::STRIDE..end * R::STRIDE].to_vec(),
            len: end - start,
            enforcement: self.enforcement,
            // A slice of a sorted collection stays sorted; otherwise
            // stay conservative rather than rescan.
            sorted_by_time: self.sorted_by_time,
            _variant: PhantomData,
        })
    }
}

impl<R: PackedPoint> LatLongE7Source for ColumnarCollection<R> {
    fn for_each_lat_long_e7<F: FnMut(usize, u32, u32)>(&self, mut f: F) {
        for index in 0..self.len {
            let (lat, long) = R::lat_long_e7(self.record_slice(index));
            f(index, lat, long);
        }
    }
}

impl<R: PackedPoint> PointStore<R> for ColumnarCollection<R> {
    const FAST: bool = true;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<R, GpsHistoryError> {
        ColumnarCollection::get(self, index)
    }

    fn sorted_by_time(&self) -> bool {
        self.sorted_by_time
    }

    fn sublist(&self, start: usize, end: usize) -> Result<Self, GpsHistoryError> {
        ColumnarCollection::sublist(self, start, end)
    }
}

impl<R: PackedPoint> FromIterator<R> for ColumnarCollection<R> {
    /// Collects under the default non-enforcing policy; appends cannot
    /// fail there.
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut collection = Self::new();
        for point in iter {
            let _ = collection.append(&point);
        }
        collection
    }
}
