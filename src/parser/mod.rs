//! Streaming byte-level parser for Google location-history JSON.
//!
//! The parser never materialises the document. It scans raw bytes for
//! the handful of keys it recognises, decodes their integer values with
//! a signed accumulator, and emits a point whenever one is complete.
//! Everything else, nested structures included, is passed over without
//! calling any decoder.
//!
//! Input arrives in chunks split at arbitrary byte positions, including
//! mid-key and mid-number; all carry-over state lives in a small
//! fixed-size scratch area, so feeding `[A ++ B]` and `[A, B]` produces
//! identical output.

mod file;

pub use file::{parse_bytes, parse_dir, parse_file, parse_files, FileParseOptions};

use std::collections::VecDeque;

use crate::types::{GpsMeasurement, GpsPoint, GpsTime, ParsedPoint};

/// Tuning knobs for a parse run. The defaults emit every recognised
/// point unchanged and discard out-of-range values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Thin the output: suppress a point closer than this many seconds
    /// to the previously emitted one.
    pub min_seconds_between_datapoints: Option<u32>,
    /// Drop points whose accuracy estimate is worse (larger) than this
    /// many meters.
    pub accuracy_threshold: Option<f64>,
    /// Clamp out-of-range times and coordinates to their domain edge
    /// instead of discarding the point.
    pub auto_clamp: bool,
}

const KEY_TIMESTAMP_MS: &[u8] = b"timestampMs";
const KEY_LATITUDE_E7: &[u8] = b"latitudeE7";
const KEY_LONGITUDE_E7: &[u8] = b"longitudeE7";
const KEY_ALTITUDE: &[u8] = b"altitude";
const KEY_ACCURACY: &[u8] = b"accuracy";

// Longest recognised key plus one byte; anything longer is unknown.
const KEY_BUF_LEN: usize = KEY_TIMESTAMP_MS.len() + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    TimestampMs,
    LatitudeE7,
    LongitudeE7,
    Altitude,
    Accuracy,
}

// Switch on the first byte, then one memcmp.
fn match_key(key: &[u8]) -> Option<Field> {
    match *key.first()? {
        b't' if key == KEY_TIMESTAMP_MS => Some(Field::TimestampMs),
        b'l' if key == KEY_LATITUDE_E7 => Some(Field::LatitudeE7),
        b'l' if key == KEY_LONGITUDE_E7 => Some(Field::LongitudeE7),
        b'a' if key == KEY_ALTITUDE => Some(Field::Altitude),
        b'a' if key == KEY_ACCURACY => Some(Field::Accuracy),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between keys: waiting for a `"` or a closing `}`.
    ScanKey,
    /// Inside a key string, accumulating into the match buffer.
    InKey,
    /// After a key string, seeking its `:`.
    AfterKey,
    /// After the `:`, classifying the value's first byte.
    ScanValue,
    InNumber,
    InQuotedNumber,
    /// Discarding a string value up to its closing quote.
    SkipString,
    /// Discarding a scalar value up to the next `,`, `}` or `]`.
    SkipScalar,
}

// Signed integer accumulator, saturating so that absurdly long digit
// runs degrade into an out-of-range value instead of wrapping.
#[derive(Debug, Clone, Copy, Default)]
struct NumberAccumulator {
    negative: bool,
    magnitude: i64,
    any_digit: bool,
}

impl NumberAccumulator {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn push_digit(&mut self, byte: u8) {
        self.magnitude = self
            .magnitude
            .saturating_mul(10)
            .saturating_add((byte - b'0') as i64);
        self.any_digit = true;
    }

    fn value(&self) -> Option<i64> {
        self.any_digit.then(|| {
            if self.negative {
                -self.magnitude
            } else {
                self.magnitude
            }
        })
    }
}

// Per-point field slots, reset after every emission or discard.
#[derive(Debug, Clone, Copy, Default)]
struct Scratch {
    time_ms: Option<i64>,
    latitude_e7: Option<i64>,
    longitude_e7: Option<i64>,
    altitude: Option<i64>,
    accuracy: Option<i64>,
}

impl Scratch {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn set(&mut self, field: Field, value: i64) {
        match field {
            Field::TimestampMs => self.time_ms = Some(value),
            Field::LatitudeE7 => self.latitude_e7 = Some(value),
            Field::LongitudeE7 => self.longitude_e7 = Some(value),
            Field::Altitude => self.altitude = Some(value),
            Field::Accuracy => self.accuracy = Some(value),
        }
    }

    /// All three required fields are present.
    fn complete(&self) -> bool {
        self.time_ms.is_some() && self.latitude_e7.is_some() && self.longitude_e7.is_some()
    }

    fn is_empty(&self) -> bool {
        self.time_ms.is_none()
            && self.latitude_e7.is_none()
            && self.longitude_e7.is_none()
            && self.altitude.is_none()
            && self.accuracy.is_none()
    }
}

/// Incremental parser: [`PointParser::feed`] it byte chunks, collect
/// emitted points, and [`PointParser::finish`] at end of input.
#[derive(Debug, Clone, Default)]
pub struct PointParser {
    options: ParserOptions,
    state: State,
    key_buf: [u8; KEY_BUF_LEN],
    key_len: usize,
    key_overflow: bool,
    field: Option<Field>,
    number: NumberAccumulator,
    escaped: bool,
    scratch: Scratch,
    last_emitted: Option<GpsTime>,
}

impl Default for State {
    fn default() -> Self {
        State::ScanKey
    }
}

impl PointParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Consume one chunk, pushing any points it completes onto `out`.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<ParsedPoint>) {
        let mut i = 0;
        while i < chunk.len() {
            if self.step(chunk[i], out) {
                i += 1;
            }
        }
    }

    /// End of input: a dangling number is finalised, a complete point
    /// is flushed, a partial one is discarded. The parser is ready for
    /// a fresh document afterwards.
    pub fn finish(&mut self, out: &mut Vec<ParsedPoint>) {
        if self.state == State::InNumber {
            self.finalize_number();
        }
        if self.scratch.complete() {
            self.emit(out);
        }
        self.scratch.reset();
        self.field = None;
        self.state = State::ScanKey;
    }

    /// One-shot parse of a complete byte slice.
    pub fn parse_slice(bytes: &[u8], options: &ParserOptions) -> Vec<ParsedPoint> {
        let mut parser = Self::new(*options);
        let mut out = Vec::new();
        parser.feed(bytes, &mut out);
        parser.finish(&mut out);
        out
    }

    /// Lazy point stream over a chunk iterator.
    pub fn stream<I>(chunks: I, options: ParserOptions) -> PointStream<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        PointStream {
            parser: Self::new(options),
            chunks: chunks.into_iter(),
            queue: VecDeque::new(),
            buffer: Vec::new(),
            finished: false,
        }
    }

    // Process one byte; false means the byte must be re-examined in
    // the new state. At most one re-examination happens per byte.
    fn step(&mut self, byte: u8, out: &mut Vec<ParsedPoint>) -> bool {
        match self.state {
            State::ScanKey => {
                match byte {
                    b'"' => {
                        self.key_len = 0;
                        self.key_overflow = false;
                        self.escaped = false;
                        self.state = State::InKey;
                    }
                    b'}' => {
                        // An unescaped closing brace ends the point if
                        // it is complete; partial state survives until
                        // the next timestamp key resets it.
                        if self.scratch.complete() {
                            self.emit(out);
                        }
                    }
                    _ => {}
                }
                true
            }
            State::InKey => {
                if self.escaped {
                    // Escaped byte: no recognised key contains one.
                    self.escaped = false;
                    self.key_overflow = true;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.end_key(out);
                } else if self.key_len < KEY_BUF_LEN {
                    self.key_buf[self.key_len] = byte;
                    self.key_len += 1;
                } else {
                    self.key_overflow = true;
                }
                true
            }
            State::AfterKey => match byte {
                b':' => {
                    self.state = State::ScanValue;
                    true
                }
                b' ' | b'\t' | b'\r' | b'\n' => true,
                _ => {
                    // Not a key after all (e.g. a string in an array).
                    self.field = None;
                    self.state = State::ScanKey;
                    false
                }
            },
            State::ScanValue => match byte {
                b' ' | b'\t' | b'\r' | b'\n' => true,
                b'-' => {
                    self.number.reset();
                    self.number.negative = true;
                    self.state = State::InNumber;
                    true
                }
                b'0'..=b'9' => {
                    self.number.reset();
                    self.number.push_digit(byte);
                    self.state = State::InNumber;
                    true
                }
                b'"' => {
                    self.number.reset();
                    self.escaped = false;
                    self.state = State::InQuotedNumber;
                    true
                }
                b'{' | b'[' => {
                    // Structural value: descend and keep scanning for
                    // keys inside it. The emission rules make nested
                    // timestamp keys harmless.
                    self.field = None;
                    self.state = State::ScanKey;
                    true
                }
                b',' => {
                    self.field = None;
                    self.state = State::ScanKey;
                    true
                }
                b'}' | b']' => {
                    self.field = None;
                    self.state = State::ScanKey;
                    false
                }
                _ => {
                    // true/false/null or garbage.
                    self.field = None;
                    self.state = State::SkipScalar;
                    true
                }
            },
            State::InNumber => match byte {
                b'0'..=b'9' => {
                    self.number.push_digit(byte);
                    true
                }
                _ => {
                    self.finalize_number();
                    false
                }
            },
            State::InQuotedNumber => match byte {
                b'0'..=b'9' => {
                    self.number.push_digit(byte);
                    true
                }
                b'-' if !self.number.any_digit && !self.number.negative => {
                    self.number.negative = true;
                    true
                }
                b'"' => {
                    self.finalize_number();
                    true
                }
                b'\\' => {
                    // Not a number: skip the rest of the string.
                    self.field = None;
                    self.escaped = true;
                    self.state = State::SkipString;
                    true
                }
                _ => {
                    self.field = None;
                    self.state = State::SkipString;
                    true
                }
            },
            State::SkipString => {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.state = State::ScanKey;
                }
                true
            }
            State::SkipScalar => match byte {
                b',' | b'}' | b']' => {
                    self.state = State::ScanKey;
                    false
                }
                _ => true,
            },
        }
    }

    fn end_key(&mut self, out: &mut Vec<ParsedPoint>) {
        let field = if self.key_overflow {
            None
        } else {
            match_key(&self.key_buf[..self.key_len])
        };
        if field == Some(Field::TimestampMs) {
            // A fresh timestamp key closes out the previous point: a
            // complete one is emitted, a partial one is discarded.
            if self.scratch.complete() {
                self.emit(out);
            } else if !self.scratch.is_empty() {
                self.scratch.reset();
            }
        }
        self.field = field;
        self.state = State::AfterKey;
    }

    fn finalize_number(&mut self) {
        if let (Some(field), Some(value)) = (self.field, self.number.value()) {
            self.scratch.set(field, value);
        }
        self.field = None;
        self.number.reset();
        self.state = State::ScanKey;
    }

    fn emit(&mut self, out: &mut Vec<ParsedPoint>) {
        let scratch = self.scratch;
        self.scratch.reset();
        let Some(point) = self.build_point(&scratch) else {
            return;
        };

        use crate::types::PointLike;
        if let Some(min_seconds) = self.options.min_seconds_between_datapoints {
            if let Some(last) = self.last_emitted {
                if point.time().signed_diff(&last) < min_seconds as i64 {
                    return;
                }
            }
        }
        if let Some(threshold) = self.options.accuracy_threshold {
            if point.accuracy().is_some_and(|a| a > threshold) {
                return;
            }
        }

        self.last_emitted = Some(point.time());
        out.push(point);
    }

    // Assemble the point, applying the clamp-or-discard policy to
    // out-of-range times and coordinates.
    fn build_point(&self, scratch: &Scratch) -> Option<ParsedPoint> {
        let seconds = scratch.time_ms?.div_euclid(1000);
        let time = match GpsTime::new(seconds) {
            Ok(t) => t,
            Err(_) if self.options.auto_clamp => GpsTime::clamped(seconds),
            Err(_) => return None,
        };
        let latitude = self.coordinate(scratch.latitude_e7?, 90.0)?;
        let longitude = self.coordinate(scratch.longitude_e7?, 180.0)?;
        let altitude = scratch.altitude.map(|meters| meters as f64);

        Some(match scratch.accuracy {
            Some(accuracy) => ParsedPoint::Measurement(GpsMeasurement {
                time,
                latitude,
                longitude,
                altitude,
                accuracy: Some(accuracy.max(0) as f64),
                heading: None,
                speed: None,
                speed_accuracy: None,
            }),
            None => ParsedPoint::Point(GpsPoint {
                time,
                latitude,
                longitude,
                altitude,
            }),
        })
    }

    fn coordinate(&self, e7: i64, limit: f64) -> Option<f64> {
        let degrees = e7 as f64 * 1e-7;
        if degrees.abs() <= limit {
            Some(degrees)
        } else if self.options.auto_clamp {
            Some(degrees.clamp(-limit, limit))
        } else {
            None
        }
    }
}

/// Pull-based stream: drives a [`PointParser`] over a chunk iterator
/// and yields points as they complete.
#[derive(Debug)]
pub struct PointStream<I> {
    parser: PointParser,
    chunks: I,
    queue: VecDeque<ParsedPoint>,
    buffer: Vec<ParsedPoint>,
    finished: bool,
}

impl<I> Iterator for PointStream<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = ParsedPoint;

    fn next(&mut self) -> Option<ParsedPoint> {
        loop {
            if let Some(point) = self.queue.pop_front() {
                return Some(point);
            }
            if self.finished {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => self.parser.feed(chunk.as_ref(), &mut self.buffer),
                None => {
                    self.finished = true;
                    self.parser.finish(&mut self.buffer);
                }
            }
            self.queue.extend(self.buffer.drain(..));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointLike;

    const TWO_POINTS: &[u8] = br#""timestampMs" : 0, "latitudeE7" : 1, "longitudeE7" : 2,
"timestampMs" : 86400000, "latitudeE7" : 5, "longitudeE7" : 6"#;

    fn parse(bytes: &[u8]) -> Vec<ParsedPoint> {
        PointParser::parse_slice(bytes, &ParserOptions::default())
    }

    fn parse_chunked(chunks: &[&[u8]], options: &ParserOptions) -> Vec<ParsedPoint> {
        let mut parser = PointParser::new(*options);
        let mut out = Vec::new();
        for chunk in chunks {
            parser.feed(chunk, &mut out);
        }
        parser.finish(&mut out);
        out
    }

    #[test]
    fn two_well_separated_points() {
        let points = parse(TWO_POINTS);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time().as_secs(), 0);
        assert!((points[0].latitude() - 1e-7).abs() < 1e-12);
        assert!((points[0].longitude() - 2e-7).abs() < 1e-12);
        assert_eq!(points[1].time().as_secs(), 86_400);
        assert!((points[1].latitude() - 5e-7).abs() < 1e-12);
        assert!((points[1].longitude() - 6e-7).abs() < 1e-12);
    }

    #[test]
    fn every_two_chunk_split_parses_identically() {
        let whole = parse(TWO_POINTS);
        for split in 0..=TWO_POINTS.len() {
            let (a, b) = TWO_POINTS.split_at(split);
            let chunked = parse_chunked(&[a, b], &ParserOptions::default());
            assert_eq!(chunked, whole, "split at byte {split}");
        }
    }

    #[test]
    fn random_multi_way_splits_parse_identically() {
        let doc = br#"{"locations" : [ {
            "timestampMs" : "1507330772000",
            "latitudeE7" : 419224183,
            "longitudeE7" : -855936902,
            "accuracy" : 16,
            "altitude" : 243
        }, {
            "timestampMs" : "1507330832000",
            "latitudeE7" : 419224710,
            "longitudeE7" : -855937322,
            "accuracy" : 10
        } ]}"#;
        let whole = parse(doc);
        assert_eq!(whole.len(), 2);

        // Deterministic pseudo-random split points.
        let mut seed: u64 = 0x5DEECE66D;
        for _ in 0..200 {
            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut rest: &[u8] = doc;
            while !rest.is_empty() {
                seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let cut = (seed >> 33) as usize % rest.len() + 1;
                let (head, tail) = rest.split_at(cut);
                chunks.push(head);
                rest = tail;
            }
            assert_eq!(parse_chunked(&chunks, &ParserOptions::default()), whole);
        }
    }

    #[test]
    fn partial_point_is_discarded_on_new_timestamp() {
        let doc = br#""timestampMs" : 99999, "latitudeE7" : 1,
"timestampMs" : 86400000, "latitudeE7" : 5, "longitudeE7" : 6, "altitude" : 8"#;
        let points = parse(doc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time().as_secs(), 86_400);
        assert!((points[0].latitude() - 5e-7).abs() < 1e-12);
        assert_eq!(points[0].altitude(), Some(8.0));
    }

    #[test]
    fn accuracy_promotes_to_measurement() {
        let doc = br#"{"timestampMs" : 1000, "latitudeE7" : 1, "longitudeE7" : 2, "accuracy" : 12}"#;
        let points = parse(doc);
        assert_eq!(points.len(), 1);
        match &points[0] {
            ParsedPoint::Measurement(m) => assert_eq!(m.accuracy, Some(12.0)),
            other => panic!("expected a measurement, got {other:?}"),
        }
        // Without accuracy the variant stays a plain point.
        let doc = br#"{"timestampMs" : 1000, "latitudeE7" : 1, "longitudeE7" : 2}"#;
        assert!(matches!(parse(doc)[0], ParsedPoint::Point(_)));
    }

    #[test]
    fn quoted_numbers_are_tolerated() {
        let doc = br#"{"timestampMs" : "86400000", "latitudeE7" : "-5", "longitudeE7" : "6"}"#;
        let points = parse(doc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time().as_secs(), 86_400);
        assert!((points[0].latitude() + 5e-7).abs() < 1e-12);
    }

    #[test]
    fn nested_activity_does_not_corrupt_points() {
        // The inner timestampMs triggers the early emission of the
        // complete point; the leftover partial state is discarded when
        // the next location's timestamp arrives.
        let doc = br#"{"locations" : [ {
            "timestampMs" : "1000",
            "latitudeE7" : 10,
            "longitudeE7" : 20,
            "activity" : [ {
                "timestampMs" : "1200",
                "activity" : [ { "type" : "STILL", "confidence" : 100 } ]
            } ]
        }, {
            "timestampMs" : "2000",
            "latitudeE7" : 30,
            "longitudeE7" : 40
        } ]}"#;
        let points = parse(doc);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time().as_secs(), 1);
        assert!((points[0].latitude() - 10e-7).abs() < 1e-12);
        assert_eq!(points[1].time().as_secs(), 2);
        assert!((points[1].latitude() - 30e-7).abs() < 1e-12);
    }

    #[test]
    fn unknown_keys_and_garbage_are_skipped() {
        let doc = br#"{"verticalAccuracy" : 3, "source" : "WIFI\" }", "heading" : 12.5,
            "timestampMs" : 1000, "latitudeE7" : 10, "longitudeE7" : 20, "velocity" : null}"#;
        let points = parse(doc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time().as_secs(), 1);
    }

    #[test]
    fn malformed_bytes_never_panic() {
        let doc = b"\xFF\xFE{\"timestampMs\" \xC3( : 1000}garbage";
        // Whatever the bytes, parsing degrades to skipping.
        let points = parse(doc);
        assert!(points.len() <= 1);
    }

    #[test]
    fn min_seconds_between_datapoints_thins_output() {
        let doc = br#""timestampMs" : 0, "latitudeE7" : 1, "longitudeE7" : 2,
"timestampMs" : 30000, "latitudeE7" : 3, "longitudeE7" : 4,
"timestampMs" : 70000, "latitudeE7" : 5, "longitudeE7" : 6"#;
        let options = ParserOptions {
            min_seconds_between_datapoints: Some(60),
            ..Default::default()
        };
        let points = PointParser::parse_slice(doc, &options);
        // The 30 s point is suppressed; 70 s clears the threshold
        // against the point emitted at 0 s.
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time().as_secs(), 0);
        assert_eq!(points[1].time().as_secs(), 70);
    }

    #[test]
    fn accuracy_threshold_drops_bad_points() {
        let doc = br#"{"timestampMs" : 0, "latitudeE7" : 1, "longitudeE7" : 2, "accuracy" : 150},
{"timestampMs" : 60000, "latitudeE7" : 3, "longitudeE7" : 4, "accuracy" : 10}"#;
        let options = ParserOptions {
            accuracy_threshold: Some(100.0),
            ..Default::default()
        };
        let points = PointParser::parse_slice(doc, &options);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time().as_secs(), 60);
    }

    #[test]
    fn out_of_range_values_clamp_or_discard() {
        let doc = br#"{"timestampMs" : -5000, "latitudeE7" : 1, "longitudeE7" : 2}"#;
        assert!(parse(doc).is_empty());
        let clamped = PointParser::parse_slice(
            doc,
            &ParserOptions {
                auto_clamp: true,
                ..Default::default()
            },
        );
        assert_eq!(clamped.len(), 1);
        assert_eq!(clamped[0].time().as_secs(), 0);

        let doc = br#"{"timestampMs" : 0, "latitudeE7" : 950000000, "longitudeE7" : 2}"#;
        assert!(parse(doc).is_empty());
        let clamped = PointParser::parse_slice(
            doc,
            &ParserOptions {
                auto_clamp: true,
                ..Default::default()
            },
        );
        assert_eq!(clamped.len(), 1);
        assert_eq!(clamped[0].latitude(), 90.0);
    }

    #[test]
    fn incomplete_point_is_dropped_at_end_of_input() {
        let doc = br#"{"timestampMs" : 1000, "latitudeE7" : 10"#;
        assert!(parse(doc).is_empty());
    }

    #[test]
    fn point_stream_yields_lazily() {
        let chunks: Vec<&[u8]> = vec![
            br#""timestampMs" : 0, "lat"#,
            br#"itudeE7" : 1, "longitudeE7" : 2,"#,
            br#" "timestampMs" : 86400000, "latitudeE7" : 5, "longitudeE7" : 6"#,
        ];
        let points: Vec<_> =
            PointParser::stream(chunks, ParserOptions::default()).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].time().as_secs(), 86_400);
    }

    #[test]
    fn parser_state_is_reusable_after_finish() {
        let mut parser = PointParser::new(ParserOptions::default());
        let mut out = Vec::new();
        parser.feed(br#"{"timestampMs" : 1000, "latitudeE7" : 1"#, &mut out);
        parser.finish(&mut out);
        assert!(out.is_empty());
        parser.feed(
            br#"{"timestampMs" : 2000, "latitudeE7" : 1, "longitudeE7" : 2}"#,
            &mut out,
        );
        parser.finish(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time().as_secs(), 2);
    }
}
