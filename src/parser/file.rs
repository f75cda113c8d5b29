//! Whole-file parsing, optionally fanned out over worker threads.
//!
//! A file is split into byte ranges at safe record boundaries and each
//! range runs through its own [`PointParser`]. Workers share nothing;
//! outputs are concatenated in range order, and the stateful thinning
//! filter runs once over the join rather than inside the workers, so
//! the result equals a single-threaded parse of the same bytes.

use std::ops::Range;
use std::path::Path;

use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use tracing::debug;

use super::{ParserOptions, PointParser};
use crate::types::{GpsTime, ParsedPoint, PointLike};
use crate::GpsHistoryError;

/// Options for a file-level parse.
#[derive(Debug, Clone, Copy)]
pub struct FileParseOptions {
    pub parser: ParserOptions,
    /// Upper bound on the number of byte ranges; the effective count is
    /// additionally bounded by the CPU count and the free-RAM
    /// heuristic.
    pub max_nr_chunks: usize,
    /// Free memory available for parse buffers. When set, the chunk
    /// count is capped at `free_ram / (8 * avg_chunk_size)`.
    pub free_ram_bytes: Option<u64>,
    /// Render an indicatif progress bar over the byte ranges.
    pub show_progress: bool,
}

impl Default for FileParseOptions {
    fn default() -> Self {
        Self {
            parser: ParserOptions::default(),
            max_nr_chunks: rayon::current_num_threads(),
            free_ram_bytes: None,
            show_progress: false,
        }
    }
}

/// Parse one location-history file into points, in parallel when the
/// options allow it.
pub fn parse_file(path: &Path, options: &FileParseOptions) -> Result<Vec<ParsedPoint>, GpsHistoryError> {
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), size = bytes.len(), "read history file");
    Ok(parse_bytes(&bytes, options))
}

/// Parse several files, concatenating their points in argument order.
pub fn parse_files<P: AsRef<Path>>(
    paths: &[P],
    options: &FileParseOptions,
) -> Result<Vec<ParsedPoint>, GpsHistoryError> {
    let mut points = Vec::new();
    for path in paths {
        points.extend(parse_file(path.as_ref(), options)?);
    }
    Ok(points)
}

/// Locate and parse every `.json` file under `dir`, concatenating
/// points in path order.
pub fn parse_dir(dir: &Path, options: &FileParseOptions) -> Result<Vec<ParsedPoint>, GpsHistoryError> {
    let paths = crate::files::locate_history_files(dir);
    debug!(files = paths.len(), dir = %dir.display(), "located history files");
    parse_files(&paths, options)
}

/// Range-parallel parse of an in-memory document.
pub fn parse_bytes(bytes: &[u8], options: &FileParseOptions) -> Vec<ParsedPoint> {
    let nr_chunks = chunk_count(bytes.len(), options);
    let ranges = chunk_ranges(bytes, nr_chunks);
    debug!(chunks = ranges.len(), size = bytes.len(), "parsing byte ranges");

    if ranges.len() <= 1 {
        return PointParser::parse_slice(bytes, &options.parser);
    }

    // Thinning tracks the last emitted point across the whole stream,
    // which no worker can see in isolation. Workers parse unthinned;
    // the filter runs once over the ordered join below.
    let mut worker_options = options.parser;
    worker_options.min_seconds_between_datapoints = None;

    let parse_range =
        |range: &Range<usize>| PointParser::parse_slice(&bytes[range.clone()], &worker_options);
    let per_range: Vec<Vec<ParsedPoint>> = if options.show_progress {
        ranges
            .par_iter()
            .progress_with(ProgressBar::new(ranges.len() as u64))
            .map(parse_range)
            .collect()
    } else {
        ranges.par_iter().map(parse_range).collect()
    };

    // Deterministic join in range order.
    let joined: Vec<ParsedPoint> = per_range.into_iter().flatten().collect();
    match options.parser.min_seconds_between_datapoints {
        Some(min_seconds) => thin_min_seconds(joined, min_seconds),
        None => joined,
    }
}

// Sequential thinning over the joined stream, applying the same rule
// as the parser's emission path: a point survives when it is at least
// `min_seconds` after the last surviving point.
fn thin_min_seconds(points: Vec<ParsedPoint>, min_seconds: u32) -> Vec<ParsedPoint> {
    let mut out = Vec::with_capacity(points.len());
    let mut last: Option<GpsTime> = None;
    for point in points {
        if let Some(last_time) = last {
            if point.time().signed_diff(&last_time) < min_seconds as i64 {
                continue;
            }
        }
        last = Some(point.time());
        out.push(point);
    }
    out
}

// nr = min(max_nr_chunks, cpus, max(1, free_ram / (8 * avg_chunk_size)))
fn chunk_count(file_size: usize, options: &FileParseOptions) -> usize {
    let mut nr = options
        .max_nr_chunks
        .min(rayon::current_num_threads())
        .max(1);
    if let Some(free_ram) = options.free_ram_bytes {
        let avg_chunk_size = (file_size / nr).max(1) as u64;
        let ram_bound = (free_ram / (8 * avg_chunk_size)).max(1) as usize;
        nr = nr.min(ram_bound);
    }
    nr
}

// Split into roughly even ranges, each boundary moved forward to just
// past an unescaped `}` followed by `,` so that no point record is cut
// in half.
fn chunk_ranges(bytes: &[u8], nr_chunks: usize) -> Vec<Range<usize>> {
    if nr_chunks <= 1 || bytes.len() < 2 {
        return vec![0..bytes.len()];
    }
    let step = bytes.len() / nr_chunks;
    let mut ranges = Vec::with_capacity(nr_chunks);
    let mut start = 0;
    for i in 1..nr_chunks {
        let tentative = (i * step).max(start);
        let Some(split) = refine_split(bytes, tentative) else {
            break;
        };
        if split <= start {
            continue;
        }
        ranges.push(start..split);
        start = split;
    }
    ranges.push(start..bytes.len());
    ranges
}

fn refine_split(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'}' && (i == 0 || bytes[i - 1] != b'\\') {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b',' {
                return Some(j + 1);
            }
        }
        i += 1;
    }
    None
}
