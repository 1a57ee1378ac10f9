//! Segment type and range planning.

use crate::retry::FetchError;
use crate::storage::MAX_SEGMENT_FILES;
use std::collections::HashMap;

/// Upper bound for a single segment, regardless of concurrency.
pub const MAX_SEGMENT_SIZE: u64 = 50 * 1024 * 1024;

/// An inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Download state for one byte range of the resource.
///
/// `range` never changes after planning. `progress` counts bytes already
/// appended to the segment file and is only ever set from that file's length.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Resolved URL (after redirects) of the resource.
    pub source_url: String,
    pub range: ByteRange,
    pub progress: u64,
    /// Headers for this segment's requests; `Range` is set per attempt.
    pub request_headers: HashMap<String, String>,
    /// Zero-based position: file name and merge order.
    pub ordinal: usize,
    pub attempt_count: u32,
    pub confirmed: bool,
}

impl Segment {
    /// First byte the next attempt should request.
    pub fn next_offset(&self) -> u64 {
        self.range.start + self.progress
    }

    /// Bytes still missing from the segment file.
    pub fn remaining(&self) -> u64 {
        self.range.len().saturating_sub(self.progress)
    }

    /// Fails when `start + progress > end`, i.e. there is nothing valid left to request.
    pub fn check_range(&self) -> Result<(), FetchError> {
        let from = self.next_offset();
        if from > self.range.end {
            return Err(FetchError::RangeInvariantViolation {
                ordinal: self.ordinal,
                from,
                end: self.range.end,
            });
        }
        Ok(())
    }
}

/// Segment size for a resource: `min(50 MiB, ceil(total / concurrency))`.
/// Concurrency below 1 is treated as 1.
pub fn segment_size(total_size: u64, concurrency: usize) -> u64 {
    let n = concurrency.max(1) as u64;
    MAX_SEGMENT_SIZE.min(total_size.div_ceil(n)).max(1)
}

/// Number of segments `plan_ranges` produces for this size and concurrency.
pub fn segment_count(total_size: u64, concurrency: usize) -> u64 {
    if total_size == 0 {
        return 0;
    }
    total_size.div_ceil(segment_size(total_size, concurrency))
}

/// Consecutive inclusive ranges partitioning `[0, total_size)`; the last one is
/// clipped to `total_size - 1`. Empty when `total_size` is 0.
///
/// Produces `segment_count` ranges; `plan_segments` bounds that count first.
pub fn plan_ranges(total_size: u64, concurrency: usize) -> Vec<ByteRange> {
    if total_size == 0 {
        return Vec::new();
    }
    let size = segment_size(total_size, concurrency);
    let mut out = Vec::new();
    let mut start = 0u64;
    while start < total_size {
        let end = start.saturating_add(size).min(total_size) - 1;
        out.push(ByteRange { start, end });
        start = end + 1;
    }
    out
}

/// Builds fresh segments (no progress, no attempts) for the planned ranges.
/// Each segment gets its own copy of `headers`.
///
/// Fails with `ProbeSizeUnavailable` when the resource would need more than
/// `MAX_SEGMENT_FILES` segments.
pub fn plan_segments(
    total_size: u64,
    concurrency: usize,
    source_url: &str,
    headers: &HashMap<String, String>,
) -> Result<Vec<Segment>, FetchError> {
    let count = segment_count(total_size, concurrency);
    if count > MAX_SEGMENT_FILES {
        return Err(FetchError::ProbeSizeUnavailable {
            url: source_url.to_string(),
            status: None,
            reason: format!(
                "{} bytes need {} segments, more than the limit of {}",
                total_size, count, MAX_SEGMENT_FILES
            ),
        });
    }
    Ok(plan_ranges(total_size, concurrency)
        .into_iter()
        .enumerate()
        .map(|(ordinal, range)| Segment {
            source_url: source_url.to_string(),
            range,
            progress: 0,
            request_headers: headers.clone(),
            ordinal,
            attempt_count: 0,
            confirmed: false,
        })
        .collect())
}
