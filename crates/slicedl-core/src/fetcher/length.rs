//! Stop decision inside the byte loop and the post-attempt length check.

use crate::retry::FetchError;
use std::time::Duration;

/// Bytes a server may send past the requested range before the attempt is
/// treated as a server ignoring `Range`.
pub const LENGTH_TOLERANCE: u64 = 100;

/// Why the byte loop stopped before the server finished sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// All missing bytes were received.
    Complete,
    /// The per-attempt time budget ran out first.
    Deadline,
}

/// Checked after every chunk. Completion wins over the deadline when both hold.
pub fn stop_reason(received: u64, remaining: u64, elapsed: Duration, budget: Duration) -> Option<Stop> {
    if received >= remaining {
        Some(Stop::Complete)
    } else if elapsed > budget {
        Some(Stop::Deadline)
    } else {
        None
    }
}

/// Compares the segment file length against the range length. Missing bytes
/// or an overshoot beyond `LENGTH_TOLERANCE` are a `ContentLengthMismatch`.
pub fn check_length(ordinal: usize, expected: u64, on_disk: u64, overflow: u64) -> Result<(), FetchError> {
    if on_disk != expected || overflow > LENGTH_TOLERANCE {
        return Err(FetchError::ContentLengthMismatch {
            ordinal,
            expected,
            actual: on_disk + overflow,
        });
    }
    Ok(())
}
