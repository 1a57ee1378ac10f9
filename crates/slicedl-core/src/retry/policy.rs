use super::error::{ErrorKind, FetchError};

/// Default number of fetch attempts per segment.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// What the coordinator does with a segment after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Bytes are complete; mark the segment confirmed.
    Confirm,
    /// Leave unconfirmed; the next batch dispatches it again.
    Retry,
    /// Stop the whole job for the given reason.
    Abort(ErrorKind),
    /// Job was already aborted; nothing happened and nothing is counted.
    Skip,
}

/// Retry limit for segment attempts.
///
/// Pure: `decide` looks only at the outcome and the attempt count, so the
/// decision table is testable without network I/O.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per segment (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Decide the next action for a segment. `attempts` is the segment's
    /// attempt count after this outcome was produced.
    pub fn decide(&self, outcome: &Result<(), FetchError>, attempts: u32) -> Decision {
        let err = match outcome {
            Ok(()) => return Decision::Confirm,
            Err(e) => e,
        };
        match err.kind() {
            ErrorKind::JobAborted => Decision::Skip,
            kind if kind.is_retryable() => {
                if attempts >= self.max_attempts {
                    Decision::Abort(ErrorKind::RetryLimitExceeded)
                } else {
                    Decision::Retry
                }
            }
            kind => Decision::Abort(kind),
        }
    }
}
