//! Fetch error taxonomy. Identity is the variant, never a message string.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a transport-class attempt failed (used for logs and reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCause {
    /// Connect or low-speed timeout inside libcurl.
    Timeout,
    /// Network-level failure (connection refused/reset, DNS, short body).
    Connection,
    /// Response had a non-2xx status.
    Http(u32),
    /// Anything else libcurl reported.
    Protocol,
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCause::Timeout => write!(f, "timeout"),
            TransportCause::Connection => write!(f, "connection"),
            TransportCause::Http(code) => write!(f, "HTTP {}", code),
            TransportCause::Protocol => write!(f, "protocol"),
        }
    }
}

/// Outcome error of a probe or a single segment attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Resource does not support ranged retrieval or its size is unknown.
    #[error("probe of {url} failed: {reason}")]
    ProbeSizeUnavailable {
        url: String,
        status: Option<u32>,
        reason: String,
    },
    /// Transport or protocol failure during a segment fetch. Retryable.
    #[error("segment {ordinal}: transport failure ({cause}): {detail}")]
    TransportFailure {
        ordinal: usize,
        cause: TransportCause,
        detail: String,
    },
    /// Bytes on disk deviate from the segment range. Retryable.
    #[error("segment {ordinal}: expected {expected} bytes, got {actual}")]
    ContentLengthMismatch {
        ordinal: usize,
        expected: u64,
        actual: u64,
    },
    /// `start + progress` ran past `end`. Never retried.
    #[error("segment {ordinal}: invalid range {from}-{end}")]
    RangeInvariantViolation { ordinal: usize, from: u64, end: u64 },
    /// Segment used up its attempts; aborts the whole job.
    #[error("segment {ordinal}: reached download limit of {max_attempts} attempts")]
    RetryLimitExceeded { ordinal: usize, max_attempts: u32 },
    /// Dispatched after the job abort flag was set.
    #[error("segment {ordinal}: job already aborted")]
    JobAborted { ordinal: usize },
}

/// Kind of a `FetchError`, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProbeSizeUnavailable,
    TransportFailure,
    ContentLengthMismatch,
    RangeInvariantViolation,
    RetryLimitExceeded,
    JobAborted,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::ProbeSizeUnavailable { .. } => ErrorKind::ProbeSizeUnavailable,
            FetchError::TransportFailure { .. } => ErrorKind::TransportFailure,
            FetchError::ContentLengthMismatch { .. } => ErrorKind::ContentLengthMismatch,
            FetchError::RangeInvariantViolation { .. } => ErrorKind::RangeInvariantViolation,
            FetchError::RetryLimitExceeded { .. } => ErrorKind::RetryLimitExceeded,
            FetchError::JobAborted { .. } => ErrorKind::JobAborted,
        }
    }
}

impl FetchError {
    /// HTTP status behind the error, when there was one.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            FetchError::ProbeSizeUnavailable { status, .. } => *status,
            FetchError::TransportFailure {
                cause: TransportCause::Http(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}

impl ErrorKind {
    /// Transport-class kinds go through the retry path.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransportFailure | ErrorKind::ContentLengthMismatch)
    }
}
