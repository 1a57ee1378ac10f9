//! Retry/abort policy.
//!
//! This module holds the fetch error taxonomy, classification of curl
//! failures, and the pure decision function that turns one attempt's outcome
//! into confirm, retry, or abort.

mod classify;
mod error;
mod policy;

pub use classify::{
    classify_curl_error, http_error, is_success_status, range_ignored_error, transport_error,
};
pub use error::{ErrorKind, FetchError, TransportCause};
pub use policy::{Decision, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
