//! Classify curl errors and HTTP status codes into transport causes.

use super::error::{FetchError, TransportCause};

/// True for 2xx status codes.
pub fn is_success_status(code: u32) -> bool {
    (200..300).contains(&code)
}

/// Classify a curl error for logs and reports.
pub fn classify_curl_error(e: &curl::Error) -> TransportCause {
    if e.is_operation_timedout() {
        return TransportCause::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return TransportCause::Connection;
    }
    TransportCause::Protocol
}

/// Wrap a curl error as a segment transport failure.
pub fn transport_error(ordinal: usize, e: &curl::Error) -> FetchError {
    FetchError::TransportFailure {
        ordinal,
        cause: classify_curl_error(e),
        detail: e.to_string(),
    }
}

/// Wrap a non-2xx status as a segment transport failure.
pub fn http_error(ordinal: usize, code: u32) -> FetchError {
    FetchError::TransportFailure {
        ordinal,
        cause: TransportCause::Http(code),
        detail: format!("server returned HTTP {}", code),
    }
}

/// A 2xx response that is not a `206` starting at the requested offset.
/// Retryable: nothing was written for the attempt.
pub fn range_ignored_error(ordinal: usize, code: u32, from: u64) -> FetchError {
    FetchError::TransportFailure {
        ordinal,
        cause: TransportCause::Protocol,
        detail: format!("HTTP {} does not answer range starting at byte {}", code, from),
    }
}
