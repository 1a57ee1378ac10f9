//! Range probe: discover total size and resolved URL.
//!
//! Issues `GET` with `Range: bytes=0-` and reads only the response headers.
//! The total comes from `Content-Range`, so a server that ignores ranges
//! fails the probe. The body transfer is cut off at the first chunk.

mod parse;

pub(crate) use parse::{parse_content_range_start, ResponseHeaders};

use crate::headers::curl_header_list;
use crate::retry::{is_success_status, FetchError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::str;
use std::time::Duration;

/// What the probe learned about the resource.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Total resource size in bytes.
    pub total_size: u64,
    /// URL after redirects; segments are fetched from here.
    pub effective_url: String,
    /// Final response status (206 for range-capable servers).
    pub status: u32,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

/// Probes `url` with already-normalized `headers`.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(
    url: &str,
    headers: &HashMap<String, String>,
    timeout: Duration,
) -> Result<ProbeResult, FetchError> {
    let unavailable = |status: Option<u32>, reason: String| FetchError::ProbeSizeUnavailable {
        url: url.to_string(),
        status,
        reason,
    };
    let curl_failed = |e: curl::Error| unavailable(None, e.to_string());

    let response = RefCell::new(ResponseHeaders::default());
    let body_started = std::cell::Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(curl_failed)?;
    easy.follow_location(true).map_err(curl_failed)?;
    easy.max_redirections(10).map_err(curl_failed)?;
    easy.connect_timeout(timeout).map_err(curl_failed)?;
    easy.timeout(timeout).map_err(curl_failed)?;
    easy.range("0-").map_err(curl_failed)?;
    easy.http_headers(curl_header_list(headers).map_err(curl_failed)?)
        .map_err(curl_failed)?;

    let perform = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    response.borrow_mut().push_line(s);
                }
                true
            })
            .map_err(curl_failed)?;
        transfer
            .write_function(|_| {
                // Headers are all we need.
                body_started.set(true);
                Ok(0)
            })
            .map_err(curl_failed)?;
        transfer.perform()
    };
    if let Err(e) = perform {
        if !(e.is_write_error() && body_started.get()) {
            return Err(curl_failed(e));
        }
    }

    let response = response.into_inner();
    let status = match response.status {
        Some(code) => code,
        None => easy.response_code().map_err(curl_failed)?,
    };
    if !is_success_status(status) {
        return Err(unavailable(
            Some(status),
            format!("server returned HTTP {}", status),
        ));
    }
    let total_size = response
        .content_range
        .as_deref()
        .and_then(parse::parse_content_range_total)
        .ok_or_else(|| {
            unavailable(
                Some(status),
                "no definite total in Content-Range (ranges unsupported?)".to_string(),
            )
        })?;

    let effective_url = easy
        .effective_url()
        .ok()
        .flatten()
        .unwrap_or(url)
        .to_string();

    tracing::debug!(
        url = %url,
        effective_url = %effective_url,
        total_size,
        status,
        "probe complete"
    );

    Ok(ProbeResult {
        total_size,
        effective_url,
        status,
        accept_ranges: response.accept_ranges,
    })
}
