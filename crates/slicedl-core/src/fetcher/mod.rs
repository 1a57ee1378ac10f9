//! Segment fetcher: one ranged GET per attempt, appended to the segment file.
//!
//! Requests `[start + progress, end]` and, once the response is confirmed as a
//! `206` starting at that offset, appends every received chunk to the
//! segment's temp file and stops once the range is complete or the per-attempt
//! time budget is spent. Afterwards `progress` is re-synced from the file
//! length and the byte count is checked.

mod length;

pub use length::{check_length, stop_reason, Stop, LENGTH_TOLERANCE};

use anyhow::{Context, Result};
use curl::easy::{Easy, WriteError};
use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::str;
use std::time::{Duration, Instant};

use crate::control::AbortHandle;
use crate::headers::curl_header_list;
use crate::probe::{parse_content_range_start, ResponseHeaders};
use crate::retry::{http_error, is_success_status, range_ignored_error, transport_error, FetchError};
use crate::segmenter::Segment;
use crate::storage;

/// Outcome of one attempt: success or a classified error.
pub type Outcome = Result<(), FetchError>;

/// Largest receive buffer we ask libcurl for.
const MAX_CURL_BUFFER: usize = 512 * 1024;

/// Shared per-job settings every attempt needs.
#[derive(Debug, Clone)]
pub struct FetchContext<'a> {
    /// Directory holding the per-segment files.
    pub temp_dir: &'a Path,
    /// Per-attempt wall-clock budget (also connect and low-speed timeout).
    pub timeout: Duration,
    /// Receive buffer size hint.
    pub chunk_size: usize,
    /// Status codes that abort the whole job.
    pub abort_statuses: &'a [u32],
    pub abort: &'a AbortHandle,
}

/// Callback state for a single transfer.
struct AttemptState {
    /// First byte requested by this attempt.
    from: u64,
    remaining: u64,
    timeout: Duration,
    started: Instant,
    /// Headers of the final response (redirect hops are discarded).
    response: RefCell<ResponseHeaders>,
    /// Set on the first body chunk: whether the response is a 206 starting at `from`.
    range_ok: Cell<Option<bool>>,
    received: Cell<u64>,
    overflow: Cell<u64>,
    stopped: Cell<Option<Stop>>,
    storage_error: RefCell<Option<io::Error>>,
}

impl AttemptState {
    fn new(from: u64, remaining: u64, timeout: Duration) -> Self {
        Self {
            from,
            remaining,
            timeout,
            started: Instant::now(),
            response: RefCell::new(ResponseHeaders::default()),
            range_ok: Cell::new(None),
            received: Cell::new(0),
            overflow: Cell::new(0),
            stopped: Cell::new(None),
            storage_error: RefCell::new(None),
        }
    }

    fn on_header(&self, data: &[u8]) -> bool {
        if let Ok(line) = str::from_utf8(data) {
            self.response.borrow_mut().push_line(line);
        }
        true
    }

    fn status(&self) -> Option<u32> {
        self.response.borrow().status
    }

    fn range_rejected(&self) -> bool {
        self.range_ok.get() == Some(false)
    }

    /// A body is only accepted from `206` with a `Content-Range` starting at `from`.
    fn check_range_response(&self) -> bool {
        let response = self.response.borrow();
        let start = response
            .content_range
            .as_deref()
            .and_then(parse_content_range_start);
        response.status == Some(206) && start == Some(self.from)
    }

    /// Appends at most the missing bytes; returning 0 makes curl stop the transfer.
    fn on_chunk(&self, file: &mut File, data: &[u8]) -> Result<usize, WriteError> {
        if !self.status().map_or(true, is_success_status) {
            // Error bodies never reach the segment file.
            return Ok(0);
        }
        let range_ok = match self.range_ok.get() {
            Some(ok) => ok,
            None => {
                let ok = self.check_range_response();
                self.range_ok.set(Some(ok));
                ok
            }
        };
        if !range_ok {
            return Ok(0);
        }
        let before = self.received.get();
        let take = (data.len() as u64).min(self.remaining.saturating_sub(before)) as usize;
        if let Err(e) = file.write_all(&data[..take]) {
            *self.storage_error.borrow_mut() = Some(e);
            return Ok(0);
        }
        self.received.set(before + take as u64);
        self.overflow
            .set(self.overflow.get() + (data.len() - take) as u64);
        match stop_reason(
            self.received.get(),
            self.remaining,
            self.started.elapsed(),
            self.timeout,
        ) {
            Some(stop) => {
                self.stopped.set(Some(stop));
                Ok(0)
            }
            None => Ok(data.len()),
        }
    }
}

/// Runs one attempt for `segment`.
///
/// The inner `Outcome` is the classified result. The outer error is a storage
/// failure (segment file cannot be opened or written), which is outside the
/// retry taxonomy and must abort the job.
pub fn fetch_segment(segment: &mut Segment, ctx: &FetchContext<'_>) -> Result<Outcome> {
    let ordinal = segment.ordinal;
    if ctx.abort.is_aborted() {
        return Ok(Err(FetchError::JobAborted { ordinal }));
    }
    if let Err(e) = segment.check_range() {
        return Ok(Err(e));
    }

    let path = storage::segment_path(ctx.temp_dir, ordinal);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open segment file {}", path.display()))?;

    let from = segment.next_offset();
    let mut easy = match configure(segment, ctx, from) {
        Ok(easy) => easy,
        Err(e) => return Ok(Err(transport_error(ordinal, &e))),
    };
    let state = AttemptState::new(from, segment.remaining(), ctx.timeout);
    let result = run_transfer(&mut easy, &state, &mut file);

    if let Some(e) = state.storage_error.take() {
        return Err(e).with_context(|| format!("write segment file {}", path.display()));
    }
    let on_disk = file
        .metadata()
        .with_context(|| format!("stat segment file {}", path.display()))?
        .len();
    segment.progress = on_disk;

    let code = state
        .status()
        .unwrap_or_else(|| easy.response_code().unwrap_or(0));
    if ctx.abort_statuses.contains(&code) {
        tracing::warn!(ordinal, status = code, "abort status received, stopping all segments");
        ctx.abort.abort_with_status(code);
    }
    if code != 0 && !is_success_status(code) {
        return Ok(Err(http_error(ordinal, code)));
    }
    if state.range_rejected() {
        let content_range = state.response.borrow().content_range.clone();
        tracing::warn!(
            ordinal,
            status = code,
            from,
            content_range = content_range.as_deref().unwrap_or("-"),
            "server ignored range request"
        );
        return Ok(Err(range_ignored_error(ordinal, code, from)));
    }

    match (result, state.stopped.get()) {
        (Ok(()), _) => {}
        (Err(e), Some(stop)) if e.is_write_error() => {
            if stop == Stop::Deadline {
                tracing::debug!(
                    ordinal,
                    received = state.received.get(),
                    remaining = state.remaining,
                    elapsed_ms = state.started.elapsed().as_millis() as u64,
                    "attempt time budget spent"
                );
            }
        }
        (Err(e), _) => {
            if on_disk < segment.range.len() {
                return Ok(Err(transport_error(ordinal, &e)));
            }
            tracing::debug!(ordinal, error = %e, "transfer error after range was complete");
        }
    }

    Ok(check_length(
        ordinal,
        segment.range.len(),
        on_disk,
        state.overflow.get(),
    ))
}

/// Builds the curl handle for one attempt.
fn configure(segment: &Segment, ctx: &FetchContext<'_>, from: u64) -> Result<Easy, curl::Error> {
    let mut easy = Easy::new();
    easy.url(&segment.source_url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(ctx.timeout)?;
    // A silent socket fails the attempt after one budget without data.
    easy.low_speed_limit(1)?;
    easy.low_speed_time(ctx.timeout)?;
    easy.buffer_size(ctx.chunk_size.clamp(1024, MAX_CURL_BUFFER))?;
    easy.range(&format!("{}-{}", from, segment.range.end))?;
    easy.http_headers(curl_header_list(&segment.request_headers)?)?;
    Ok(easy)
}

fn run_transfer(easy: &mut Easy, state: &AttemptState, file: &mut File) -> Result<(), curl::Error> {
    let mut transfer = easy.transfer();
    transfer.header_function(|data| state.on_header(data))?;
    transfer.write_function(|data| state.on_chunk(file, data))?;
    transfer.perform()
}
