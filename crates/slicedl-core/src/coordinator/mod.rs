//! Worker pool coordinator.
//!
//! Runs batches: every unconfirmed segment is handed to a bounded pool of OS
//! threads for one fetch-and-evaluate cycle, and the next batch starts only
//! after the whole batch finished. The loop ends when all segments are
//! confirmed or the job abort flag is set.

mod attempt;

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};

use crate::fetcher::FetchContext;
use crate::retry::{Decision, ErrorKind, RetryPolicy};
use crate::segmenter::Segment;

use self::attempt::run_attempt;

/// How the running phase ended.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of batches dispatched.
    pub batches: u32,
    /// First reason the job aborted, if it did.
    pub failure: Option<ErrorKind>,
}

/// True when every segment is confirmed.
pub fn all_confirmed(segments: &[Segment]) -> bool {
    segments.iter().all(|s| s.confirmed)
}

/// Dispatches unconfirmed segments in batches of at most `workers` concurrent
/// fetches until all are confirmed or the job aborts.
///
/// Errors outside the retry taxonomy (storage failures, worker panics) set
/// the abort flag and are returned once the current batch has drained.
pub fn run_segments(
    segments: &mut [Segment],
    ctx: &FetchContext<'_>,
    policy: &RetryPolicy,
    workers: usize,
) -> Result<RunSummary> {
    let workers = workers.max(1);
    let mut summary = RunSummary::default();

    while !all_confirmed(segments) && !ctx.abort.is_aborted() {
        summary.batches += 1;
        let pending: VecDeque<&mut Segment> = segments.iter_mut().filter(|s| !s.confirmed).collect();
        tracing::debug!(batch = summary.batches, pending = pending.len(), "dispatching batch");
        let batch_failure = run_batch(pending, ctx, policy, workers)?;
        summary.failure = summary.failure.or(batch_failure);
    }

    if ctx.abort.is_aborted() && summary.failure.is_none() {
        summary.failure = Some(if ctx.abort.terminal_status().is_some() {
            ErrorKind::TransportFailure
        } else {
            ErrorKind::JobAborted
        });
    }
    Ok(summary)
}

/// Runs one batch on a scoped pool. Each worker pulls segments from a shared
/// queue, so a segment is only ever borrowed by one worker.
fn run_batch(
    pending: VecDeque<&mut Segment>,
    ctx: &FetchContext<'_>,
    policy: &RetryPolicy,
    workers: usize,
) -> Result<Option<ErrorKind>> {
    let num_workers = workers.min(pending.len());
    let queue = Mutex::new(pending);
    let (tx, rx) = mpsc::channel();

    let joined: Vec<std::thread::Result<()>> = std::thread::scope(|scope| {
        let queue = &queue;
        let handles: Vec<_> = (0..num_workers)
            .map(|_| {
                let tx = tx.clone();
                scope.spawn(move || loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some(segment) = next else {
                        break;
                    };
                    let ordinal = segment.ordinal;
                    let res = run_attempt(segment, ctx, policy);
                    if res.is_err() {
                        ctx.abort.abort();
                    }
                    if tx.send((ordinal, res)).is_err() {
                        break;
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });
    drop(tx);

    let mut failure = None;
    let mut fatal: Option<anyhow::Error> = None;
    for (ordinal, res) in rx.try_iter() {
        match res {
            Ok(Decision::Abort(kind)) => {
                failure = failure.or(Some(kind));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(ordinal, error = %e, "unrecoverable segment error");
                if fatal.is_none() {
                    fatal = Some(e.context(format!("segment {}", ordinal)));
                }
            }
        }
    }
    for res in joined {
        if let Err(panic) = res {
            ctx.abort.abort();
            if fatal.is_none() {
                fatal = Some(anyhow::anyhow!("segment worker panicked: {:?}", panic));
            }
        }
    }
    match fatal {
        Some(e) => Err(e),
        None => Ok(failure),
    }
}
