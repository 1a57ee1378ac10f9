//! One fetch-and-evaluate cycle for a single segment.

use anyhow::Result;

use crate::fetcher::{fetch_segment, FetchContext, Outcome};
use crate::retry::{Decision, FetchError, RetryPolicy};
use crate::segmenter::Segment;

/// Fetches `segment` once (unless the job is aborted or the segment is out of
/// attempts), applies the policy, and updates the segment accordingly.
/// An `Abort` decision sets the job abort flag before returning.
pub(super) fn run_attempt(
    segment: &mut Segment,
    ctx: &FetchContext<'_>,
    policy: &RetryPolicy,
) -> Result<Decision> {
    let ordinal = segment.ordinal;
    let outcome: Outcome = if ctx.abort.is_aborted() {
        Err(FetchError::JobAborted { ordinal })
    } else if segment.attempt_count >= policy.max_attempts {
        Err(FetchError::RetryLimitExceeded {
            ordinal,
            max_attempts: policy.max_attempts,
        })
    } else {
        segment.attempt_count += 1;
        if segment.attempt_count > 1 {
            tracing::debug!(
                ordinal,
                attempt = segment.attempt_count,
                from = segment.next_offset(),
                "retrying segment"
            );
        }
        fetch_segment(segment, ctx)?
    };

    let decision = policy.decide(&outcome, segment.attempt_count);
    match (&decision, &outcome) {
        (Decision::Confirm, _) => {
            segment.confirmed = true;
            tracing::trace!(ordinal, attempts = segment.attempt_count, "segment confirmed");
        }
        (Decision::Retry, Err(e)) => {
            tracing::debug!(ordinal, progress = segment.progress, error = %e, "segment attempt failed");
        }
        (Decision::Abort(kind), Err(e)) => {
            tracing::warn!(ordinal, kind = ?kind, error = %e, "aborting job");
            ctx.abort.abort();
        }
        (Decision::Skip, _) => {
            tracing::debug!(ordinal, "job aborted, segment skipped");
        }
        _ => {}
    }
    Ok(decision)
}
