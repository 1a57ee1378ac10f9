//! Job driver: probe, plan, run, merge, clean up.
//!
//! `Job::start` walks `Planning -> Running -> Merging -> Done`, falling to
//! `Failed` on probe errors, aborts, or a merge with nothing to merge. The temp
//! directory is removed on every path out of `start`, including errors.

mod report;

pub use report::{JobReport, JobState};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::JobConfig;
use crate::control::AbortHandle;
use crate::coordinator::{all_confirmed, run_segments};
use crate::fetcher::FetchContext;
use crate::headers::normalize_headers;
use crate::probe::probe;
use crate::retry::{ErrorKind, RetryPolicy};
use crate::segmenter::{plan_segments, Segment};
use crate::storage;

/// One download of one resource. Owns the segments and the abort flag.
///
/// A job runs once: the abort flag is never cleared, so an abort requested
/// before or during `start` holds for the job's whole life. Build a new `Job`
/// to download again.
pub struct Job {
    config: JobConfig,
    abort: AbortHandle,
    state: JobState,
    segments: Vec<Segment>,
    started: bool,
}

impl Job {
    /// Validates `config` and builds an idle job.
    pub fn new(config: JobConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            abort: AbortHandle::new(),
            state: JobState::Planning,
            segments: Vec::new(),
            started: false,
        })
    }

    /// Handle that can stop the job from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Segments of the last run (empty before `start`).
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Runs the job to completion.
    ///
    /// Returns a report whose `completed` flag says whether the merged output
    /// exists. Errors outside the fetch taxonomy (storage failures, worker
    /// panics) come back as `Err`. Temp storage is removed in every case.
    /// Calling `start` a second time is an error and touches nothing on disk.
    pub fn start(&mut self) -> Result<JobReport> {
        if self.started {
            anyhow::bail!("job for {} already ran", self.config.url);
        }
        self.started = true;
        let result = self.run();
        if let Err(e) = &result {
            self.state = JobState::Failed;
            tracing::error!(error = %format!("{:#}", e), "job failed");
        }
        tracing::debug!(dir = %self.config.temp_dir.display(), "removing temp dir");
        if let Err(e) = storage::wipe_dir(&self.config.temp_dir) {
            tracing::warn!(error = %format!("{:#}", e), "could not remove temp dir");
        }
        result
    }

    fn run(&mut self) -> Result<JobReport> {
        let mut report = JobReport::new(self.config.output_path.clone());
        self.state = JobState::Planning;
        self.segments.clear();

        let headers = normalize_headers(&self.config.headers);
        let probed = match probe(&self.config.url, &headers, self.config.timeout()) {
            Ok(p) => p,
            Err(e) => {
                if let Some(code) = e.status_code() {
                    if self.config.abort_status_codes.contains(&code) {
                        self.abort.abort_with_status(code);
                    }
                }
                tracing::warn!(error = %e, "probe failed");
                report.terminal_status = self.abort.terminal_status();
                report.failure = Some(e.kind());
                return Ok(self.finish(report, JobState::Failed));
            }
        };
        report.total_size = Some(probed.total_size);

        self.segments = match plan_segments(
            probed.total_size,
            self.config.threads,
            &probed.effective_url,
            &headers,
        ) {
            Ok(segments) => segments,
            Err(e) => {
                tracing::warn!(error = %e, "cannot plan download");
                report.failure = Some(e.kind());
                return Ok(self.finish(report, JobState::Failed));
            }
        };
        report.segment_count = self.segments.len();
        tracing::info!(
            url = %probed.effective_url,
            status = probed.status,
            accept_ranges = probed.accept_ranges,
            total_size = probed.total_size,
            segments = self.segments.len(),
            "planned download"
        );
        storage::reset_dir(&self.config.temp_dir)?;
        ensure_parent_dir(&self.config.output_path)?;

        if self.segments.is_empty() {
            write_empty_output(&self.config.output_path)?;
            report.completed = true;
            return Ok(self.finish(report, JobState::Done));
        }

        self.state = JobState::Running;
        let ctx = FetchContext {
            temp_dir: &self.config.temp_dir,
            timeout: self.config.timeout(),
            chunk_size: self.config.chunk_size,
            abort_statuses: &self.config.abort_status_codes,
            abort: &self.abort,
        };
        let policy = RetryPolicy::new(self.config.max_attempts);
        let summary = run_segments(&mut self.segments, &ctx, &policy, self.config.threads)?;
        report.batches = summary.batches;
        report.terminal_status = self.abort.terminal_status();

        if self.abort.is_aborted() || !all_confirmed(&self.segments) {
            report.failure = summary.failure.or(Some(ErrorKind::JobAborted));
            tracing::warn!(
                failure = ?report.failure,
                terminal_status = ?report.terminal_status,
                "download aborted, skipping merge"
            );
            return Ok(self.finish(report, JobState::Failed));
        }

        self.state = JobState::Merging;
        let files = storage::list_segment_files(&self.config.temp_dir)?;
        tracing::debug!(
            from = %self.config.temp_dir.display(),
            to = %self.config.output_path.display(),
            files = files.len(),
            "merging segments"
        );
        let merged = storage::merge_segment_files(&files, &self.config.output_path, self.config.chunk_size)?;
        if !merged {
            tracing::warn!("no segment files to merge");
            return Ok(self.finish(report, JobState::Failed));
        }
        report.completed = true;
        tracing::info!(output = %self.config.output_path.display(), "download complete");
        Ok(self.finish(report, JobState::Done))
    }

    fn finish(&mut self, mut report: JobReport, state: JobState) -> JobReport {
        self.state = state;
        report.state = state;
        report
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    Ok(())
}

fn write_empty_output(path: &Path) -> Result<()> {
    fs::File::create(path).with_context(|| format!("create empty output {}", path.display()))?;
    Ok(())
}
