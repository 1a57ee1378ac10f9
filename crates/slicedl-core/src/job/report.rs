//! Job state machine states and the report handed back to the caller.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::retry::ErrorKind;

/// `Planning -> Running -> Merging -> Done`; any state may go to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Planning,
    Running,
    Merging,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Planning => "planning",
            JobState::Running => "running",
            JobState::Merging => "merging",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of one `Job::start` run.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub state: JobState,
    /// True only when a complete merged file exists at `output_path`.
    pub completed: bool,
    pub output_path: PathBuf,
    /// Resource size reported by the probe.
    pub total_size: Option<u64>,
    pub segment_count: usize,
    /// Coordinator batches dispatched.
    pub batches: u32,
    /// Status code that forced the abort, if any.
    pub terminal_status: Option<u32>,
    /// Why the job failed.
    pub failure: Option<ErrorKind>,
}

impl JobReport {
    pub(super) fn new(output_path: PathBuf) -> Self {
        Self {
            state: JobState::Planning,
            completed: false,
            output_path,
            total_size: None,
            segment_count: 0,
            batches: 0,
            terminal_status: None,
            failure: None,
        }
    }
}
