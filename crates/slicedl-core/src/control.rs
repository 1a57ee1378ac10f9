//! Job-wide abort flag and terminal status.
//!
//! One `AbortHandle` is shared by every worker of a job and can be cloned out
//! to the caller (e.g. a Ctrl-C handler). Once set, the flag is never cleared
//! for the lifetime of the job.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
    // 0 means no terminal status.
    status: Arc<AtomicU32>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop all further segment dispatch.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Abort because a response status is in the abort set. The first status wins.
    pub fn abort_with_status(&self, code: u32) {
        let _ = self
            .status
            .compare_exchange(0, code, Ordering::SeqCst, Ordering::SeqCst);
        self.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Status code that forced the abort, if any.
    pub fn terminal_status(&self) -> Option<u32> {
        match self.status.load(Ordering::SeqCst) {
            0 => None,
            code => Some(code),
        }
    }
}
