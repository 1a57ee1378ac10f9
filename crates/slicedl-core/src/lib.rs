pub mod config;
pub mod logging;

pub mod control;
pub mod coordinator;
pub mod fetcher;
pub mod headers;
pub mod job;
pub mod probe;
pub mod retry;
pub mod segmenter;
pub mod storage;
pub mod url_model;

pub use config::{JobConfig, SlicedlConfig};
pub use control::AbortHandle;
pub use job::{Job, JobReport, JobState};
pub use retry::{ErrorKind, FetchError};
