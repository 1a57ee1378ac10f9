//! CLI command handlers.

mod config;
mod get;

pub use config::run_show_config;
pub use get::{job_config, run_get, GetArgs};
