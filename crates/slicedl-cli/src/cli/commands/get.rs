//! `slicedl get` – run one download job.

use anyhow::{Context, Result};
use slicedl_core::config::SlicedlConfig;
use slicedl_core::storage::parts_dir;
use slicedl_core::url_model::default_output_name;
use slicedl_core::{Job, JobConfig, JobReport};
use std::path::PathBuf;

/// Per-run overrides collected from the command line.
#[derive(Debug, Default)]
pub struct GetArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub threads: Option<usize>,
    pub timeout: Option<f64>,
    pub retries: Option<u32>,
    pub headers: Vec<(String, String)>,
    pub abort_status: Vec<u32>,
    pub json: bool,
}

/// Builds the job config: file defaults first, then command-line overrides.
pub fn job_config(cfg: &SlicedlConfig, args: &GetArgs) -> JobConfig {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_name(&args.url)));
    let temp_dir = args.temp_dir.clone().unwrap_or_else(|| parts_dir(&output));
    let mut job_cfg = JobConfig::from_defaults(cfg, args.url.clone(), temp_dir, output);
    if let Some(threads) = args.threads {
        job_cfg.threads = threads;
    }
    if let Some(timeout) = args.timeout {
        job_cfg.timeout_secs = timeout;
    }
    if let Some(retries) = args.retries {
        job_cfg.max_attempts = retries;
    }
    if !args.abort_status.is_empty() {
        job_cfg.abort_status_codes = args.abort_status.clone();
    }
    for (name, value) in &args.headers {
        job_cfg.headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    job_cfg
}

/// Runs the job on a blocking thread. Ctrl-C sets the abort flag and waits
/// for the job to clean up. Returns whether the output was produced.
pub async fn run_get(cfg: &SlicedlConfig, args: GetArgs) -> Result<bool> {
    let job_cfg = job_config(cfg, &args);
    tracing::info!(
        url = %job_cfg.url,
        output = %job_cfg.output_path.display(),
        threads = job_cfg.threads,
        "starting download"
    );
    let mut job = Job::new(job_cfg)?;
    let abort = job.abort_handle();
    let mut task = tokio::task::spawn_blocking(move || job.start());

    let report = tokio::select! {
        res = &mut task => res.context("download task")??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, aborting download");
            abort.abort();
            task.await.context("download task")??
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(report.completed)
}

fn print_summary(report: &JobReport) {
    if report.completed {
        let size = report
            .total_size
            .map(|s| format!("{s} bytes"))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "Downloaded {} to {} ({} segments, {} batches).",
            size,
            report.output_path.display(),
            report.segment_count,
            report.batches
        );
        return;
    }
    let reason = report
        .failure
        .map(|k| format!("{:?}", k))
        .unwrap_or_else(|| "unknown".to_string());
    match report.terminal_status {
        Some(code) => println!("Download failed: {} (HTTP {}).", reason, code),
        None => println!("Download failed: {}.", reason),
    }
}
