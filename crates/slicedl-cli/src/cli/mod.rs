//! CLI for the slicedl segmented downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use slicedl_core::config::SlicedlConfig;
use slicedl_core::headers::parse_header_line;
use std::path::PathBuf;

use commands::{run_get, run_show_config, GetArgs};

/// Top-level CLI for the slicedl downloader.
#[derive(Debug, Parser)]
#[command(name = "slicedl")]
#[command(about = "slicedl: concurrent range-sliced HTTP downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL in parallel byte-range segments.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Output file (default: last URL path segment in the current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Directory for segment files (default: OUTPUT.parts). Wiped before and after the run.
        #[arg(long, value_name = "DIR")]
        temp_dir: Option<PathBuf>,

        /// Number of concurrent segment fetches.
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// Per-attempt time budget in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,

        /// Attempts allowed per segment.
        #[arg(long, value_name = "N")]
        retries: Option<u32>,

        /// Extra request header, e.g. -H "Referer: https://example.com/".
        #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header_arg)]
        headers: Vec<(String, String)>,

        /// HTTP status that aborts the whole job (repeatable; replaces the configured set).
        #[arg(long = "abort-status", value_name = "CODE")]
        abort_status: Vec<u32>,

        /// Print the job report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the config file path and the effective defaults.
    Config,
}

fn parse_header_arg(s: &str) -> Result<(String, String), String> {
    parse_header_line(s).ok_or_else(|| format!("expected \"Name: value\", got {:?}", s))
}

impl CliCommand {
    /// Parses arguments and runs the command. `Ok(false)` means the command
    /// ran but did not succeed (e.g. the download failed).
    pub async fn run_from_args() -> Result<bool> {
        let cli = Cli::parse();
        let cfg = SlicedlConfig::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                output,
                temp_dir,
                threads,
                timeout,
                retries,
                headers,
                abort_status,
                json,
            } => {
                let args = GetArgs {
                    url,
                    output,
                    temp_dir,
                    threads,
                    timeout,
                    retries,
                    headers,
                    abort_status,
                    json,
                };
                run_get(&cfg, args).await
            }
            CliCommand::Config => {
                run_show_config(&cfg)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests;
