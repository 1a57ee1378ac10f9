use super::commands::{job_config, GetArgs};
use super::{Cli, CliCommand};
use clap::Parser;
use slicedl_core::config::SlicedlConfig;
use std::path::PathBuf;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_get_minimal() {
    match parse(&["slicedl", "get", "https://example.com/file.iso"]) {
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
            assert_eq!(url, "https://example.com/file.iso");
            assert!(output.is_none());
            assert!(temp_dir.is_none());
            assert!(threads.is_none());
            assert!(timeout.is_none());
            assert!(retries.is_none());
            assert!(headers.is_empty());
            assert!(abort_status.is_empty());
            assert!(!json);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_all_flags() {
    let cmd = parse(&[
        "slicedl",
        "get",
        "https://example.com/a.bin",
        "-o",
        "/tmp/out.bin",
        "--temp-dir",
        "/tmp/parts",
        "-j",
        "8",
        "--timeout",
        "12.5",
        "--retries",
        "5",
        "-H",
        "Referer: https://example.com/",
        "--header",
        "Cookie: a=b",
        "--abort-status",
        "403",
        "--abort-status",
        "410",
        "--json",
    ]);
    match cmd {
        CliCommand::Get {
            output,
            temp_dir,
            threads,
            timeout,
            retries,
            headers,
            abort_status,
            json,
            ..
        } => {
            assert_eq!(output, Some(PathBuf::from("/tmp/out.bin")));
            assert_eq!(temp_dir, Some(PathBuf::from("/tmp/parts")));
            assert_eq!(threads, Some(8));
            assert_eq!(timeout, Some(12.5));
            assert_eq!(retries, Some(5));
            assert_eq!(
                headers,
                vec![
                    ("Referer".to_string(), "https://example.com/".to_string()),
                    ("Cookie".to_string(), "a=b".to_string()),
                ]
            );
            assert_eq!(abort_status, vec![403, 410]);
            assert!(json);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_rejects_malformed_header() {
    assert!(Cli::try_parse_from(["slicedl", "get", "https://example.com/", "-H", "no-colon"]).is_err());
}

#[test]
fn cli_get_requires_url() {
    assert!(Cli::try_parse_from(["slicedl", "get"]).is_err());
}

#[test]
fn cli_parse_config() {
    match parse(&["slicedl", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn job_config_defaults_from_url() {
    let cfg = SlicedlConfig::default();
    let args = GetArgs {
        url: "https://example.com/dir/video.mp4?x=1".to_string(),
        ..GetArgs::default()
    };
    let job = job_config(&cfg, &args);
    assert_eq!(job.output_path, PathBuf::from("video.mp4"));
    assert_eq!(job.temp_dir, PathBuf::from("video.mp4.parts"));
    assert_eq!(job.threads, cfg.threads);
    assert_eq!(job.max_attempts, cfg.max_attempts);
    assert_eq!(job.abort_status_codes, vec![403]);
}

#[test]
fn job_config_flags_override_file_defaults() {
    let cfg = SlicedlConfig::default();
    let args = GetArgs {
        url: "https://example.com/".to_string(),
        output: Some(PathBuf::from("out/x.bin")),
        threads: Some(2),
        timeout: Some(3.0),
        retries: Some(7),
        headers: vec![("Referer".to_string(), "https://example.com/".to_string())],
        abort_status: vec![404],
        ..GetArgs::default()
    };
    let job = job_config(&cfg, &args);
    assert_eq!(job.output_path, PathBuf::from("out/x.bin"));
    assert_eq!(job.temp_dir, PathBuf::from("out/x.bin.parts"));
    assert_eq!(job.threads, 2);
    assert_eq!(job.timeout_secs, 3.0);
    assert_eq!(job.max_attempts, 7);
    assert_eq!(job.abort_status_codes, vec![404]);
    assert_eq!(job.headers.get("referer").map(String::as_str), Some("https://example.com/"));
}
