//! Tests for the fetch subcommand.

use super::parse;
use crate::cli::CliCommand;
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_fetch_defaults() {
    let cli = parse(&["kazky", "fetch"]);
    assert!(!cli.verbose);
    match cli.command {
        CliCommand::Fetch {
            output,
            jobs,
            timeout,
            cancel_on_failure,
            base_url,
        } => {
            assert!(output.is_none());
            assert!(jobs.is_none());
            assert!(timeout.is_none());
            assert!(!cancel_on_failure);
            assert!(base_url.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_all_flags() {
    let cli = parse(&[
        "kazky",
        "fetch",
        "--output",
        "/tmp/tales",
        "--jobs",
        "8",
        "--timeout",
        "120",
        "--cancel-on-failure",
        "--base-url",
        "http://127.0.0.1:8080",
    ]);
    match cli.command {
        CliCommand::Fetch {
            output,
            jobs,
            timeout,
            cancel_on_failure,
            base_url,
        } => {
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/tales")));
            assert_eq!(jobs, Some(8));
            assert_eq!(timeout, Some(120));
            assert!(cancel_on_failure);
            assert_eq!(base_url.as_deref(), Some("http://127.0.0.1:8080"));
        }
        _ => panic!("expected Fetch with flags"),
    }
}

#[test]
fn cli_parse_fetch_rejects_non_numeric_jobs() {
    assert!(crate::cli::Cli::try_parse_from(["kazky", "fetch", "--jobs", "many"]).is_err());
}
