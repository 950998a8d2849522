//! Tests for list, config and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_list() {
    match parse(&["kazky", "list"]).command {
        CliCommand::List { base_url } => assert!(base_url.is_none()),
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_list_base_url() {
    match parse(&["kazky", "list", "--base-url", "http://x"]).command {
        CliCommand::List { base_url } => assert_eq!(base_url.as_deref(), Some("http://x")),
        _ => panic!("expected List with --base-url"),
    }
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["kazky", "config"]).command, CliCommand::Config));
}

#[test]
fn cli_verbose_is_global() {
    assert!(parse(&["kazky", "-v", "list"]).verbose);
    assert!(parse(&["kazky", "fetch", "--verbose"]).verbose);
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["kazky"]).is_err());
}
