//! CLI for the kazky tale downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kazky_core::config;
use std::path::PathBuf;

use commands::{run_fetch, run_list, run_show_config, FetchOverrides};

/// Top-level CLI for kazky.
#[derive(Debug, Parser)]
#[command(name = "kazky")]
#[command(about = "kazky: download audio tales and tag them with title, narrator and cover", long_about = None)]
pub struct Cli {
    /// Log every job admission and settlement (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every tale in the manifest and tag the songs.
    Fetch {
        /// Directory that receives `media/` and `tmp/` (default: current directory).
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Download up to N tales concurrently (default from config, 5).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Fail a tale that takes longer than SECS seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Stop in-flight downloads as soon as one tale fails.
        #[arg(long)]
        cancel_on_failure: bool,
        /// Site root serving `index.json` (default from config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// List the tales in the manifest.
    List {
        /// Site root serving `index.json` (default from config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Show the config file path and the effective configuration.
    Config,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub async fn run(self) -> Result<()> {
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Fetch {
                output,
                jobs,
                timeout,
                cancel_on_failure,
                base_url,
            } => {
                FetchOverrides {
                    jobs,
                    timeout,
                    cancel_on_failure,
                    base_url,
                }
                .apply(&mut cfg);
                let output_dir = match output {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_fetch(&cfg, &output_dir).await?;
            }
            CliCommand::List { base_url } => {
                if let Some(url) = base_url {
                    cfg.base_url = url;
                }
                run_list(&cfg).await?;
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
