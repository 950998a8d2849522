//! `kazky fetch` – download and tag every tale.

use anyhow::Result;
use kazky_core::batch::BatchProgress;
use kazky_core::config::KazkyConfig;
use kazky_core::tales;
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc;

/// Command-line values that take precedence over config.toml.
#[derive(Debug, Default, Clone)]
pub struct FetchOverrides {
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub cancel_on_failure: bool,
    pub base_url: Option<String>,
}

impl FetchOverrides {
    pub fn apply(self, cfg: &mut KazkyConfig) {
        if let Some(jobs) = self.jobs {
            cfg.concurrency = jobs;
        }
        if let Some(secs) = self.timeout {
            cfg.job_timeout_secs = Some(secs);
        }
        if self.cancel_on_failure {
            cfg.cancel_on_failure = true;
        }
        if let Some(url) = self.base_url {
            cfg.base_url = url;
        }
    }
}

pub async fn run_fetch(cfg: &KazkyConfig, output_dir: &Path) -> Result<()> {
    let (progress_tx, mut progress_rx) = mpsc::channel::<BatchProgress>(16);
    const PROGRESS_INTERVAL_MS: u64 = 500;
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(p) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || p.settled() == p.total
            {
                println!(
                    "  {} / {} tales ({:.0}%)  running {}  queued {}",
                    p.settled(),
                    p.total,
                    p.fraction() * 100.0,
                    p.running,
                    p.pending()
                );
                last_print = now;
            }
        }
    });

    let result = tales::run_all(cfg, output_dir, Some(progress_tx)).await;
    let _ = progress_handle.await;
    let summary = result?;

    println!(
        "Downloaded {} tale(s) to {} in {:.1}s",
        summary.tales,
        summary.media_dir.display(),
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
