//! Tale pipeline: manifest → one batch job per tale → tagged MP3s.
//!
//! Each job downloads the cover into the tmp dir and the song into the media
//! dir, then embeds title, narrator and cover into the song's ID3 tag.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::batch::{BatchExecutor, BatchProgress, Job};
use crate::config::KazkyConfig;
use crate::fetch::{self, FetchOptions};
use crate::manifest::{self, TaleEntry};
use crate::storage;
use crate::tagging::{self, TaleTags};

/// Where covers and songs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub media_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

impl Layout {
    pub fn from_config(cfg: &KazkyConfig, output_dir: &Path) -> Self {
        let (media_dir, tmp_dir) = cfg.layout(output_dir);
        Self { media_dir, tmp_dir }
    }

    pub fn cover_path(&self, entry: &TaleEntry) -> PathBuf {
        self.tmp_dir
            .join(format!("{}.jpg", storage::sanitize_file_stem(&entry.name)))
    }

    pub fn song_path(&self, entry: &TaleEntry) -> PathBuf {
        self.media_dir
            .join(format!("{}.mp3", storage::sanitize_file_stem(&entry.name)))
    }
}

/// Recreate the tmp and media directories empty.
pub fn prepare_dirs(layout: &Layout) -> Result<()> {
    storage::recreate_dir(&layout.tmp_dir)?;
    storage::recreate_dir(&layout.media_dir)?;
    Ok(())
}

/// Everything a tale job needs besides its entry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TaleContext {
    pub base_url: String,
    pub layout: Arc<Layout>,
    pub fetch: FetchOptions,
}

/// Download one tale's cover and song, then tag the song.
pub async fn download_tale(entry: &TaleEntry, ctx: &TaleContext) -> Result<()> {
    let cover_url = fetch::join_url(&ctx.base_url, &entry.image)?;
    let song_url = fetch::join_url(&ctx.base_url, &entry.song)?;
    let cover_path = ctx.layout.cover_path(entry);
    let song_path = ctx.layout.song_path(entry);

    tracing::info!("downloading: {}", entry.name);

    fetch::download_file_async(cover_url.to_string(), cover_path.clone(), ctx.fetch.clone())
        .await
        .with_context(|| format!("cover for {:?}", entry.name))?;
    fetch::download_file_async(song_url.to_string(), song_path.clone(), ctx.fetch.clone())
        .await
        .with_context(|| format!("song for {:?}", entry.name))?;

    let cover_jpeg = tokio::fs::read(&cover_path)
        .await
        .with_context(|| format!("read cover {}", cover_path.display()))?;
    tagging::write_tale_tags_async(
        song_path,
        TaleTags {
            title: entry.name.clone(),
            artist: entry.auth.clone(),
            cover_jpeg,
        },
    )
    .await
    .with_context(|| format!("tag {:?}", entry.name))?;

    tracing::info!("done: {}", entry.name);
    Ok(())
}

/// One job per entry; each job owns its entry and a clone of `ctx`.
pub fn build_jobs(entries: Vec<TaleEntry>, ctx: &TaleContext) -> Vec<Job> {
    entries
        .into_iter()
        .map(|entry| {
            let ctx = ctx.clone();
            Job::new(move || async move { download_tale(&entry, &ctx).await })
        })
        .collect()
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tales: usize,
    pub media_dir: PathBuf,
    pub elapsed: Duration,
}

/// Full pipeline: recreate dirs, fetch the manifest, download every tale with
/// `cfg.concurrency` in flight, then drop the tmp dir.
///
/// Fails on the first tale that fails; an empty manifest fails with
/// [`crate::batch::BatchError::EmptyBatch`].
pub async fn run_all(
    cfg: &KazkyConfig,
    output_dir: &Path,
    progress_tx: Option<mpsc::Sender<BatchProgress>>,
) -> Result<RunSummary> {
    let layout = Layout::from_config(cfg, output_dir);
    prepare_dirs(&layout)?;

    let mut executor =
        BatchExecutor::new(cfg.concurrency).with_cancel_on_failure(cfg.cancel_on_failure);
    if let Some(after) = cfg.job_timeout() {
        executor = executor.with_job_timeout(after);
    }
    if let Some(tx) = progress_tx {
        executor = executor.with_progress(tx);
    }
    let fetch = FetchOptions {
        connect_timeout: cfg.connect_timeout(),
        cancel: Some(executor.cancel_token()),
    };

    let manifest = manifest::fetch_manifest(&cfg.base_url, fetch.clone()).await?;
    let entries: Vec<TaleEntry> = manifest
        .into_entries()
        .into_iter()
        .map(|(_, entry)| entry)
        .collect();
    let tales = entries.len();

    let ctx = TaleContext {
        base_url: cfg.base_url.clone(),
        layout: Arc::new(layout.clone()),
        fetch,
    };
    let started = Instant::now();
    executor
        .run(build_jobs(entries, &ctx))
        .await
        .context("downloading tales")?;

    storage::remove_dir_if_exists(&layout.tmp_dir)?;
    let elapsed = started.elapsed();
    tracing::info!(tales, ?elapsed, "all tales downloaded to {}", layout.media_dir.display());

    Ok(RunSummary {
        tales,
        media_dir: layout.media_dir,
        elapsed,
    })
}
