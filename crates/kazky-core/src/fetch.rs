//! HTTP GET over libcurl (via the `curl` crate).
//!
//! Bodies are either collected in memory (manifest) or streamed to a `.part`
//! file that is renamed onto the destination once the transfer succeeded.
//! Everything here blocks; async callers go through the `*_async` wrappers,
//! which run the transfer on tokio's blocking pool.

use anyhow::Context;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::batch::CancelToken;
use crate::storage;

/// Transport, protocol and filesystem failures while fetching a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    #[error("GET {url} cancelled")]
    Cancelled { url: String },
    #[error("writing body of {url}")]
    Sink {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per-request options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Abort the transfer once this token is tripped.
    pub cancel: Option<CancelToken>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            cancel: None,
        }
    }
}

/// Resolve `path` against the site root `base`, like `[base, path].join('/')`.
pub fn join_url(base: &str, path: &str) -> Result<Url, FetchError> {
    let invalid = |source| FetchError::InvalidUrl {
        url: format!("{}/{}", base, path),
        source,
    };
    let mut root = Url::parse(base).map_err(invalid)?;
    if !root.path().ends_with('/') {
        let dir = format!("{}/", root.path());
        root.set_path(&dir);
    }
    root.join(path.trim_start_matches('/')).map_err(invalid)
}

/// GET `url` and return the whole body.
pub fn fetch_bytes(url: &str, opts: &FetchOptions) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    perform_get(url, opts, |data| {
        body.extend_from_slice(data);
        Ok(())
    })?;
    Ok(body)
}

/// GET `url` into `dest`. Writes `dest.part` first and renames on success; the
/// partial file is removed on any failure. Returns the number of bytes written.
pub fn download_file(url: &str, dest: &Path, opts: &FetchOptions) -> Result<u64, FetchError> {
    let part = storage::temp_path(dest);
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| FetchError::Io { path, source }
    };

    let mut file = File::create(&part).map_err(io_err(&part))?;
    let result = perform_get(url, opts, |data| file.write_all(data))
        .and_then(|n| file.sync_all().map(|()| n).map_err(io_err(&part)));
    drop(file);

    match result {
        Ok(n) => {
            std::fs::rename(&part, dest).map_err(io_err(dest))?;
            tracing::debug!(url, dest = %dest.display(), bytes = n, "download finished");
            Ok(n)
        }
        Err(e) => {
            storage::discard_partial(&part);
            Err(e)
        }
    }
}

/// [`fetch_bytes`] on the blocking pool.
pub async fn fetch_bytes_async(url: String, opts: FetchOptions) -> anyhow::Result<Vec<u8>> {
    let body = tokio::task::spawn_blocking(move || fetch_bytes(&url, &opts))
        .await
        .context("fetch task join")??;
    Ok(body)
}

/// [`download_file`] on the blocking pool.
pub async fn download_file_async(
    url: String,
    dest: PathBuf,
    opts: FetchOptions,
) -> anyhow::Result<u64> {
    let n = tokio::task::spawn_blocking(move || download_file(&url, &dest, &opts))
        .await
        .context("download task join")??;
    Ok(n)
}

/// Run a GET, feeding body chunks to `sink`. Non-2xx responses are errors.
fn perform_get<S>(url: &str, opts: &FetchOptions, mut sink: S) -> Result<u64, FetchError>
where
    S: FnMut(&[u8]) -> io::Result<()>,
{
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.max_redirections(10).map_err(transport)?;
    easy.connect_timeout(opts.connect_timeout).map_err(transport)?;
    // Abort if throughput stays below 1 KiB/s for a minute.
    easy.low_speed_limit(1024).map_err(transport)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(transport)?;
    easy.progress(opts.cancel.is_some()).map_err(transport)?;

    let mut written = 0u64;
    let mut sink_error: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match sink(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(transport)?;
        if let Some(cancel) = &opts.cancel {
            transfer
                .progress_function(move |_, _, _, _| !cancel.is_cancelled())
                .map_err(transport)?;
        }
        transfer.perform()
    };

    if let Err(e) = performed {
        if let Some(source) = sink_error {
            return Err(FetchError::Sink {
                url: url.to_string(),
                source,
            });
        }
        if e.is_aborted_by_callback() {
            return Err(FetchError::Cancelled {
                url: url.to_string(),
            });
        }
        return Err(transport(e));
    }

    let status = easy.response_code().map_err(transport)?;
    if !(200..300).contains(&status) {
        return Err(FetchError::Http {
            url: url.to_string(),
            status,
        });
    }
    Ok(written)
}
