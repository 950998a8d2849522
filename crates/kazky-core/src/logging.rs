//! Logging init: append to a file under the XDG state dir, or fall back to stderr.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,kazky=debug,kazky_core=debug";

/// Verbose variant used by `--verbose`: executor admissions and settlements.
const VERBOSE_FILTER: &str = "debug,curl=info";

/// Per-event writer: the shared log file, or stderr if its handle can't be cloned.
enum LogSink {
    File(fs::File),
    Stderr,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct AppendFile(fs::File);

impl<'a> MakeWriter<'a> for AppendFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogSink::File)
            .unwrap_or(LogSink::Stderr)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    })
}

/// Default log file: `~/.local/state/kazky/kazky.log`.
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("kazky")?;
    Ok(xdg_dirs.get_state_home().join("kazky.log"))
}

/// Initialize structured logging to the default log file.
/// Returns Err if the file can't be opened so the caller can fall back to stderr.
pub fn init_logging(verbose: bool) -> Result<()> {
    init_logging_at(&default_log_path()?, verbose)
}

/// Initialize structured logging, appending to `log_file_path`.
pub fn init_logging_at(log_file_path: &Path, verbose: bool) -> Result<()> {
    if let Some(dir) = log_file_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(BoxMakeWriter::new(AppendFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber: {}", e))?;

    tracing::info!("kazky logging initialized at {}", log_file_path.display());
    Ok(())
}

/// Initialize logging to stderr only. Use when [`init_logging`] fails so the CLI doesn't crash.
pub fn init_logging_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
