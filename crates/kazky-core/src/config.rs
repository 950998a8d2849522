use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default manifest host.
pub const DEFAULT_BASE_URL: &str = "https://kazky.suspilne.media";

/// Global configuration loaded from `~/.config/kazky/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KazkyConfig {
    /// Site root; the manifest is `<base_url>/index.json` and entry paths are relative to it.
    pub base_url: String,
    /// Maximum number of tales downloaded concurrently.
    pub concurrency: usize,
    /// Directory for tagged songs, relative to the output directory.
    pub media_dir: PathBuf,
    /// Scratch directory for cover images, relative to the output directory.
    pub tmp_dir: PathBuf,
    /// Optional per-tale deadline in seconds (None = wait forever).
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
    /// Ask in-flight downloads to stop once one tale fails.
    #[serde(default)]
    pub cancel_on_failure: bool,
    /// TCP connect timeout for every HTTP request.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for KazkyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 5,
            media_dir: PathBuf::from("media"),
            tmp_dir: PathBuf::from("tmp"),
            job_timeout_secs: None,
            cancel_on_failure: false,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl KazkyConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Absolute media and tmp directories under `output_dir`.
    pub fn layout(&self, output_dir: &Path) -> (PathBuf, PathBuf) {
        (output_dir.join(&self.media_dir), output_dir.join(&self.tmp_dir))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("kazky")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Render `cfg` as it would be written to config.toml.
pub fn to_toml_string(cfg: &KazkyConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<KazkyConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<KazkyConfig> {
    if !path.exists() {
        let default_cfg = KazkyConfig::default();
        let toml = to_toml_string(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: KazkyConfig = toml::from_str(&data)?;
    Ok(cfg)
}
