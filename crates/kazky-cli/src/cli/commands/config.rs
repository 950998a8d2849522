//! `kazky config` – show where the config lives and what is in effect.

use anyhow::Result;
use kazky_core::config::{self, KazkyConfig};

pub fn run_show_config(cfg: &KazkyConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", config::to_toml_string(cfg)?);
    Ok(())
}
