//! `kazky list` – print the manifest.

use anyhow::Result;
use kazky_core::config::KazkyConfig;
use kazky_core::fetch::FetchOptions;
use kazky_core::manifest;

pub async fn run_list(cfg: &KazkyConfig) -> Result<()> {
    let opts = FetchOptions {
        connect_timeout: cfg.connect_timeout(),
        cancel: None,
    };
    let m = manifest::fetch_manifest(&cfg.base_url, opts).await?;
    if m.is_empty() {
        println!("Manifest is empty.");
        return Ok(());
    }
    println!("{:<6} {:<40} {}", "ID", "NAME", "NARRATOR");
    for (key, tale) in m.entries() {
        println!("{:<6} {:<40} {}", key, tale.name, tale.auth);
    }
    Ok(())
}
