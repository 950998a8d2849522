//! The tale manifest: `<base_url>/index.json`.
//!
//! A JSON object mapping entry id to an entry:
//!
//! ```json
//! { "1": { "name": "ЗАЄЦЬ ХВАЛЬКО", "auth": "…", "image": "tales/img/01-min.jpg",
//!          "song": "tales/songs/01.mp3", "url": "1", "id": "1" } }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::{self, FetchOptions};

/// Manifest location relative to the site root.
pub const MANIFEST_PATH: &str = "index.json";

/// One tale as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaleEntry {
    /// Title; also used as the local file stem.
    pub name: String,
    /// Attribution (narrator), written as the artist tag.
    pub auth: String,
    /// Cover image path relative to the site root.
    pub image: String,
    /// Song path relative to the site root.
    pub song: String,
    /// Sequence token used by the site's own routing.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub id: String,
}

/// Parsed manifest, in iteration order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<(String, TaleEntry)>,
}

impl Manifest {
    /// Parse manifest JSON.
    ///
    /// Entries are ordered like a JS object's keys: integer keys ascending
    /// numerically first, then the remaining keys in document order.
    pub fn parse(json: &[u8]) -> Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(json).context("manifest is not a JSON object")?;

        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            let entry: TaleEntry = serde_json::from_value(value)
                .with_context(|| format!("manifest entry {:?}", key))?;
            entries.push((key, entry));
        }
        // Stable: non-integer keys keep document order.
        entries.sort_by_key(|(key, _)| match array_index(key) {
            Some(n) => (0u8, n),
            None => (1u8, 0),
        });
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, TaleEntry)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, TaleEntry)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical unsigned integer key ("0", "17"; not "01" or "+1").
fn array_index(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    if n.to_string() == key && n < u32::MAX {
        Some(n)
    } else {
        None
    }
}

/// Fetch and parse `<base_url>/index.json`.
pub async fn fetch_manifest(base_url: &str, opts: FetchOptions) -> Result<Manifest> {
    let url = fetch::join_url(base_url, MANIFEST_PATH)?;
    tracing::info!(url = %url, "fetching manifest");
    let body = fetch::fetch_bytes_async(url.to_string(), opts).await?;
    let manifest = Manifest::parse(&body).with_context(|| format!("parse {}", url))?;
    tracing::info!("manifest lists {} tale(s)", manifest.len());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_json(name: &str) -> String {
        format!(
            r#"{{"name":"{0}","auth":"A","image":"img/{0}.jpg","song":"songs/{0}.mp3","url":"u","id":"i"}}"#,
            name
        )
    }

    #[test]
    fn parses_entry_fields() {
        let json = r#"{
            "1": {
                "name": "ЗАЄЦЬ ХВАЛЬКО",
                "auth": "АНДРІЙ ХЛИВНЮК",
                "image": "tales/img/01-min.jpg",
                "song": "tales/songs/01.mp3",
                "url": "1",
                "id": "1"
            }
        }"#;
        let m = Manifest::parse(json.as_bytes()).unwrap();
        assert_eq!(m.len(), 1);
        let (key, e) = &m.entries()[0];
        assert_eq!(key, "1");
        assert_eq!(e.name, "ЗАЄЦЬ ХВАЛЬКО");
        assert_eq!(e.auth, "АНДРІЙ ХЛИВНЮК");
        assert_eq!(e.image, "tales/img/01-min.jpg");
        assert_eq!(e.song, "tales/songs/01.mp3");
    }

    #[test]
    fn integer_keys_sort_numerically_before_others() {
        let json = format!(
            r#"{{"b":{},"10":{},"2":{},"a":{},"01":{}}}"#,
            entry_json("b"),
            entry_json("ten"),
            entry_json("two"),
            entry_json("a"),
            entry_json("zero-one")
        );
        let m = Manifest::parse(json.as_bytes()).unwrap();
        let keys: Vec<&str> = m.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["2", "10", "b", "a", "01"]);
    }

    #[test]
    fn optional_tokens_default_to_empty() {
        let json = r#"{"1":{"name":"n","auth":"a","image":"i.jpg","song":"s.mp3"}}"#;
        let m = Manifest::parse(json.as_bytes()).unwrap();
        assert_eq!(m.entries()[0].1.url, "");
        assert_eq!(m.entries()[0].1.id, "");
    }

    #[test]
    fn rejects_non_object_and_bad_entries() {
        assert!(Manifest::parse(b"[]").is_err());
        assert!(Manifest::parse(b"not json").is_err());
        let err = Manifest::parse(br#"{"1":{"name":"n"}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("\"1\""));
    }

    #[test]
    fn empty_object_is_empty_manifest() {
        let m = Manifest::parse(b"{}").unwrap();
        assert!(m.is_empty());
    }
}
