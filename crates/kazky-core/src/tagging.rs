//! ID3 tagging for downloaded songs.
//!
//! Updates the tag in place: title, artist and an embedded front cover.
//! Frames not touched here are preserved.

use anyhow::{Context, Result};
use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use std::path::{Path, PathBuf};

/// Metadata written into a tale's MP3.
#[derive(Debug, Clone)]
pub struct TaleTags {
    pub title: String,
    pub artist: String,
    /// JPEG bytes for the front cover.
    pub cover_jpeg: Vec<u8>,
}

/// Write `tags` into the ID3v2.4 tag of the file at `path`.
pub fn write_tale_tags(path: &Path, tags: &TaleTags) -> Result<()> {
    let mut tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Tag::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("read ID3 tag: {}", path.display()));
        }
    };

    tag.set_title(tags.title.as_str());
    tag.set_artist(tags.artist.as_str());
    tag.remove_picture_by_type(PictureType::CoverFront);
    tag.add_frame(Picture {
        mime_type: "image/jpeg".to_string(),
        picture_type: PictureType::CoverFront,
        description: String::new(),
        data: tags.cover_jpeg.clone(),
    });

    tag.write_to_path(path, Version::Id3v24)
        .with_context(|| format!("write ID3 tag: {}", path.display()))?;
    tracing::debug!(path = %path.display(), title = %tags.title, "tagged");
    Ok(())
}

/// [`write_tale_tags`] on the blocking pool.
pub async fn write_tale_tags_async(path: PathBuf, tags: TaleTags) -> Result<()> {
    tokio::task::spawn_blocking(move || write_tale_tags(&path, &tags))
        .await
        .context("tag task join")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_tags() -> TaleTags {
        TaleTags {
            title: "ЗАЄЦЬ ХВАЛЬКО".to_string(),
            artist: "АНДРІЙ ХЛИВНЮК".to_string(),
            cover_jpeg: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 0xFF, 0xD9],
        }
    }

    #[test]
    fn writes_title_artist_and_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tale.mp3");
        let audio = vec![0u8; 256];
        fs::write(&path, &audio).unwrap();

        write_tale_tags(&path, &sample_tags()).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("ЗАЄЦЬ ХВАЛЬКО"));
        assert_eq!(tag.artist(), Some("АНДРІЙ ХЛИВНЮК"));
        let pictures: Vec<&Picture> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
        assert_eq!(pictures[0].data, sample_tags().cover_jpeg);

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.ends_with(&audio));
    }

    #[test]
    fn retagging_replaces_cover_and_keeps_other_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tale.mp3");
        fs::write(&path, vec![0u8; 64]).unwrap();

        let mut existing = Tag::new();
        existing.set_album("Казки");
        existing.write_to_path(&path, Version::Id3v24).unwrap();

        write_tale_tags(&path, &sample_tags()).unwrap();
        let mut second = sample_tags();
        second.title = "Інша".to_string();
        second.cover_jpeg = vec![0xFF, 0xD8, 9, 0xFF, 0xD9];
        write_tale_tags(&path, &second).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Інша"));
        assert_eq!(tag.album(), Some("Казки"));
        let pictures: Vec<&Picture> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].data, second.cover_jpeg);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_tale_tags(&dir.path().join("absent.mp3"), &sample_tags()).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.mp3"));
    }
}
