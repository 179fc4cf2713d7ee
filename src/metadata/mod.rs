//! Audio file tag reading for the scanner.
//!
//! Uses the lofty crate for format-independent metadata access across MP3,
//! FLAC, OGG, M4A, and WAV files. Only reading is supported; the index never
//! writes tags.

use anyhow::{Context, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Art reference stored for songs whose art lives inside the tags.
pub const EMBEDDED_ART: &str = "(embedded)";

/// Common cover art filenames (lowercase for matching)
const COVER_FILENAMES: &[&str] = &["cover", "folder", "album", "front", "artwork", "albumart"];

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Tags read from one audio file. Missing text tags are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub track: Option<u32>,
    pub year: Option<u32>,
    /// Duration in seconds
    pub length: u64,
    /// Whether the tags carry a picture
    pub has_embedded_art: bool,
}

pub fn read(path: &Path) -> Result<SongTags> {
    let tagged_file = Probe::open(path)
        .context("Failed to open file for probing")?
        .read()
        .context("Failed to read file metadata")?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(SongTags {
        title: text(tag.and_then(|t| t.title())),
        artist: text(tag.and_then(|t| t.artist())),
        album: text(tag.and_then(|t| t.album())),
        genre: text(tag.and_then(|t| t.genre())),
        track: tag.and_then(|t| t.track()),
        year: tag.and_then(|t| t.year()),
        length: tagged_file.properties().duration().as_secs(),
        has_embedded_art: tag.is_some_and(|t| !t.pictures().is_empty()),
    })
}

fn text(value: Option<Cow<'_, str>>) -> String {
    value.map(Cow::into_owned).unwrap_or_default()
}

/// Find a sidecar cover art file in the same directory as the audio file.
pub fn find_sidecar_cover(audio_path: &Path) -> Option<PathBuf> {
    let parent = audio_path.parent()?;
    let entries = std::fs::read_dir(parent).ok()?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| path.is_file() && is_cover_file(path))
        .collect();
    // Directory order is arbitrary
    candidates.sort();
    candidates.into_iter().next()
}

fn is_cover_file(path: &Path) -> bool {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    matches!(
        (stem, ext),
        (Some(stem), Some(ext))
            if COVER_FILENAMES.contains(&stem.as_str()) && IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_read_rejects_non_audio_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.mp3");
        std::fs::write(&path, b"definitely not an mp3").unwrap();

        assert!(read(&path).is_err());
    }

    #[test]
    fn test_find_sidecar_cover() {
        let dir = tempdir().unwrap();
        let song = dir.path().join("track.mp3");
        File::create(&song).unwrap();
        assert_eq!(find_sidecar_cover(&song), None);

        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("Folder.JPG")).unwrap();
        assert_eq!(find_sidecar_cover(&song), Some(dir.path().join("Folder.JPG")));
    }

    #[test]
    fn test_is_cover_file() {
        assert!(is_cover_file(Path::new("/m/cover.png")));
        assert!(is_cover_file(Path::new("/m/Front.jpeg")));
        assert!(!is_cover_file(Path::new("/m/back.jpg")));
        assert!(!is_cover_file(Path::new("/m/cover.txt")));
    }
}
