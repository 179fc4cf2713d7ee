//! Core data models for the music index.
//!
//! Defines the stored entities [`Directory`] and [`Song`], and the derived
//! [`Album`] projection.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `directories` - Watched root paths with unique paths
//! - `songs` - Individual audio files, keyed naturally by
//!   `(directory_id, filename)`
//!
//! Albums are never stored; they are grouped out of `songs` on every query.

use serde::Serialize;

/// A watched filesystem root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Directory {
    /// Database ID (auto-generated, never reused)
    pub id: i64,
    /// Absolute path (unique)
    pub path: String,
}

/// A track record bound to a [`Directory`].
///
/// Fields the scanner may fail to fill are optional. A song can only be
/// stored once [`Song::is_valid`] holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Song {
    /// Database ID, `None` until the song is stored
    pub id: Option<i64>,
    /// Owning directory
    pub directory_id: Option<i64>,
    /// Path of the file relative to its directory
    pub filename: Option<String>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    /// Track number on album
    pub track: Option<i64>,
    /// Release year
    pub year: Option<i64>,
    /// Duration in seconds
    pub length: Option<i64>,
    /// Modification time (seconds since the Unix epoch)
    pub mtime: Option<i64>,
    /// Change/creation time (seconds since the Unix epoch)
    pub ctime: Option<i64>,
    /// File size in bytes
    pub filesize: Option<i64>,
    /// Art found next to or inside the file
    pub art_automatic: Option<String>,
    /// Art chosen by the user
    pub art_manual: Option<String>,
}

impl Song {
    /// Whether every field required for persistence is set.
    pub fn is_valid(&self) -> bool {
        self.directory_id.is_some()
            && self.filename.is_some()
            && self.mtime.is_some()
            && self.ctime.is_some()
            && self.filesize.is_some()
    }

    /// Natural key used to recognise the same file across scans.
    pub fn natural_key(&self) -> Option<(i64, &str)> {
        Some((self.directory_id?, self.filename.as_deref()?))
    }

    /// Copy of this song carrying the given database ID.
    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Compare everything a rescan can change.
    ///
    /// `id` and the user-chosen `art_manual` are not part of a scan result
    /// and are ignored.
    pub fn same_contents(&self, other: &Song) -> bool {
        self.scanned_fields() == other.scanned_fields()
    }

    /// This scan result, keeping the identity and manual art of `stored`.
    pub fn merged_into(&self, stored: &Song) -> Song {
        Song {
            id: stored.id,
            art_manual: stored.art_manual.clone(),
            ..self.clone()
        }
    }

    fn scanned_fields(&self) -> Song {
        Song {
            id: None,
            art_manual: None,
            ..self.clone()
        }
    }
}

/// An album projection, grouped by `(artist, album)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Album {
    pub artist: String,
    pub album_name: String,
    /// Representative art reference from one of the album's songs
    pub art_automatic: Option<String>,
    pub art_manual: Option<String>,
}
