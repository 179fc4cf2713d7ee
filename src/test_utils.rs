//! Test utilities and fixtures for music-index tests.
//!
//! This module provides store fixtures, song factories, and a notification
//! spy to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{Spy, dummy_song, memory_library};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let library = memory_library().await;
//!     let spy = Spy::songs_discovered(&library);
//!     // ... test logic
//!     assert_eq!(spy.calls().len(), 1);
//! }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::config::DatabaseConfig;
use crate::db::Location;
use crate::library::Library;
use crate::model::{Directory, Song};

/// Opens an ephemeral in-memory library.
pub async fn memory_library() -> Library {
    Library::open(&Location::Memory, &DatabaseConfig::default())
        .await
        .expect("Failed to open in-memory library")
}

/// Opens a library backed by a file in a temporary directory.
///
/// Keep the `TempDir` alive for the duration of your test; the database is
/// deleted when it goes out of scope.
pub async fn temp_library() -> (Library, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let location = Location::File(dir.path().join("test.db"));

    let library = Library::open(&location, &DatabaseConfig::default())
        .await
        .expect("Failed to open test library");

    (library, dir)
}

/// A valid song in `directory_id` with every required field set.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let song = Song {
///     title: "Title".into(),
///     ..dummy_song(1)
/// };
/// ```
pub fn dummy_song(directory_id: i64) -> Song {
    Song {
        directory_id: Some(directory_id),
        filename: Some("foo.mp3".to_string()),
        mtime: Some(0),
        ctime: Some(0),
        filesize: Some(0),
        ..Default::default()
    }
}

/// Records every delivery of one notification kind.
pub struct Spy<T> {
    calls: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T: Clone + Send + 'static> Spy<T> {
    fn new() -> (Self, Arc<Mutex<Vec<Vec<T>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }

    /// One entry per delivery, in order.
    pub fn calls(&self) -> Vec<Vec<T>> {
        self.calls.lock().clone()
    }
}

impl Spy<Directory> {
    pub fn directories_discovered(library: &Library) -> Self {
        let (spy, calls) = Self::new();
        library
            .notifier()
            .on_directories_discovered(move |dirs| calls.lock().push(dirs.to_vec()));
        spy
    }

    pub fn directories_deleted(library: &Library) -> Self {
        let (spy, calls) = Self::new();
        library
            .notifier()
            .on_directories_deleted(move |dirs| calls.lock().push(dirs.to_vec()));
        spy
    }
}

impl Spy<Song> {
    pub fn songs_discovered(library: &Library) -> Self {
        let (spy, calls) = Self::new();
        library
            .notifier()
            .on_songs_discovered(move |songs| calls.lock().push(songs.to_vec()));
        spy
    }

    pub fn songs_deleted(library: &Library) -> Self {
        let (spy, calls) = Self::new();
        library
            .notifier()
            .on_songs_deleted(move |songs| calls.lock().push(songs.to_vec()));
        spy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_library_creates_working_database() {
        let (library, dir) = temp_library().await;
        assert!(dir.path().join("test.db").exists());
        assert_eq!(library.count_songs().await.unwrap(), 0);
    }

    #[test]
    fn test_dummy_song_is_valid() {
        let song = dummy_song(3);
        assert!(song.is_valid());
        assert_eq!(song.directory_id, Some(3));
        assert_eq!(song.id, None);
    }

    #[tokio::test]
    async fn test_spy_records_each_delivery() {
        let library = memory_library().await;
        let spy = Spy::directories_discovered(&library);

        library.add_directory("/one").await.unwrap();
        library.add_directory("/two").await.unwrap();

        let calls = spy.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][0].path, "/two");
    }
}
