//! Rescan of one watched directory against the store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use super::Library;
use crate::config::LibraryConfig;
use crate::error::{Error, Result};
use crate::model::{Directory, Song};
use crate::scanner;

/// Outcome of [`rescan_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Audio files found on disk
    pub scanned: usize,
    /// Files that could not be turned into a song
    pub failed: usize,
    /// New or changed songs
    pub discovered: usize,
    /// Stored songs whose files are gone
    pub deleted: usize,
}

/// Walk `directory` on disk and bring its stored songs up to date.
///
/// All candidates go through a single [`Library::add_or_update_songs`]
/// batch; stored songs with no file left are then removed with
/// [`Library::delete_songs`].
///
/// # Errors
///
/// [`Error::Scan`] if the directory is not on disk. Nothing is deleted in
/// that case, so an unmounted drive does not empty the library.
pub async fn rescan_directory(
    library: &Library,
    directory: &Directory,
    config: &LibraryConfig,
) -> Result<ScanSummary> {
    let root = PathBuf::from(&directory.path);
    if !root.is_dir() {
        return Err(Error::scan(format!("{} is not a directory", directory.path)));
    }

    let paths: Vec<PathBuf> = scanner::scan(root, config).collect().await;
    let scanned = paths.len();

    let dir = directory.clone();
    let (candidates, failed) = tokio::task::spawn_blocking(move || build_candidates(&dir, &paths))
        .await
        .map_err(|e| Error::scan(format!("candidate task failed: {e}")))?;

    let seen: HashSet<String> = candidates
        .iter()
        .filter_map(|song| song.filename.clone())
        .collect();

    let discovered = library.add_or_update_songs(&candidates).await?;

    let vanished: Vec<Song> = library
        .find_songs_in_directory(directory.id)
        .await?
        .into_iter()
        .filter(|song| {
            song.filename
                .as_ref()
                .is_none_or(|filename| !seen.contains(filename))
        })
        .collect();
    let deleted = library.delete_songs(&vanished).await?;

    let summary = ScanSummary {
        scanned,
        failed,
        discovered: discovered.len(),
        deleted: deleted.len(),
    };
    info!(
        target: "scanner::rescan",
        path = %directory.path,
        scanned = summary.scanned,
        failed = summary.failed,
        discovered = summary.discovered,
        deleted = summary.deleted,
        "Rescan complete"
    );
    Ok(summary)
}

fn build_candidates(directory: &Directory, paths: &[PathBuf]) -> (Vec<Song>, usize) {
    let mut songs = Vec::with_capacity(paths.len());
    let mut failed = 0;
    for path in paths {
        match scanner::song_candidate(directory, Path::new(path)) {
            Ok(song) => songs.push(song),
            Err(e) => {
                warn!(target: "scanner::rescan", path = %path.display(), error = %e, "Skipping file");
                failed += 1;
            }
        }
    }
    (songs, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Spy, memory_library};
    use std::fs::File;
    use tempfile::{TempDir, tempdir};

    async fn watched(library: &Library) -> (Directory, TempDir) {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("one.mp3")).unwrap();
        std::fs::create_dir(dir.path().join("disc2")).unwrap();
        File::create(dir.path().join("disc2").join("two.flac")).unwrap();
        File::create(dir.path().join("readme.txt")).unwrap();

        let directory = library
            .add_directory(&dir.path().to_string_lossy())
            .await
            .unwrap();
        (directory, dir)
    }

    #[tokio::test]
    async fn test_first_rescan_discovers_files() {
        let library = memory_library().await;
        let (directory, _dir) = watched(&library).await;
        let spy = Spy::songs_discovered(&library);

        let summary = rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();

        assert_eq!(
            summary,
            ScanSummary {
                scanned: 2,
                failed: 0,
                discovered: 2,
                deleted: 0,
            }
        );
        assert_eq!(spy.calls().len(), 1);
        assert_eq!(library.find_songs_in_directory(directory.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_rescan_is_silent() {
        let library = memory_library().await;
        let (directory, _dir) = watched(&library).await;
        rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();

        let discovered = Spy::songs_discovered(&library);
        let deleted = Spy::songs_deleted(&library);
        let summary = rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.discovered, 0);
        assert_eq!(summary.deleted, 0);
        assert!(discovered.calls().is_empty());
        assert!(deleted.calls().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_files_are_deleted() {
        let library = memory_library().await;
        let (directory, dir) = watched(&library).await;
        rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();
        std::fs::remove_file(dir.path().join("one.mp3")).unwrap();

        let spy = Spy::songs_deleted(&library);
        let summary = rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.deleted, 1);
        let calls = spy.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].filename.as_deref(), Some("one.mp3"));
        assert!(library.find_song(directory.id, "one.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manual_art_survives_rescan() {
        let library = memory_library().await;
        let (directory, _dir) = watched(&library).await;
        rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();
        let touched = library
            .set_album_art_manual("", "", Some("/art.jpg"))
            .await
            .unwrap();
        assert_eq!(touched.len(), 2);

        let spy = Spy::songs_discovered(&library);
        let summary = rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.discovered, 0);
        assert!(spy.calls().is_empty());
        let song = library.find_song(directory.id, "one.mp3").await.unwrap().unwrap();
        assert_eq!(song.art_manual.as_deref(), Some("/art.jpg"));
    }

    #[tokio::test]
    async fn test_missing_root_deletes_nothing() {
        let library = memory_library().await;
        let (directory, dir) = watched(&library).await;
        rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap();
        drop(dir);

        let spy = Spy::songs_deleted(&library);
        let err = rescan_directory(&library, &directory, &LibraryConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Scan(_)));
        assert!(spy.calls().is_empty());
        assert_eq!(library.count_songs().await.unwrap(), 2);
    }
}
