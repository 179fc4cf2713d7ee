//! Filesystem side of a rescan: find audio files and turn them into songs.

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::error::{Error, Result, ResultExt};
use crate::metadata::{self, EMBEDDED_ART};
use crate::model::{Directory, Song};

/// Scans the given root directory recursively for audio files.
///
/// Only files whose extension is listed in `config` (case-insensitive) are
/// yielded. Returns a Stream of PathBufs.
pub fn scan(root: PathBuf, config: &LibraryConfig) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);
    let config = config.clone();

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && config.is_audio_file(entry.path()) {
                // If the receiver is dropped, blocking_send errors and we stop scanning.
                if tx.blocking_send(entry.into_path()).is_err() {
                    break;
                }
            }
        }
    });

    // Convert the mpsc Receiver into a Stream
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

/// Build the song a rescan would store for `path` inside `directory`.
///
/// Filesystem facts are required; a file whose tags cannot be read still
/// yields a song, with empty metadata.
pub fn song_candidate(directory: &Directory, path: &Path) -> Result<Song> {
    let filename = path
        .strip_prefix(&directory.path)
        .ok()
        .and_then(|rel| rel.to_str())
        .ok_or_else(|| {
            Error::scan(format!(
                "{} is not a UTF-8 path inside {}",
                path.display(),
                directory.path
            ))
        })?;

    let stat = std::fs::metadata(path).with_context(format!("reading {}", path.display()))?;

    let mut song = Song {
        directory_id: Some(directory.id),
        filename: Some(filename.to_string()),
        mtime: Some(epoch_secs(stat.modified()?)),
        ctime: Some(change_time(&stat)?),
        filesize: Some(i64::try_from(stat.len()).unwrap_or(i64::MAX)),
        ..Default::default()
    };

    match metadata::read(path) {
        Ok(tags) => {
            song.title = tags.title;
            song.artist = tags.artist;
            song.album = tags.album;
            song.genre = tags.genre;
            song.track = tags.track.map(i64::from);
            song.year = tags.year.map(i64::from);
            song.length = i64::try_from(tags.length).ok();
            if tags.has_embedded_art {
                song.art_automatic = Some(EMBEDDED_ART.to_string());
            }
        }
        Err(e) => {
            debug!(target: "scanner::rescan", path = %path.display(), error = %e, "Unreadable tags");
        }
    }

    if song.art_automatic.is_none() {
        song.art_automatic =
            metadata::find_sidecar_cover(path).map(|cover| cover.to_string_lossy().into_owned());
    }

    Ok(song)
}

fn epoch_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(unix)]
fn change_time(stat: &std::fs::Metadata) -> Result<i64> {
    use std::os::unix::fs::MetadataExt;
    Ok(stat.ctime())
}

#[cfg(not(unix))]
fn change_time(stat: &std::fs::Metadata) -> Result<i64> {
    // No inode change time here; creation time is the closest stand-in
    Ok(epoch_secs(stat.created().or_else(|_| stat.modified())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::fs::File;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_audio_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        File::create(root.join("song.mp3")).unwrap();
        File::create(root.join("music.flac")).unwrap();
        File::create(root.join("notes.txt")).unwrap();
        File::create(root.join("image.png")).unwrap();
        File::create(root.join("UPPERCASE.OGG")).unwrap(); // case-insensitive

        let subdir = root.join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("track.wav")).unwrap();
        File::create(subdir.join("ignore.doc")).unwrap();

        let paths: Vec<PathBuf> = scan(root.to_path_buf(), &LibraryConfig::default())
            .collect()
            .await;

        let mut file_names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(|s| s.to_string()))
            .collect();
        file_names.sort();

        assert_eq!(
            file_names,
            vec!["UPPERCASE.OGG", "music.flac", "song.mp3", "track.wav"]
        );
    }

    #[tokio::test]
    async fn test_scan_respects_configured_extensions() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.mp3")).unwrap();
        File::create(dir.path().join("b.opus")).unwrap();

        let config = LibraryConfig {
            extensions: vec!["opus".into()],
        };
        let paths: Vec<PathBuf> = scan(dir.path().to_path_buf(), &config).collect().await;

        assert_eq!(paths, vec![dir.path().join("b.opus")]);
    }

    #[test]
    fn test_song_candidate_from_untagged_file() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("Artist");
        std::fs::create_dir(&subdir).unwrap();
        let path = subdir.join("track.mp3");
        std::fs::write(&path, b"not really audio").unwrap();

        let directory = Directory {
            id: 4,
            path: dir.path().to_string_lossy().into_owned(),
        };
        let song = song_candidate(&directory, &path).unwrap();

        assert!(song.is_valid());
        assert_eq!(song.directory_id, Some(4));
        assert_eq!(
            song.filename.as_deref(),
            Some(Path::new("Artist").join("track.mp3").to_str().unwrap())
        );
        assert_eq!(song.filesize, Some(16));
        assert!(song.mtime.unwrap() > 0);
        assert_eq!(song.title, "");
        assert_eq!(song.art_automatic, None);
    }

    #[test]
    fn test_song_candidate_picks_up_sidecar_art() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.flac");
        File::create(&path).unwrap();
        File::create(dir.path().join("cover.jpg")).unwrap();

        let directory = Directory {
            id: 1,
            path: dir.path().to_string_lossy().into_owned(),
        };
        let song = song_candidate(&directory, &path).unwrap();

        assert_eq!(
            song.art_automatic,
            Some(dir.path().join("cover.jpg").to_string_lossy().into_owned())
        );
    }

    #[test]
    fn test_song_candidate_outside_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        File::create(&path).unwrap();

        let directory = Directory {
            id: 1,
            path: "/somewhere/else".into(),
        };
        assert!(matches!(
            song_candidate(&directory, &path),
            Err(Error::Scan(_))
        ));
    }
}
