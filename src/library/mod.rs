//! The library store: directory and song mutations plus read queries.
//!
//! [`Library`] ties the storage layer to the change [`Notifier`]. Every
//! mutation runs in one transaction and notifies subscribers only after it
//! commits; queries read committed state straight from the pool.
//!
//! A `Library` is cheap to clone. Each clone is a handle for one worker
//! context (a scanner task, a UI task, ...) and checks out its own pooled
//! connection per operation, all bound to the same location.

pub mod scan;

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::db::{self, Location, directories, queries, songs};
use crate::error::{Error, Result};
use crate::events::Notifier;
use crate::model::{Album, Directory, Song};

pub use scan::{ScanSummary, rescan_directory};

/// Handle to an open library store.
#[derive(Debug, Clone)]
pub struct Library {
    pool: SqlitePool,
    notifier: Arc<Notifier>,
    /// Serializes writers from this process
    write_gate: Arc<Mutex<()>>,
}

impl Library {
    /// Open or create the store at `location`.
    ///
    /// See [`db::open`] for schema handling and errors.
    pub async fn open(location: &Location, config: &DatabaseConfig) -> Result<Self> {
        let pool = db::open(location, config).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap a pool whose schema is already up to date.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            notifier: Arc::new(Notifier::new()),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Subscriber registry shared by all clones of this handle.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. An in-memory store is gone afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================================================================
    // Directories
    // ========================================================================

    /// Register a new watched directory.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicatePath`] if `path` is already registered; nothing is
    /// written and nothing is notified.
    pub async fn add_directory(&self, path: &str) -> Result<Directory> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        if directories::by_path(&mut *tx, path).await?.is_some() {
            return Err(Error::DuplicatePath(path.to_string()));
        }
        let directory = directories::insert(&mut *tx, path)
            .await
            .map_err(Error::from)
            .map_err(|e| {
                if e.is_unique_violation() {
                    Error::DuplicatePath(path.to_string())
                } else {
                    e
                }
            })?;

        tx.commit().await?;

        info!(target: "library::directories", id = directory.id, path = %directory.path, "Directory added");
        self.notifier
            .directories_discovered(std::slice::from_ref(&directory));
        Ok(directory)
    }

    /// Remove a directory and, atomically, every song in it.
    ///
    /// Subscribers get the deleted songs (if any) and then the directory as
    /// it was stored.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no directory has `directory.id`.
    pub async fn remove_directory(&self, directory: &Directory) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let stored = directories::by_id(&mut *tx, directory.id)
            .await?
            .ok_or(Error::NotFound(directory.id))?;

        let deleted_songs = songs::in_directory(&mut *tx, stored.id).await?;
        songs::delete_in_directory(&mut *tx, stored.id).await?;
        directories::delete(&mut *tx, stored.id).await?;

        tx.commit().await?;

        info!(
            target: "library::directories",
            id = stored.id,
            path = %stored.path,
            songs = deleted_songs.len(),
            "Directory removed"
        );
        self.notifier.songs_deleted(&deleted_songs);
        self.notifier.directories_deleted(std::slice::from_ref(&stored));
        Ok(())
    }

    pub async fn get_all_directories(&self) -> Result<Vec<Directory>> {
        Ok(queries::all_directories(&self.pool).await?)
    }

    pub async fn find_directory(&self, path: &str) -> Result<Option<Directory>> {
        Ok(queries::directory_by_path(&self.pool, path).await?)
    }

    // ========================================================================
    // Songs
    // ========================================================================

    /// Reconcile a scan batch against the stored songs.
    ///
    /// Songs missing a required field are skipped. Each remaining song is
    /// matched on `(directory_id, filename)`: unknown songs are inserted,
    /// known songs with different contents are updated in place under their
    /// existing ID, identical songs are left alone. Manual album art is only
    /// taken from the batch for new songs; stored songs keep theirs. The
    /// whole batch commits or fails as one transaction.
    ///
    /// Returns the added and changed songs as stored, in batch order; the
    /// same list is delivered to `songs discovered` subscribers.
    pub async fn add_or_update_songs(&self, batch: &[Song]) -> Result<Vec<Song>> {
        let (valid, invalid): (Vec<&Song>, Vec<&Song>) = batch.iter().partition(|s| s.is_valid());
        if !invalid.is_empty() {
            debug!(target: "library::songs", skipped = invalid.len(), "Skipping songs with missing fields");
        }
        if valid.is_empty() {
            return Ok(Vec::new());
        }

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut discovered = Vec::new();
        let (mut added, mut changed) = (0usize, 0usize);

        for song in valid {
            let Some((directory_id, filename)) = song.natural_key() else {
                continue;
            };
            match songs::by_natural_key(&mut *tx, directory_id, filename).await? {
                None => {
                    let id = songs::insert(&mut *tx, song).await?;
                    discovered.push(song.with_id(id));
                    added += 1;
                }
                Some(existing) if existing.same_contents(song) => {}
                Some(existing) => {
                    let Some(id) = existing.id else { continue };
                    let merged = song.merged_into(&existing);
                    songs::update(&mut *tx, id, &merged).await?;
                    discovered.push(merged);
                    changed += 1;
                }
            }
        }

        tx.commit().await?;

        if !discovered.is_empty() {
            info!(target: "library::songs", added, changed, "Songs discovered");
        }
        self.notifier.songs_discovered(&discovered);
        Ok(discovered)
    }

    /// Delete individual songs by ID.
    ///
    /// Songs without an ID or no longer stored are ignored. Returns the
    /// deleted songs as they were stored.
    pub async fn delete_songs(&self, batch: &[Song]) -> Result<Vec<Song>> {
        let ids: Vec<i64> = batch.iter().filter_map(|s| s.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut deleted = Vec::new();

        for id in ids {
            if let Some(stored) = songs::by_id(&mut *tx, id).await?
                && songs::delete(&mut *tx, id).await?
            {
                deleted.push(stored);
            }
        }

        tx.commit().await?;

        if !deleted.is_empty() {
            info!(target: "library::songs", deleted = deleted.len(), "Songs deleted");
        }
        self.notifier.songs_deleted(&deleted);
        Ok(deleted)
    }

    /// Set (or clear, with `None`) the user-chosen art of an album.
    ///
    /// The touched songs are announced as discovered, since they changed.
    pub async fn set_album_art_manual(
        &self,
        artist: &str,
        album: &str,
        art: Option<&str>,
    ) -> Result<Vec<Song>> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let touched = songs::set_art_manual(&mut *tx, artist, album, art).await?;
        let updated = if touched > 0 {
            songs::by_artist_album(&mut *tx, artist, album).await?
        } else {
            Vec::new()
        };

        tx.commit().await?;

        debug!(target: "library::songs", artist, album, touched, "Manual album art set");
        self.notifier.songs_discovered(&updated);
        Ok(updated)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_all_artists(&self) -> Result<BTreeSet<String>> {
        Ok(queries::all_artists(&self.pool).await?)
    }

    pub async fn get_all_albums(&self) -> Result<Vec<Album>> {
        Ok(queries::all_albums(&self.pool).await?)
    }

    pub async fn get_albums_by_artist(&self, artist: &str) -> Result<Vec<Album>> {
        Ok(queries::albums_by_artist(&self.pool, artist).await?)
    }

    /// The album projection, or `None` if no song has this artist and album.
    pub async fn get_album_art(&self, artist: &str, album: &str) -> Result<Option<Album>> {
        Ok(queries::album_art(&self.pool, artist, album).await?)
    }

    pub async fn get_songs(&self, artist: &str, album: &str) -> Result<Vec<Song>> {
        Ok(queries::songs_by_album(&self.pool, artist, album).await?)
    }

    /// The song with this ID, or `None` if there is none.
    pub async fn get_song_by_id(&self, id: i64) -> Result<Option<Song>> {
        Ok(queries::song_by_id(&self.pool, id).await?)
    }

    pub async fn find_song(&self, directory_id: i64, filename: &str) -> Result<Option<Song>> {
        Ok(queries::song_by_natural_key(&self.pool, directory_id, filename).await?)
    }

    pub async fn find_songs_in_directory(&self, directory_id: i64) -> Result<Vec<Song>> {
        Ok(queries::songs_in_directory(&self.pool, directory_id).await?)
    }

    pub async fn count_songs(&self) -> Result<i64> {
        Ok(queries::count_songs(&self.pool).await?)
    }
}
