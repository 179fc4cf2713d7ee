//! Read-only projections over committed state.
//!
//! None of these open a transaction; each runs as a single statement and
//! therefore sees either all or none of any committed mutation.

use std::collections::BTreeSet;

use sqlx::sqlite::SqlitePool;

use super::{directories, songs};
use crate::model::{Album, Directory, Song};

const ALBUM_PROJECTION: &str = r#"
    SELECT
        artist,
        album AS album_name,
        MAX(art_automatic) AS art_automatic,
        MAX(art_manual) AS art_manual
    FROM songs
"#;

/// Distinct non-empty artist names.
pub async fn all_artists(pool: &SqlitePool) -> sqlx::Result<BTreeSet<String>> {
    let artists: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT artist FROM songs WHERE artist != ''")
            .fetch_all(pool)
            .await?;
    Ok(artists.into_iter().collect())
}

/// Every `(artist, album)` pair with a non-empty album name.
pub async fn all_albums(pool: &SqlitePool) -> sqlx::Result<Vec<Album>> {
    let sql = format!("{ALBUM_PROJECTION} WHERE album != '' GROUP BY artist, album ORDER BY artist, album");
    sqlx::query_as::<_, Album>(&sql).fetch_all(pool).await
}

/// Albums with a non-empty name by one artist.
pub async fn albums_by_artist(pool: &SqlitePool, artist: &str) -> sqlx::Result<Vec<Album>> {
    let sql = format!(
        "{ALBUM_PROJECTION} WHERE album != '' AND artist = ? GROUP BY artist, album ORDER BY album"
    );
    sqlx::query_as::<_, Album>(&sql)
        .bind(artist)
        .fetch_all(pool)
        .await
}

/// The album projection for `(artist, album)`, or `None` if no song matches.
pub async fn album_art(pool: &SqlitePool, artist: &str, album: &str) -> sqlx::Result<Option<Album>> {
    let sql = format!("{ALBUM_PROJECTION} WHERE artist = ? AND album = ? GROUP BY artist, album");
    sqlx::query_as::<_, Album>(&sql)
        .bind(artist)
        .bind(album)
        .fetch_optional(pool)
        .await
}

pub async fn songs_by_album(pool: &SqlitePool, artist: &str, album: &str) -> sqlx::Result<Vec<Song>> {
    songs::by_artist_album(pool, artist, album).await
}

pub async fn song_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Song>> {
    songs::by_id(pool, id).await
}

pub async fn song_by_natural_key(
    pool: &SqlitePool,
    directory_id: i64,
    filename: &str,
) -> sqlx::Result<Option<Song>> {
    songs::by_natural_key(pool, directory_id, filename).await
}

pub async fn songs_in_directory(pool: &SqlitePool, directory_id: i64) -> sqlx::Result<Vec<Song>> {
    songs::in_directory(pool, directory_id).await
}

pub async fn all_directories(pool: &SqlitePool) -> sqlx::Result<Vec<Directory>> {
    directories::all(pool).await
}

pub async fn directory_by_path(pool: &SqlitePool, path: &str) -> sqlx::Result<Option<Directory>> {
    directories::by_path(pool, path).await
}

pub async fn count_songs(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await
}
