//! Row operations for the `songs` table.
//!
//! Reads are generic over the executor so they work on the pool as well as
//! inside a mutation transaction.

use sqlx::{Executor, Sqlite};

use crate::model::Song;

// ============================================================================
// Database Row Types
// ============================================================================

const SONG_COLUMNS: &str = "id, directory_id, filename, title, artist, album, genre, \
     track, year, length, mtime, ctime, filesize, art_automatic, art_manual";

/// Database row for the songs table.
#[derive(Debug, sqlx::FromRow)]
struct SongRow {
    id: i64,
    directory_id: i64,
    filename: String,
    title: String,
    artist: String,
    album: String,
    genre: String,
    track: Option<i64>,
    year: Option<i64>,
    length: Option<i64>,
    mtime: i64,
    ctime: i64,
    filesize: i64,
    art_automatic: Option<String>,
    art_manual: Option<String>,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            id: Some(row.id),
            directory_id: Some(row.directory_id),
            filename: Some(row.filename),
            title: row.title,
            artist: row.artist,
            album: row.album,
            genre: row.genre,
            track: row.track,
            year: row.year,
            length: row.length,
            mtime: Some(row.mtime),
            ctime: Some(row.ctime),
            filesize: Some(row.filesize),
            art_automatic: row.art_automatic,
            art_manual: row.art_manual,
        }
    }
}

async fn fetch_all<'e, E>(executor: E, filter: &str, binds: &[SqlValue<'_>]) -> sqlx::Result<Vec<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs {filter}");
    let mut query = sqlx::query_as::<_, SongRow>(&sql);
    for value in binds {
        query = match *value {
            SqlValue::Int(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
        };
    }
    let rows = query.fetch_all(executor).await?;
    Ok(rows.into_iter().map(Song::from).collect())
}

enum SqlValue<'a> {
    Int(i64),
    Text(&'a str),
}

// ============================================================================
// Reads
// ============================================================================

pub async fn by_id<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let songs = fetch_all(executor, "WHERE id = ?", &[SqlValue::Int(id)]).await?;
    Ok(songs.into_iter().next())
}

/// Look a song up by its natural key.
pub async fn by_natural_key<'e, E>(
    executor: E,
    directory_id: i64,
    filename: &str,
) -> sqlx::Result<Option<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let songs = fetch_all(
        executor,
        "WHERE directory_id = ? AND filename = ?",
        &[SqlValue::Int(directory_id), SqlValue::Text(filename)],
    )
    .await?;
    Ok(songs.into_iter().next())
}

/// All songs under a directory, ordered by filename.
pub async fn in_directory<'e, E>(executor: E, directory_id: i64) -> sqlx::Result<Vec<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_all(
        executor,
        "WHERE directory_id = ? ORDER BY filename",
        &[SqlValue::Int(directory_id)],
    )
    .await
}

/// All songs of one album, in track order.
pub async fn by_artist_album<'e, E>(executor: E, artist: &str, album: &str) -> sqlx::Result<Vec<Song>>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_all(
        executor,
        "WHERE artist = ? AND album = ? ORDER BY track, filename",
        &[SqlValue::Text(artist), SqlValue::Text(album)],
    )
    .await
}

// ============================================================================
// Writes
// ============================================================================

/// Insert a valid song and return its assigned ID.
pub async fn insert<'e, E>(executor: E, song: &Song) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO songs (
            directory_id, filename, title, artist, album, genre,
            track, year, length, mtime, ctime, filesize,
            art_automatic, art_manual
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(song.directory_id)
    .bind(&song.filename)
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(&song.genre)
    .bind(song.track)
    .bind(song.year)
    .bind(song.length)
    .bind(song.mtime)
    .bind(song.ctime)
    .bind(song.filesize)
    .bind(&song.art_automatic)
    .bind(&song.art_manual)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

/// Overwrite every column of the row `id` with `song`, keeping the ID.
pub async fn update<'e, E>(executor: E, id: i64, song: &Song) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE songs SET
            directory_id = ?, filename = ?, title = ?, artist = ?, album = ?,
            genre = ?, track = ?, year = ?, length = ?, mtime = ?, ctime = ?,
            filesize = ?, art_automatic = ?, art_manual = ?
        WHERE id = ?
        "#,
    )
    .bind(song.directory_id)
    .bind(&song.filename)
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(&song.genre)
    .bind(song.track)
    .bind(song.year)
    .bind(song.length)
    .bind(song.mtime)
    .bind(song.ctime)
    .bind(song.filesize)
    .bind(&song.art_automatic)
    .bind(&song.art_manual)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Set manual art on every song of an album.
///
/// Returns the number of rows touched.
pub async fn set_art_manual<'e, E>(
    executor: E,
    artist: &str,
    album: &str,
    art: Option<&str>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE songs SET art_manual = ? WHERE artist = ? AND album = ?")
        .bind(art)
        .bind(artist)
        .bind(album)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Returns true if a row was deleted.
pub async fn delete<'e, E>(executor: E, id: i64) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every song under a directory, returning how many went.
pub async fn delete_in_directory<'e, E>(executor: E, directory_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM songs WHERE directory_id = ?")
        .bind(directory_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
