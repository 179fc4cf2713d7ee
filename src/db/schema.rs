//! Table creation and schema version checks.
//!
//! The `schema_version` table holds a single row. A store is brought up to
//! [`CURRENT_SCHEMA_VERSION`] on every open by applying the upgrade steps in
//! order; a store written by a newer build is refused.

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Executor, Sqlite};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const CREATE_SCHEMA_VERSION: &str =
    "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)";

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS directories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS songs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        directory_id INTEGER NOT NULL REFERENCES directories(id),
        filename TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        artist TEXT NOT NULL DEFAULT '',
        album TEXT NOT NULL DEFAULT '',
        genre TEXT NOT NULL DEFAULT '',
        track INTEGER,
        year INTEGER,
        length INTEGER,
        mtime INTEGER NOT NULL,
        ctime INTEGER NOT NULL,
        filesize INTEGER NOT NULL,
        art_automatic TEXT,
        art_manual TEXT,
        UNIQUE (directory_id, filename)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_songs_artist_album ON songs(artist, album)",
    "CREATE INDEX IF NOT EXISTS idx_songs_directory_id ON songs(directory_id)",
];

/// A column an upgrade step adds to an existing table.
struct AddColumn {
    table: &'static str,
    column: &'static str,
    definition: &'static str,
}

/// `UPGRADES[n]` takes a store from version `n + 1` to `n + 2`.
const UPGRADES: &[&[AddColumn]] = &[
    // 1 -> 2: album art references
    &[
        AddColumn {
            table: "songs",
            column: "art_automatic",
            definition: "TEXT",
        },
        AddColumn {
            table: "songs",
            column: "art_manual",
            definition: "TEXT",
        },
    ],
];

/// Create missing tables and check or upgrade the stored schema version.
///
/// Runs in one transaction; nothing is written if the version check fails.
/// Upgrades run before missing tables are created, so a table created here
/// always has the current layout.
pub async fn ensure(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(CREATE_SCHEMA_VERSION).execute(&mut *tx).await?;
    let stored = stored_version(&mut *tx).await?;

    match stored {
        Some(found) if found > CURRENT_SCHEMA_VERSION => {
            return Err(Error::IncompatibleSchema {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        Some(found) if found < CURRENT_SCHEMA_VERSION => {
            upgrade(&mut *tx, found, UPGRADES).await?;
        }
        _ => {}
    }

    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    if stored.is_none() {
        debug!(target: "db::schema", version = CURRENT_SCHEMA_VERSION, "Initialising schema version");
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(CURRENT_SCHEMA_VERSION)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn upgrade(conn: &mut SqliteConnection, from: i64, steps: &[&[AddColumn]]) -> Result<()> {
    let mut version = from.max(1);
    while version < CURRENT_SCHEMA_VERSION {
        let step = usize::try_from(version - 1)
            .ok()
            .and_then(|i| steps.get(i))
            .ok_or(Error::MissingUpgrade { from: version })?;
        for change in *step {
            add_column(&mut *conn, change).await?;
        }
        version += 1;
        info!(target: "db::schema", version, "Upgraded schema");
    }

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(CURRENT_SCHEMA_VERSION)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn add_column(conn: &mut SqliteConnection, change: &AddColumn) -> Result<()> {
    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(change.table)
        .fetch_all(&mut *conn)
        .await?;

    // An absent table is created later in the current layout
    if columns.is_empty() || columns.iter().any(|c| c == change.column) {
        debug!(target: "db::schema", table = change.table, column = change.column, "Column already in place");
        return Ok(());
    }

    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        change.table, change.column, change.definition
    );
    sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(())
}

/// Version recorded in `schema_version`, if any.
pub async fn stored_version<'e, E>(executor: E) -> sqlx::Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
        .fetch_optional(executor)
        .await
}

/// Names of all user tables.
pub async fn table_names<'e, E>(executor: E) -> sqlx::Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(executor)
    .await
}
