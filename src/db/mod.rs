//! Storage layer for directory and song persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage:
//! - [`schema`]: table creation and schema version checks
//! - [`directories`] / [`songs`]: row-level operations used inside the
//!   mutation transactions of [`crate::library::Library`]
//! - [`queries`]: read-only projections over committed state
//!
//! # Example
//!
//! ```ignore
//! use music_index::config::DatabaseConfig;
//! use music_index::db::{self, Location};
//!
//! let pool = db::open(&Location::Memory, &DatabaseConfig::default()).await?;
//! let artists = db::queries::all_artists(&pool).await?;
//! ```

pub mod directories;
pub mod queries;
pub mod schema;
pub mod songs;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Spelling of the ephemeral location, as accepted by [`Location::from_path`].
pub const MEMORY_LOCATION: &str = ":memory:";

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Ephemeral store that disappears with the last handle
    Memory,
    /// SQLite database file, created if missing
    File(PathBuf),
}

impl Location {
    /// Interpret a path, treating [`MEMORY_LOCATION`] as [`Location::Memory`].
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.as_os_str() == MEMORY_LOCATION {
            Self::Memory
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_LOCATION),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Open (or create) the store at `location` and bring its schema up to date.
///
/// A file store gets a pool of up to `max_connections` connections in WAL
/// mode, so every worker can check out its own connection. An in-memory
/// store is pinned to a single connection that never expires, since the
/// database only lives as long as a connection to it does.
///
/// # Errors
///
/// Returns an error if:
/// - The database file cannot be created or opened
/// - The stored schema is newer than [`schema::CURRENT_SCHEMA_VERSION`]
/// - Creating or upgrading tables fails
pub async fn open(location: &Location, config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = match location {
        Location::Memory => {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
                .connect_with(options)
                .await?
        }
        Location::File(path) => {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(config.busy_timeout())
                .foreign_keys(true);
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(options)
                .await?
        }
    };

    schema::ensure(&pool).await?;

    info!(target: "db", location = %location, "Store opened");
    Ok(pool)
}
