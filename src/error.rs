//! Library-wide error types.
//!
//! Store operations return [`Error`] via `thiserror`, while the CLI and
//! `main` use `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - Identity errors ([`Error::DuplicatePath`], [`Error::NotFound`]) are
//!   raised before anything is written and must be checked by callers.
//! - Storage failures ([`Error::Database`]) abort the whole transaction and
//!   propagate unchanged.
//! - Songs missing required fields are *not* errors; the mutation engine
//!   skips them.
//!
//! # Example
//!
//! ```ignore
//! use music_index::error::{Error, Result};
//!
//! match library.add_directory("/music").await {
//!     Ok(dir) => println!("watching {}", dir.path),
//!     Err(Error::DuplicatePath(path)) => println!("{path} already tracked"),
//!     Err(e) => return Err(e),
//! }
//! ```

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level store error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stored schema is newer than this build understands
    #[error("Incompatible schema: database is version {found}, newest supported is {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    /// The stored schema is older than this build and no upgrade path exists
    #[error("No schema upgrade step from version {from}")]
    MissingUpgrade { from: i64 },

    /// A directory with this path is already registered
    #[error("Directory already registered: {0}")]
    DuplicatePath(String),

    /// No directory with this id exists
    #[error("Directory not found: {0}")]
    NotFound(i64),

    /// Underlying storage failure; the transaction was rolled back
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scanning a directory failed
    #[error("Scan error: {0}")]
    Scan(String),


    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a scan error.
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is a uniqueness violation reported by SQLite.
    pub(crate) fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            Self::WithContext { source, .. } => source.is_unique_violation(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
