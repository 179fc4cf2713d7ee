//! Music Index - a local media-library index.
//!
//! Keeps watched directories and the songs found in them in SQLite,
//! reconciles rescans against what is stored, answers browse queries, and
//! notifies subscribers of every change.
//!
//! # Example
//!
//! ```ignore
//! use music_index::config::DatabaseConfig;
//! use music_index::db::Location;
//! use music_index::library::Library;
//!
//! let library = Library::open(&Location::Memory, &DatabaseConfig::default()).await?;
//! library.notifier().on_songs_discovered(|songs| println!("{} new", songs.len()));
//! let dir = library.add_directory("/music").await?;
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod library;
pub mod metadata;
pub mod model;
pub mod scanner;
#[cfg(test)]
pub(crate) mod test_utils;
