//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `directories`: watched directory management and rescans
//! - `browse`: read-only listing of artists, albums, and songs
//! - `settings`: the configuration file

mod browse;
mod directories;
mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db::Location;
use crate::library::Library;

pub use browse::{cmd_albums, cmd_artists, cmd_song, cmd_songs};
pub use directories::{cmd_add_dir, cmd_dirs, cmd_remove_dir, cmd_scan};
pub use settings::cmd_config;

/// Music Index CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file (`:memory:` for a throwaway store)
    #[arg(long, global = true, env = "MUSIC_INDEX_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Start watching a directory
    AddDir {
        /// Directory to add
        path: PathBuf,
    },
    /// Stop watching a directory and forget its songs
    RemoveDir {
        /// Directory to remove, as it was added
        path: PathBuf,
    },
    /// List watched directories
    Dirs {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Rescan watched directories
    Scan {
        /// Only rescan this directory
        path: Option<PathBuf>,
    },
    /// List all artists
    Artists {
        #[arg(long)]
        json: bool,
    },
    /// List albums
    Albums {
        /// Only albums by this artist
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List the songs of one album
    Songs {
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: String,
        #[arg(long)]
        json: bool,
    },
    /// Show one song
    Song {
        /// Song ID
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Save it as the config file
        #[arg(long)]
        write: bool,
    },
}

/// Run the parsed CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let mut config = config::load();
    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }

    match &cli.command {
        Commands::AddDir { path } => cmd_add_dir(&rt, &config, path),
        Commands::RemoveDir { path } => cmd_remove_dir(&rt, &config, path),
        Commands::Dirs { json } => cmd_dirs(&rt, &config, *json),
        Commands::Scan { path } => cmd_scan(&rt, &config, path.as_ref()),
        Commands::Artists { json } => cmd_artists(&rt, &config, *json),
        Commands::Albums { artist, json } => cmd_albums(&rt, &config, artist.as_deref(), *json),
        Commands::Songs {
            artist,
            album,
            json,
        } => cmd_songs(&rt, &config, artist, album, *json),
        Commands::Song { id, json } => cmd_song(&rt, &config, *id, *json),
        Commands::Config { write } => cmd_config(&config, *write),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open the configured library, creating the database directory if needed.
pub(crate) async fn open_library(config: &Config) -> anyhow::Result<Library> {
    let location = Location::from_path(config.database.resolved_path());
    if let Location::File(path) = &location
        && let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Library::open(&location, &config.database)
        .await
        .with_context(|| format!("Failed to open library at {location}"))
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Canonical string form of a directory argument.
pub(crate) fn directory_key(path: &std::path::Path) -> String {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    path.to_string_lossy().into_owned()
}
