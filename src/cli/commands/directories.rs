//! Watched directory management and rescan commands.

use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::warn;

use super::{directory_key, open_library, print_json};
use crate::config::Config;
use crate::error::Error;
use crate::library::rescan_directory;

/// Start watching a directory
pub fn cmd_add_dir(rt: &Runtime, config: &Config, path: &Path) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let key = directory_key(path);
        match library.add_directory(&key).await {
            Ok(dir) => println!("Added directory #{}: {}", dir.id, dir.path),
            Err(Error::DuplicatePath(p)) => println!("Already watching {p}"),
            Err(e) => return Err(e.into()),
        }
        library.close().await;
        Ok(())
    })
}

/// Stop watching a directory
pub fn cmd_remove_dir(rt: &Runtime, config: &Config, path: &Path) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let key = directory_key(path);
        let Some(dir) = library.find_directory(&key).await? else {
            anyhow::bail!("Not watching {key}");
        };

        let songs = library.find_songs_in_directory(dir.id).await?.len();
        library.remove_directory(&dir).await?;
        println!("Removed {} ({} songs)", dir.path, songs);
        library.close().await;
        Ok(())
    })
}

/// List watched directories
pub fn cmd_dirs(rt: &Runtime, config: &Config, json: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let dirs = library.get_all_directories().await?;
        if json {
            print_json(&dirs)?;
        } else if dirs.is_empty() {
            println!("No watched directories. Add one with `music-index add-dir <PATH>`.");
        } else {
            for dir in dirs {
                println!("{:>4}  {}", dir.id, dir.path);
            }
        }
        library.close().await;
        Ok(())
    })
}

/// Rescan one watched directory, or all of them
pub fn cmd_scan(rt: &Runtime, config: &Config, path: Option<&PathBuf>) -> anyhow::Result<()> {
    rt.block_on(async {
        let library = open_library(config).await?;
        let targets = match path {
            Some(path) => {
                let key = directory_key(path);
                match library.find_directory(&key).await? {
                    Some(dir) => vec![dir],
                    None => anyhow::bail!("Not watching {key}; add it with `add-dir` first"),
                }
            }
            None => library.get_all_directories().await?,
        };

        let mut failures = 0;
        for dir in &targets {
            println!("Scanning {}", dir.path);
            match rescan_directory(&library, dir, &config.library).await {
                Ok(summary) => println!(
                    "  {} files, {} new or changed, {} removed, {} unreadable",
                    summary.scanned, summary.discovered, summary.deleted, summary.failed
                ),
                Err(e) => {
                    warn!(target: "scanner::rescan", path = %dir.path, error = %e, "Rescan failed");
                    eprintln!("  Error: {e}");
                    failures += 1;
                }
            }
        }

        println!(
            "Scan complete. {} songs in {} directories.",
            library.count_songs().await?,
            targets.len()
        );
        library.close().await;

        if failures > 0 {
            anyhow::bail!("{failures} of {} directories failed to scan", targets.len());
        }
        Ok(())
    })
}
