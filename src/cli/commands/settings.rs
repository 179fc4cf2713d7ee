//! Configuration file command.

use crate::config::{self, Config};

/// Print the effective configuration, optionally writing it to the config file
pub fn cmd_config(config: &Config, write: bool) -> anyhow::Result<()> {
    print!("{}", render(config)?);

    if write {
        config::save(config)?;
        if let Some(path) = config::config_path() {
            println!("# Written to {}", path.display());
        }
    }
    Ok(())
}

fn render(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rendered_config_reloads() {
        let mut config = Config::default();
        config.database.path = Some(PathBuf::from("/data/index.db"));
        config.library.extensions = vec!["opus".into()];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, render(&config).unwrap()).unwrap();

        let loaded = config::load_from(&path);
        assert_eq!(loaded.database.path, Some(PathBuf::from("/data/index.db")));
        assert_eq!(loaded.library.extensions, vec!["opus".to_string()]);
    }
}
