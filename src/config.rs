use anyhow::{Context, Result, bail};
use colored::*;
use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub prompt: String,
    pub color: bool,
    // First line of `help`.
    pub title: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: " > ".to_string(),
            color: true,
            title: "LSH".to_string(),
        }
    }
}

/// Loads the shell configuration.
///
/// An explicit path (from `--config` or `LSH_CONFIG`) must exist. Otherwise `~/.lsh.toml` is
/// used when present, and the defaults when it is not.
pub fn load_config(explicit: Option<&Path>) -> Result<ShellConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os("LSH_CONFIG").map(PathBuf::from));

    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("❌ Critical: config file {:?} not found.", path);
            }
            path
        }
        None => match env::var_os("HOME").map(|home| PathBuf::from(home).join(".lsh.toml")) {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file, using defaults");
                return Ok(ShellConfig::default());
            }
        },
    };

    let config = read_config(&path)?;
    info!("{} Loaded config from {}", "🌿".green(), path.display());
    Ok(config)
}

fn read_config(path: &Path) -> Result<ShellConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, " > ");
        assert!(config.color);
        assert_eq!(config.title, "LSH");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lsh.toml");
        fs::write(&path, "prompt = \"$ \"\ncolor = false\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.prompt, "$ ");
        assert!(!config.color);
        assert_eq!(config.title, "LSH");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lsh.toml");
        fs::write(&path, "promt = \"$ \"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
