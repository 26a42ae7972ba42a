//! Configuration file support for the ballot tree tooling.
//!
//! This module provides configuration file loading from TOML format,
//! allowing for easier deployment and configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_ELECTION_ID: &str = "EID-2025-09";
const DEFAULT_MAX_ALLOWLIST_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for the ballot tree tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub election: ElectionConfig,
    #[serde(default)]
    pub allowlist: AllowlistConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(default = "default_election_id")]
    pub id: String,
    #[serde(default = "default_depth")]
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistConfig {
    #[serde(default = "default_allowlist_file")]
    pub file: PathBuf,
    #[serde(default = "default_max_allowlist_file_size")]
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_tree_file")]
    pub tree_file: PathBuf,
    #[serde(default = "default_paths_dir")]
    pub paths_dir: PathBuf,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_ELECTION_ID.to_string(),
            depth: crate::TREE_DEPTH,
        }
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("allowlist.csv"),
            max_file_size: DEFAULT_MAX_ALLOWLIST_FILE_SIZE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tree_file: PathBuf::from("tree.json"),
            paths_dir: PathBuf::from("paths"),
        }
    }
}

fn default_election_id() -> String {
    DEFAULT_ELECTION_ID.to_string()
}

fn default_depth() -> usize {
    crate::TREE_DEPTH
}

fn default_allowlist_file() -> PathBuf {
    PathBuf::from("allowlist.csv")
}

fn default_max_allowlist_file_size() -> u64 {
    DEFAULT_MAX_ALLOWLIST_FILE_SIZE
}

fn default_tree_file() -> PathBuf {
    PathBuf::from("tree.json")
}

fn default_paths_dir() -> PathBuf {
    PathBuf::from("paths")
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.election.id, DEFAULT_ELECTION_ID);
        assert_eq!(config.election.depth, crate::TREE_DEPTH);
        assert_eq!(
            config.allowlist.max_file_size,
            DEFAULT_MAX_ALLOWLIST_FILE_SIZE
        );
        assert_eq!(config.output.tree_file, PathBuf::from("tree.json"));
    }

    #[test]
    fn test_serialize_deserialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.election.id, deserialized.election.id);
        assert_eq!(config.election.depth, deserialized.election.depth);
        assert_eq!(config.output.paths_dir, deserialized.output.paths_dir);
    }

    #[test]
    fn test_custom_config() {
        let config_toml = r#"
            [election]
            id = "EID-2026-03"
            depth = 8

            [allowlist]
            file = "voters.csv"

            [output]
            paths_dir = "out/paths"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.election.id, "EID-2026-03");
        assert_eq!(config.election.depth, 8);
        assert_eq!(config.allowlist.file, PathBuf::from("voters.csv"));
        assert_eq!(config.output.paths_dir, PathBuf::from("out/paths"));
        assert_eq!(
            config.allowlist.max_file_size,
            DEFAULT_MAX_ALLOWLIST_FILE_SIZE
        );
    }
}
