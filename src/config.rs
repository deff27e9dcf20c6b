//! Configuration loading for the doer runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::inbox::DEFAULT_INBOX_CAPACITY;
use crate::core::scheduler::DEFAULT_MAX_AGENTS;
use crate::error::{Error, Result};

/// Agents registered at startup; a spawn needs room beyond these.
const SEED_AGENTS: usize = 2;

/// Get the doer home directory (~/.doer).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".doer"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.doer/settings.json, or defaults when the file is absent.
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    load_settings_from(&path)
}

/// Load and validate settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.inbox_capacity == 0 {
        return Err(Error::Config("inbox_capacity must be at least 1".to_string()));
    }
    if settings.max_agents < SEED_AGENTS {
        return Err(Error::Config(format!(
            "max_agents must be at least {} (got {})",
            SEED_AGENTS, settings.max_agents
        )));
    }
    Ok(())
}

/// Runtime settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Slots per agent inbox.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,

    /// Upper bound on registered agents, spawned ones included.
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Overrides the default tracing filter when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_inbox_capacity() -> usize {
    DEFAULT_INBOX_CAPACITY
}

fn default_max_agents() -> usize {
    DEFAULT_MAX_AGENTS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            max_agents: default_max_agents(),
            log_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.inbox_capacity, 16);
        assert_eq!(settings.max_agents, 8);
        assert!(settings.log_filter.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "inbox_capacity": 4 }"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.inbox_capacity, 4);
        assert_eq!(settings.max_agents, DEFAULT_MAX_AGENTS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "inbox_capacity": 0 }"#).unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{ "max_agents": 1 }"#).unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_settings_from(&path), Err(Error::Json(_))));
    }
}
