//! Configuration management for Brainstormer.
//!
//! Handles loading configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Local config file name, looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".brainstormer.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion service settings
    pub ai: AiConfig,

    /// Project file settings
    pub project: ProjectConfig,

    /// Session settings
    pub session: SessionConfig,
}

/// Completion service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Model to use
    pub model: String,

    /// API base URL (OpenAI or a compatible endpoint)
    pub base_url: String,

    /// Models offered when choosing interactively
    pub models: Vec<String>,
}

/// Project file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory saved projects go to (defaults to the data directory)
    pub directory: Option<PathBuf>,

    /// File name used when saving without an explicit path
    pub file_name: String,

    /// File name used when exporting the plan alone
    pub plan_file_name: String,
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of history entries kept in memory
    pub max_history: usize,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.brainstormer.toml` in current directory
    /// 2. `~/.config/brainstormer/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(global_config) = Self::global_config_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Path of the config file `load` would read, if any exists.
    pub fn active_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }
        Self::global_config_path().filter(|p| p.exists())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("brainstormer"))
    }

    /// Get the global config file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the data directory path (for saved projects).
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("brainstormer"))
    }

    /// Directory saved projects go to.
    pub fn project_dir(&self) -> PathBuf {
        self.project
            .directory
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("projects")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Default path for a saved project.
    pub fn default_project_path(&self) -> PathBuf {
        self.project_dir().join(&self.project.file_name)
    }

    /// Default path for an exported plan.
    pub fn default_plan_path(&self) -> PathBuf {
        self.project_dir().join(&self.project.plan_file_name)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: vec!["gpt-4o".to_string(), "gpt-4-turbo".to_string(), "gpt-3.5-turbo".to_string()],
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: "projet.json".to_string(),
            plan_file_name: "plan.json".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_history: crate::core::history::DEFAULT_MAX_ENTRIES }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.ai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.ai.models.len(), 3);
        assert_eq!(config.project.file_name, "projet.json");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ai]
            model = "gpt-4-turbo"
            "#,
        )
        .unwrap();

        assert_eq!(config.ai.model, "gpt-4-turbo");
        assert_eq!(config.ai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.session.max_history, 500);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[project]\ndirectory = \"/tmp/gps\"\nfile_name = \"idee.json\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.default_project_path(), PathBuf::from("/tmp/gps/idee.json"));
        assert_eq!(config.default_plan_path(), PathBuf::from("/tmp/gps/plan.json"));
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ai\nmodel = 1").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
