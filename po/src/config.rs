//! Promptorch configuration types and loading

use eyre::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
///
/// Every field has a default, so an empty file (or no file at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Knowledge base used when `-k` is not given
    #[serde(rename = "knowledge-base")]
    pub knowledge_base: Option<PathBuf>,

    /// Search paths appended after any `--search-path` flags
    #[serde(rename = "search-paths")]
    pub search_paths: Vec<PathBuf>,

    /// Timeout for `EXEC:` placeholders in seconds
    #[serde(rename = "command-timeout-secs")]
    pub command_timeout_secs: u64,

    /// Default log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Search paths added based on the template's location
    #[serde(rename = "auto-search-paths")]
    pub auto_search_paths: Vec<AutoSearchPath>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_base: None,
            search_paths: Vec::new(),
            command_timeout_secs: crate::DEFAULT_COMMAND_TIMEOUT_SECS,
            log_level: None,
            auto_search_paths: Vec::new(),
        }
    }
}

/// Adds `search_path` whenever the template path contains `when_path_contains`
///
/// ```yaml
/// auto-search-paths:
///   - when-path-contains: fitness
///     search-path: fitness/variables
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSearchPath {
    #[serde(rename = "when-path-contains")]
    pub when_path_contains: String,

    #[serde(rename = "search-path")]
    pub search_path: PathBuf,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.promptorch.yml`, then
    /// `<config dir>/promptorch/promptorch.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".promptorch.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("promptorch").join("promptorch.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Just the log level, read before logging is set up
    ///
    /// Errors are swallowed here; [`Config::load`] reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Search paths whose rule matches the template path, in rule order
    pub fn auto_search_paths_for(&self, template: &Path) -> Vec<PathBuf> {
        let template = template.to_string_lossy();
        self.auto_search_paths
            .iter()
            .filter(|rule| template.contains(&rule.when_path_contains))
            .map(|rule| rule.search_path.clone())
            .collect()
    }
}
