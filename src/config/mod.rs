//! Configuration management for linetrace
//!
//! Handles loading, validation, profile selection and environment overrides
//! for the matching pipeline and the bug-attribution walk.

use crate::error::{LinetraceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub matching: MatchingConfig,
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Tunables of a single line-matching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Lines above and below a line that form its context window
    pub context_window: usize,
    /// Fingerprint candidates kept per unresolved old line
    pub candidate_limit: usize,
    /// Score every unresolved new line instead of the fingerprint top-K
    pub widened_pool: bool,
    pub content_weight: f64,
    pub context_weight: f64,
    /// Minimum combined score a greedy pair must exceed (0.0 accepts all)
    pub match_threshold: f64,
    /// Minimum similarity for a one-to-many split mapping
    pub split_threshold: f64,
}

impl MatchingConfig {
    /// Configuration for one of the named operating modes
    pub fn for_mode(mode: MatchMode) -> Self {
        Self {
            match_threshold: mode.threshold(),
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            context_window: 4,
            candidate_limit: 15,
            widened_pool: false,
            content_weight: 0.6,
            context_weight: 0.4,
            match_threshold: MatchMode::Tracking.threshold(),
            split_threshold: 0.65,
        }
    }
}

/// Named operating modes of the greedy matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Plain line tracking between two revisions
    Tracking,
    /// Conservative matching used when walking history for bug origins
    Attribution,
    /// Accept every best candidate and rely on the score ranking alone
    Forced,
}

impl MatchMode {
    pub fn threshold(self) -> f64 {
        match self {
            MatchMode::Tracking => 0.4,
            MatchMode::Attribution => 0.75,
            MatchMode::Forced => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MatchMode::Tracking => "tracking",
            MatchMode::Attribution => "attribution",
            MatchMode::Forced => "forced",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatchMode {
    type Err = LinetraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tracking" => Ok(MatchMode::Tracking),
            "attribution" => Ok(MatchMode::Attribution),
            "forced" => Ok(MatchMode::Forced),
            other => Err(LinetraceError::Config(format!(
                "Unknown matching mode: {}",
                other
            ))),
        }
    }
}

/// Bug-attribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// Greedy threshold used for every step of a blame walk
    pub match_threshold: f64,
    pub bug_fix_keywords: Vec<String>,
    pub feature_keywords: Vec<String>,
    /// Maximum number of commits a blame walk may visit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            match_threshold: MatchMode::Attribution.threshold(),
            bug_fix_keywords: keywords(&[
                "fix", "bug", "patch", "resolve", "issue", "correct", "error", "defect", "hotfix",
                "close #",
            ]),
            feature_keywords: keywords(&[
                "feat",
                "add",
                "implement",
                "new",
                "refactor",
                "introduce",
                "enhance",
            ]),
            max_depth: None,
        }
    }
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widened_pool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_limit: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LinetraceError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| LinetraceError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| LinetraceError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the matching configuration
    ///
    /// User-defined profiles take precedence over the built-in operating
    /// modes of the same name. A profile threshold also replaces
    /// `attribution.match_threshold`, so an explicitly selected profile
    /// governs blame and SZZ walks as well as plain diffs.
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        if let Some(overrides) = self.profiles.get(profile) {
            if let Some(threshold) = overrides.match_threshold {
                self.matching.match_threshold = threshold;
                self.attribution.match_threshold = threshold;
            }
            if let Some(widened) = overrides.widened_pool {
                self.matching.widened_pool = widened;
            }
            if let Some(limit) = overrides.candidate_limit {
                self.matching.candidate_limit = limit;
            }
            return Ok(());
        }

        let mode: MatchMode = profile.parse()?;
        self.matching.match_threshold = mode.threshold();
        self.attribution.match_threshold = mode.threshold();
        Ok(())
    }

    /// Matching configuration used at every step of a blame walk
    pub fn blame_matching(&self) -> MatchingConfig {
        self.matching
            .clone()
            .with_threshold(self.attribution.match_threshold)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: LINETRACE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("LINETRACE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "MATCHING__MATCH_THRESHOLD" => {
                self.matching.match_threshold = parse_env(path, value)?;
            }
            "MATCHING__SPLIT_THRESHOLD" => {
                self.matching.split_threshold = parse_env(path, value)?;
            }
            "MATCHING__CANDIDATE_LIMIT" => {
                self.matching.candidate_limit = parse_env(path, value)?;
            }
            "MATCHING__WIDENED_POOL" => {
                self.matching.widened_pool = parse_env(path, value)?;
            }
            "ATTRIBUTION__MATCH_THRESHOLD" => {
                self.attribution.match_threshold = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            LinetraceError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("linetrace").join("config.toml"))
    }
}

fn parse_env<T: FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LinetraceError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            matching: MatchingConfig::default(),
            attribution: AttributionConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let mut config = Config::default();
        config.apply_profile("forced").unwrap();
        assert_eq!(config.matching.match_threshold, 0.0);

        config.apply_profile("attribution").unwrap();
        assert_eq!(config.matching.match_threshold, 0.75);

        assert!(config.apply_profile("nonexistent").is_err());
    }

    #[test]
    fn test_user_profile_shadows_builtin() {
        let mut config = Config::default();
        config.profiles.insert(
            "forced".to_string(),
            ProfileOverrides {
                match_threshold: Some(0.1),
                widened_pool: Some(true),
                candidate_limit: None,
            },
        );

        config.apply_profile("forced").unwrap();
        assert_eq!(config.matching.match_threshold, 0.1);
        assert!(config.matching.widened_pool);
        assert_eq!(config.matching.candidate_limit, 15);
    }

    #[test]
    fn test_env_value_parsing() {
        let mut config = Config::default();
        config
            .set_value_from_env("MATCHING__CANDIDATE_LIMIT", "30")
            .unwrap();
        config
            .set_value_from_env("MATCHING__WIDENED_POOL", "true")
            .unwrap();
        assert_eq!(config.matching.candidate_limit, 30);
        assert!(config.matching.widened_pool);

        assert!(config
            .set_value_from_env("MATCHING__MATCH_THRESHOLD", "high")
            .is_err());
    }

    #[test]
    fn test_blame_matching_uses_attribution_threshold() {
        let config = Config::default();
        let matching = config.blame_matching();
        assert_eq!(matching.match_threshold, 0.75);
        assert_eq!(matching.context_window, config.matching.context_window);
    }

    #[test]
    fn test_selected_profile_governs_blame_threshold() {
        let mut config = Config::default();
        config.apply_profile("forced").unwrap();
        assert_eq!(config.blame_matching().match_threshold, 0.0);

        let mut config = Config::default();
        config.profiles.insert(
            "loose".to_string(),
            ProfileOverrides {
                match_threshold: Some(0.5),
                ..ProfileOverrides::default()
            },
        );
        config.apply_profile("loose").unwrap();
        assert_eq!(config.blame_matching().match_threshold, 0.5);
        assert_eq!(config.matching.match_threshold, 0.5);
    }

    #[test]
    fn test_mode_round_trip_names() {
        for mode in [MatchMode::Tracking, MatchMode::Attribution, MatchMode::Forced] {
            assert_eq!(mode.name().parse::<MatchMode>().unwrap(), mode);
        }
    }
}
