//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use stay_core::{ClosingPolicy, EvaluationOptions};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Which entry ends a stay.
    #[serde(default)]
    pub closing: ClosingPolicy,

    /// Merge overlapping stays in the same country instead of summing them.
    #[serde(default)]
    pub merge_overlaps: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("stay.db"),
            closing: ClosingPolicy::default(),
            merge_overlaps: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(config_path).extract()
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (STAY_*)
        figment.merge(Env::prefixed("STAY_"))
    }

    /// Evaluation knobs derived from this configuration.
    pub const fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            closing: self.closing,
            merge_overlaps: self.merge_overlaps,
        }
    }
}

/// Returns the platform-specific config directory for stay.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stay"))
}

/// Returns the platform-specific data directory for stay.
///
/// On Linux: `~/.local/share/stay`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("stay"))
}
