//! Configuration file support for ferro-vrs.
//!
//! Collaborator deadlines, the normalization window and optional data files
//! are read from a TOML file.
//!
//! # Example Configuration
//!
//! ```toml
//! [timeouts]
//! sequence_ms = 5000
//! liftover_ms = 2000
//!
//! [normalize]
//! window = 100
//! max_window = 1000000
//!
//! [data]
//! reference_json = "data/reference.json"
//! grch37_to_38 = "hg19ToHg38.over.chain.gz"
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.ferro-vrs.toml` in current directory
//! 2. `~/.config/ferro/vrs.toml`
//!
//! CLI flags take precedence over config file settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FerroError;

/// Parsed configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub normalize: NormalizeWindowConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Per-collaborator deadlines in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub sequence_ms: u64,
    pub transcript_ms: u64,
    pub gene_ms: u64,
    pub liftover_ms: u64,
    pub normalizer_ms: u64,
    pub mane_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sequence_ms: 5000,
            transcript_ms: 5000,
            gene_ms: 2000,
            liftover_ms: 2000,
            normalizer_ms: 5000,
            mane_ms: 5000,
        }
    }
}

impl TimeoutConfig {
    pub fn sequence(&self) -> Duration {
        Duration::from_millis(self.sequence_ms)
    }

    pub fn transcript(&self) -> Duration {
        Duration::from_millis(self.transcript_ms)
    }

    pub fn gene(&self) -> Duration {
        Duration::from_millis(self.gene_ms)
    }

    pub fn liftover(&self) -> Duration {
        Duration::from_millis(self.liftover_ms)
    }

    pub fn normalizer(&self) -> Duration {
        Duration::from_millis(self.normalizer_ms)
    }

    pub fn mane(&self) -> Duration {
        Duration::from_millis(self.mane_ms)
    }
}

/// Flank fetched around an allele during normalization
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeWindowConfig {
    /// Initial flank on each side, in bases
    pub window: u64,
    /// Ceiling the flank may grow to before giving up
    pub max_window: u64,
}

impl Default for NormalizeWindowConfig {
    fn default() -> Self {
        Self {
            window: crate::vrs::normalize::DEFAULT_WINDOW,
            max_window: crate::vrs::normalize::DEFAULT_MAX_WINDOW,
        }
    }
}

/// Optional data files
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataConfig {
    /// JSON fixture for [`MockProvider`](crate::reference::MockProvider)
    pub reference_json: Option<PathBuf>,
    /// Path to hg19ToHg38.over.chain.gz (GRCh37 to GRCh38)
    pub grch37_to_38: Option<PathBuf>,
    /// Path to hg38ToHg19.over.chain.gz (GRCh38 to GRCh37)
    pub grch38_to_37: Option<PathBuf>,
}

impl NormalizerConfig {
    /// Load configuration from the default locations.
    ///
    /// Searches for config in:
    /// 1. `.ferro-vrs.toml` in current directory
    /// 2. `~/.config/ferro/vrs.toml`
    pub fn load() -> Option<Self> {
        let cwd_config = PathBuf::from(".ferro-vrs.toml");
        if cwd_config.exists() {
            match Self::from_file(&cwd_config) {
                Ok(config) => return Some(config),
                Err(e) => tracing::warn!(path = %cwd_config.display(), error = %e, "ignoring config"),
            }
        }

        if let Some(home) = dirs_home() {
            let home_config = home.join(".config").join("ferro").join("vrs.toml");
            if home_config.exists() {
                match Self::from_file(&home_config) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        tracing::warn!(path = %home_config.display(), error = %e, "ignoring config")
                    }
                }
            }
        }

        None
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, FerroError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML content
    pub fn parse(content: &str) -> Result<Self, FerroError> {
        let config: NormalizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), FerroError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), FerroError> {
        let t = &self.timeouts;
        let deadlines = [
            ("sequence_ms", t.sequence_ms),
            ("transcript_ms", t.transcript_ms),
            ("gene_ms", t.gene_ms),
            ("liftover_ms", t.liftover_ms),
            ("normalizer_ms", t.normalizer_ms),
            ("mane_ms", t.mane_ms),
        ];
        if let Some((name, _)) = deadlines.iter().find(|(_, ms)| *ms == 0) {
            return Err(FerroError::Config {
                msg: format!("timeouts.{} must be greater than 0", name),
            });
        }

        if self.normalize.window == 0 {
            return Err(FerroError::Config {
                msg: "normalize.window must be greater than 0".to_string(),
            });
        }
        if self.normalize.max_window < self.normalize.window {
            return Err(FerroError::Config {
                msg: format!(
                    "normalize.max_window ({}) is smaller than normalize.window ({})",
                    self.normalize.max_window, self.normalize.window
                ),
            });
        }

        for path in [
            &self.data.reference_json,
            &self.data.grch37_to_38,
            &self.data.grch38_to_37,
        ]
        .into_iter()
        .flatten()
        {
            if !path.exists() {
                return Err(FerroError::Config {
                    msg: format!("data file does not exist: {}", path.display()),
                });
            }
        }

        Ok(())
    }
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizerConfig::default();
        assert_eq!(config.timeouts.sequence_ms, 5000);
        assert_eq!(config.timeouts.gene(), Duration::from_millis(2000));
        assert_eq!(config.normalize.window, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = NormalizerConfig::parse(
            r#"
[timeouts]
liftover_ms = 250

[normalize]
window = 20
"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.liftover_ms, 250);
        assert_eq!(config.timeouts.sequence_ms, 5000);
        assert_eq!(config.normalize.window, 20);
        assert_eq!(config.normalize.max_window, 1_000_000);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let err = NormalizerConfig::parse("[timeouts]\ngene_ms = 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: timeouts.gene_ms must be greater than 0"
        );
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let err = NormalizerConfig::parse("[normalize]\nwindow = 50\nmax_window = 10\n").unwrap_err();
        assert!(matches!(err, FerroError::Config { .. }));
    }

    #[test]
    fn test_validate_missing_data_file() {
        let mut config = NormalizerConfig::default();
        config.data.reference_json = Some(PathBuf::from("/nonexistent/reference.json"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = NormalizerConfig::parse("[timeouts\n").unwrap_err();
        assert!(matches!(err, FerroError::Config { .. }));
    }
}
