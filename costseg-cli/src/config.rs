//! `costseg.toml` configuration.
//!
//! ```toml
//! guidelines = "data/guidelines.csv"
//! tax_savings_rate = 0.37
//! log_filter = "info,costseg_core=debug"
//! as_of_year = 2025
//! ```
//!
//! Every key is optional. Unknown keys are rejected so that typos surface
//! instead of silently falling back to defaults.
use std::fs;
use std::path::{Path, PathBuf};

use costseg_core::calculations::projection::DEFAULT_TAX_SAVINGS_RATE;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "costseg.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tax_savings_rate must be between 0 and 1, got {0}")]
    InvalidTaxSavingsRate(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Guideline CSV used by `commercial` when `--guidelines` is omitted.
    pub guidelines: Option<PathBuf>,
    /// Marginal rate applied to the projection's tax-savings lines.
    pub tax_savings_rate: Decimal,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Pins the "current year" that stands in for a missing study year.
    pub as_of_year: Option<i32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            guidelines: None,
            tax_savings_rate: DEFAULT_TAX_SAVINGS_RATE,
            log_filter: None,
            as_of_year: None,
        }
    }
}

impl AppConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "reading configuration");
        Self::from_toml_str(&text)
    }

    /// Resolves the configuration for a run.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used when present and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.tax_savings_rate < Decimal::ZERO || self.tax_savings_rate > Decimal::ONE {
            return Err(ConfigError::InvalidTaxSavingsRate(self.tax_savings_rate));
        }
        Ok(self)
    }
}
