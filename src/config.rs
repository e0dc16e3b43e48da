//! Configuration file handling.
//!
//! Settings come from an optional `emendas.toml`; every section and key falls back to
//! a default when missing, and command-line flags are merged on top.

use crate::{
    data::{Dimension, Error, SignPolicy},
    read::DEFAULT_DELIMITER,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "emendas.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the dataset lives and how it's laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the pre-processed dataset.
    #[serde(default = "default_path")]
    pub path: String,

    /// Field separator, a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            delimiter: default_delimiter(),
        }
    }
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> Result<u8, Error> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::InvalidDelimiter(self.delimiter))
        }
    }
}

fn default_path() -> String {
    "emendas_tratadas.csv".to_string()
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER as char
}

/// Currency normalization settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Read a `-` in an amount as a negative value instead of dropping it.
    #[serde(default)]
    pub treat_sign_as_negation: bool,
}

impl From<&NormalizeConfig> for SignPolicy {
    fn from(config: &NormalizeConfig) -> Self {
        if config.treat_sign_as_negation {
            SignPolicy::Negate
        } else {
            SignPolicy::Strip
        }
    }
}

/// Defaults for what gets reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Author selected when none is given.
    #[serde(default = "default_author")]
    pub default_author: Option<String>,

    #[serde(default = "default_dimension")]
    pub default_dimension: Dimension,

    /// Reference year shown in headings.
    #[serde(default = "default_year")]
    pub year: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_author: default_author(),
            default_dimension: default_dimension(),
            year: default_year(),
        }
    }
}

fn default_author() -> Option<String> {
    Some("BANCADA DO RIO DE JANEIRO".to_string())
}

fn default_dimension() -> Dimension {
    Dimension::AgencyAndAction
}

fn default_year() -> i32 {
    2025
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.source.delimiter_byte()?;
        Ok(config)
    }

    /// `path` if given, else `emendas.toml` in the working directory when there is
    /// one, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    tracing::debug!("using {}", local.display());
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Default configuration rendered as TOML, for `init-config`.
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
