//! Settings for chain walking and user validation, loaded from TOML.
//!
//! Every section and field has a default, so an empty file is valid:
//!
//! ```toml
//! [walk]
//! max_depth = 64
//!
//! [validation]
//! name_min_len = 1
//! age_min = 0
//! age_max = 150
//! email_pattern = '^[^@\s]+@[^@\s]+\.[^@\s]+$'
//! ```

use crate::chain::WalkLimits;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Bounds used when checking a user record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub name_min_len: usize,
    pub age_min: i64,
    pub age_max: i64,
    pub email_pattern: String,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            name_min_len: 1,
            age_min: 0,
            age_max: 150,
            email_pattern: DEFAULT_EMAIL_PATTERN.to_string(),
        }
    }
}

impl ValidationRules {
    pub fn email_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.email_pattern)
            .map_err(|err| ConfigError::invalid("validation.email_pattern", err.to_string()))
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.age_min > self.age_max {
            return Err(ConfigError::invalid(
                "validation.age_min",
                format!("{} is greater than age_max {}", self.age_min, self.age_max),
            ));
        }
        self.email_regex().map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub walk: WalkLimits,
    pub validation: ValidationRules,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validation.check()?;
        debug!(
            "loaded settings: max_depth={}, age range {}..={}",
            settings.walk.max_depth, settings.validation.age_min, settings.validation.age_max
        );
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
