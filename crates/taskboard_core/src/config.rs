//! Board configuration.
//!
//! # Responsibility
//! - Name the storage keys the board persists under.
//! - Carry field length caps for task validation.
//!
//! # Invariants
//! - Task and theme keys are non-empty and distinct.
//! - Every length cap is at least one character.

use crate::model::task::TaskLimits;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default storage key for the serialized task collection.
pub const DEFAULT_TASKS_KEY: &str = "mini-jira-board";
/// Default storage key for the theme preference.
pub const DEFAULT_THEME_KEY: &str = "mini-jira-theme";

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    EmptyKey(&'static str),
    DuplicateKey(String),
    ZeroLimit(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid board config: {err}"),
            Self::EmptyKey(name) => write!(f, "`{name}` cannot be empty"),
            Self::DuplicateKey(key) => {
                write!(f, "tasks_key and theme_key must differ, both are `{key}`")
            }
            Self::ZeroLimit(name) => write!(f, "`{name}` must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Board-wide settings. Missing fields take their defaults on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub tasks_key: String,
    pub theme_key: String,
    pub limits: TaskLimits,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tasks_key: DEFAULT_TASKS_KEY.to_string(),
            theme_key: DEFAULT_THEME_KEY.to_string(),
            limits: TaskLimits::default(),
        }
    }
}

impl BoardConfig {
    /// Decodes and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey("tasks_key"));
        }
        if self.theme_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey("theme_key"));
        }
        if self.tasks_key == self.theme_key {
            return Err(ConfigError::DuplicateKey(self.tasks_key.clone()));
        }
        for (name, value) in [
            ("limits.title_max_chars", self.limits.title_max_chars),
            (
                "limits.description_max_chars",
                self.limits.description_max_chars,
            ),
            ("limits.assignee_max_chars", self.limits.assignee_max_chars),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit(name));
            }
        }
        Ok(())
    }
}
