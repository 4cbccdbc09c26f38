//! Configuration system: TOML file + env var overrides + built-in defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, WidgetError};
use crate::engine::home::HomeSlotRules;

/// Full ctxw configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub home: HomeSlotRules,
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
}

/// Menu editing guards applied by the CLI before a move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    /// Refuse moves the drop rules reject (non-droppable widget, invalid parent).
    pub enforce_drop_rules: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enforce_drop_rules: true,
        }
    }
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the active file would exceed this size.
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[CTXW-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let data = home_dir().join(".local").join("share").join("ctxw");
        Self {
            enabled: true,
            path: data.join("activity.jsonl"),
            fallback_path: Some(env::temp_dir().join("ctxw-activity.jsonl")),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        home_dir().join(".config").join("ctxw").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| WidgetError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str(&raw)?
        } else if path.is_some() {
            return Err(WidgetError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for log correlation.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CTXW_HOME_TYPE") {
            self.home.home_type = raw.trim().to_string();
        }
        if let Some(raw) = lookup("CTXW_CHATS_TYPE") {
            self.home.chats_type = raw.trim().to_string();
        }
        if let Some(raw) = lookup("CTXW_CHAT_TYPES") {
            self.home.chat_types = raw
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        if let Some(raw) = lookup("CTXW_ENFORCE_DROP_RULES") {
            self.rules.enforce_drop_rules = parse_env_bool("CTXW_ENFORCE_DROP_RULES", &raw)?;
        }

        if let Some(raw) = lookup("CTXW_LOG_ENABLED") {
            self.logging.enabled = parse_env_bool("CTXW_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("CTXW_LOG_PATH") {
            self.logging.path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CTXW_LOG_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env_u64("CTXW_LOG_MAX_SIZE_BYTES", &raw)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, tag) in [
            ("home.home_type", &self.home.home_type),
            ("home.chats_type", &self.home.chats_type),
        ] {
            if tag.trim().is_empty() {
                return Err(WidgetError::InvalidConfig {
                    details: format!("{name} must not be empty"),
                });
            }
        }

        if self.home.home_type == self.home.chats_type {
            return Err(WidgetError::InvalidConfig {
                details: format!(
                    "home.home_type and home.chats_type must differ (both {:?})",
                    self.home.home_type
                ),
            });
        }

        if self.home.chat_types.is_empty() {
            return Err(WidgetError::InvalidConfig {
                details: "home.chat_types must list at least one type".to_string(),
            });
        }

        if let Some(clash) = self
            .home
            .chat_types
            .iter()
            .find(|tag| **tag == self.home.home_type || **tag == self.home.chats_type)
        {
            return Err(WidgetError::InvalidConfig {
                details: format!("home.chat_types must not contain container type {clash:?}"),
            });
        }

        if self.logging.max_size_bytes == 0 {
            return Err(WidgetError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }

        if self.logging.max_rotated_files == 0 {
            return Err(WidgetError::InvalidConfig {
                details: "logging.max_rotated_files must be >= 1".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| WidgetError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| WidgetError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
