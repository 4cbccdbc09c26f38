//! CTXW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::widget::WidgetId;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Top-level error type for the widget engine and its tooling.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("[CTXW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CTXW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CTXW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CTXW-2001] widget {id} not found ({role})")]
    NotFound { id: WidgetId, role: &'static str },

    #[error("[CTXW-2002] invalid widget state: {details}")]
    InvalidState { details: String },

    #[error("[CTXW-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CTXW-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WidgetError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CTXW-1001",
            Self::MissingConfig { .. } => "CTXW-1002",
            Self::ConfigParse { .. } => "CTXW-1003",
            Self::NotFound { .. } => "CTXW-2001",
            Self::InvalidState { .. } => "CTXW-2002",
            Self::Serialization { .. } => "CTXW-3001",
            Self::Io { .. } => "CTXW-3002",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// Engine errors describe the input snapshot itself, so only I/O qualifies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for precondition failures.
    #[must_use]
    pub fn invalid_state(details: impl Into<String>) -> Self {
        Self::InvalidState {
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for WidgetError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
