//! JSONL activity log: one self-contained JSON object per line.
//!
//! Each line is assembled in memory and written with a single `write_all`, so
//! a tailing reader never sees half a record. When the log file cannot be
//! written the writer falls back, in turn, to the fallback path, to stderr
//! with a `[CTXW-LOG]` prefix, and finally to discarding. Logging never fails
//! the operation being logged.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{Result, WidgetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WidgetReorder,
    HomeReplace,
    InvariantViolation,
    Error,
}

/// A single activity record. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
    /// Requested destination, e.g. `in front of 4`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Rows the operation changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// New entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            widget_id: None,
            position: None,
            changed: None,
            violations: None,
            config_hash: None,
            ok: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Failure record carrying the error's stable code.
    pub fn failure(event: EventType, error: &WidgetError) -> Self {
        Self {
            ok: Some(false),
            error_code: Some(error.code().to_string()),
            error_message: Some(error.to_string()),
            ..Self::new(event, Severity::Warning)
        }
    }
}

/// Writer settings.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    /// How many `path.N` generations to keep.
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(value: &LoggingConfig) -> Self {
        Self {
            path: value.path.clone(),
            fallback_path: value.fallback_path.clone(),
            max_size_bytes: value.max_size_bytes,
            max_rotated_files: value.max_rotated_files,
        }
    }
}

enum Sink {
    File {
        writer: BufWriter<File>,
        path: PathBuf,
        bytes: u64,
        is_fallback: bool,
    },
    Stderr,
    Discard,
}

/// Append-only JSONL writer with size-based rotation and fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    sink: Sink,
}

impl JsonlWriter {
    /// Open the log, falling through the degradation chain on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            sink: Sink::Discard,
        };
        writer.sink = writer.open_file(false);
        writer
    }

    /// Writer that drops everything, for when logging is disabled.
    pub fn disabled() -> Self {
        Self {
            config: JsonlConfig {
                path: PathBuf::new(),
                fallback_path: None,
                max_size_bytes: u64::MAX,
                max_rotated_files: 1,
            },
            sink: Sink::Discard,
        }
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[CTXW-LOG] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Sink::File { writer, .. } = &mut self.sink {
            let _ = writer.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &'static str {
        match &self.sink {
            Sink::File {
                is_fallback: false, ..
            } => "normal",
            Sink::File {
                is_fallback: true, ..
            } => "fallback",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        let needs_rotation = matches!(
            &self.sink,
            Sink::File { bytes, .. } if *bytes > 0 && bytes + len > self.config.max_size_bytes
        );
        if needs_rotation {
            self.rotate();
        }

        match &mut self.sink {
            Sink::File { writer, bytes, .. } => {
                if writer.write_all(line.as_bytes()).is_ok() {
                    *bytes += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            Sink::Stderr => {
                if write!(io::stderr(), "[CTXW-LOG] {line}").is_err() {
                    self.sink = Sink::Discard;
                }
            }
            Sink::Discard => {}
        }
    }

    fn open_file(&self, fallback_only: bool) -> Sink {
        if !fallback_only && let Ok((file, bytes)) = open_append(&self.config.path) {
            return Sink::File {
                writer: BufWriter::new(file),
                path: self.config.path.clone(),
                bytes,
                is_fallback: false,
            };
        }
        if let Some(fallback) = &self.config.fallback_path
            && let Ok((file, bytes)) = open_append(fallback)
        {
            let _ = writeln!(
                io::stderr(),
                "[CTXW-LOG] primary log unavailable, using fallback: {}",
                fallback.display()
            );
            return Sink::File {
                writer: BufWriter::new(file),
                path: fallback.clone(),
                bytes,
                is_fallback: true,
            };
        }
        let _ = writeln!(io::stderr(), "[CTXW-LOG] no writable log file, using stderr");
        Sink::Stderr
    }

    fn degrade(&mut self) {
        self.sink = match &self.sink {
            Sink::File {
                is_fallback: false, ..
            } => self.open_file(true),
            Sink::File {
                is_fallback: true, ..
            } => Sink::Stderr,
            Sink::Stderr | Sink::Discard => Sink::Discard,
        };
    }

    /// `log` → `log.1` → ... → `log.N`; the oldest generation is dropped.
    fn rotate(&mut self) {
        let Sink::File {
            writer,
            path,
            is_fallback,
            ..
        } = &mut self.sink
        else {
            return;
        };
        let _ = writer.flush();
        let base = path.clone();
        let is_fallback = *is_fallback;

        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&base, keep));
        for generation in (1..keep).rev() {
            let _ = fs::rename(
                rotated_name(&base, generation),
                rotated_name(&base, generation + 1),
            );
        }
        let _ = fs::rename(&base, rotated_name(&base, 1));

        self.sink = match open_append(&base) {
            Ok((file, bytes)) => Sink::File {
                writer: BufWriter::new(file),
                path: base,
                bytes,
                is_fallback,
            },
            Err(_) if is_fallback => Sink::Stderr,
            Err(_) => self.open_file(true),
        };
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| WidgetError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WidgetError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

fn rotated_name(base: &Path, generation: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
