// src/config.rs

//! Process-level configuration.
//!
//! Everything here is fixed for the lifetime of the process. Values come from
//! an optional JSON file named by the `PIPESPLASH_CONFIG` environment variable;
//! any field missing from the file keeps its default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "PIPESPLASH_CONFIG";

/// Smallest usable read buffer: one payload byte plus the terminator slot.
const MIN_BUFFER_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub pipe: PipeConfig,
    pub logging: LoggingConfig,
}

/// Placement of the status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Column the status text starts at.
    pub status_column: i32,
    /// Rows between the status line and the bottom edge; the status line is
    /// drawn at `height - status_bottom_offset`.
    pub status_bottom_offset: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            status_column: 1,
            status_bottom_offset: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Size of the read buffer. One byte is reserved, so a single message
    /// carries at most `buffer_size - 1` bytes.
    pub buffer_size: usize,
    /// Message that ends the session.
    pub exit_text: String,
}

impl Default for PipeConfig {
    fn default() -> Self {
        PipeConfig {
            buffer_size: 512,
            exit_text: "exit".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log to this file instead of stderr. Stderr is usually the console the
    /// splash is drawn on.
    pub file: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).context("Failed to parse configuration JSON")?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when the
    /// variable is unset or empty.
    pub fn load_from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Clamps values that would make the splash unusable.
    fn sanitized(mut self) -> Self {
        let defaults = Config::default();
        self.layout.status_column = self.layout.status_column.max(0);
        self.layout.status_bottom_offset = self.layout.status_bottom_offset.max(1);
        self.pipe.buffer_size = self.pipe.buffer_size.max(MIN_BUFFER_SIZE);
        if self.pipe.exit_text.is_empty() {
            self.pipe.exit_text = defaults.pipe.exit_text;
        }
        if self.logging.filter.trim().is_empty() {
            self.logging.filter = defaults.logging.filter;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = Config::from_json(r#"{ "layout": { "status_bottom_offset": 4 } }"#).unwrap();
        assert_eq!(config.layout.status_bottom_offset, 4);
        assert_eq!(config.layout.status_column, 1);
        assert_eq!(config.pipe, PipeConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn unusable_values_are_clamped() {
        let config = Config::from_json(
            r#"{
                "layout": { "status_column": -3, "status_bottom_offset": 0 },
                "pipe": { "buffer_size": 0, "exit_text": "" },
                "logging": { "filter": "  " }
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.status_column, 0);
        assert_eq!(config.layout.status_bottom_offset, 1);
        assert_eq!(config.pipe.buffer_size, MIN_BUFFER_SIZE);
        assert_eq!(config.pipe.exit_text, "exit");
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("{ layout: ").is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipesplash.json");
        std::fs::write(&path, r#"{ "pipe": { "exit_text": "done" } }"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.pipe.exit_text, "done");
        assert_eq!(config.pipe.buffer_size, 512);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }
}
