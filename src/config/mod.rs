// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Defaults, overridden by an optional TOML file, overridden in turn by
//! command-line flags and environment variables (see [`crate::cli`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::ArtifactFormat;

/// Maximum upload size (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    pub listen_addr: String,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: usize,
    /// Encoding of background-removal artifacts
    pub background_output: ArtifactFormat,
    pub jpeg_quality: u8,
    /// Artifacts older than this are swept; `None` disables retention
    pub retention_days: Option<u64>,
    pub sweep_interval_secs: u64,
    pub detector_endpoint: String,
    pub background_endpoint: String,
    pub tesseract_cmd: PathBuf,
    pub ocr_language: String,
    pub collaborator_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            background_output: ArtifactFormat::Jpeg,
            jpeg_quality: 90,
            retention_days: None,
            sweep_interval_secs: 3600,
            detector_endpoint: "http://127.0.0.1:8601".to_string(),
            background_endpoint: "http://127.0.0.1:8602".to_string(),
            tesseract_cmd: PathBuf::from("tesseract"),
            ocr_language: "eng".to_string(),
            collaborator_timeout_secs: 120,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.retention_days.is_some() && self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be greater than 0 when retention is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_days
            .map(|days| Duration::from_secs(days * 24 * 3600))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
