// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod sweep;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::NodeConfig;
use crate::storage::ArtifactFormat;

/// Vision Artifact Node
#[derive(Parser, Debug)]
#[command(name = "vision-artifact-node")]
#[command(version)]
#[command(about = "Image processing node with per-user artifact storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ConfigArgs),

    /// Delete expired artifacts once and exit
    Sweep(sweep::SweepArgs),
}

/// Settings shared by every command
///
/// Each flag overrides the matching key from `--config`, which in turn
/// overrides the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(long, env = "NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Directory for staged uploads
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Root of the per-user output namespaces
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum accepted request body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Encoding of background-removal output (jpeg or png)
    #[arg(long, env = "BACKGROUND_OUTPUT")]
    pub background_output: Option<ArtifactFormat>,

    /// Delete artifacts older than this many days
    #[arg(long, env = "RETENTION_DAYS")]
    pub retention_days: Option<u64>,

    /// Seconds between retention sweeps
    #[arg(long, env = "SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: Option<u64>,

    /// Base URL of the object detector sidecar
    #[arg(long, env = "DETECTOR_ENDPOINT")]
    pub detector_endpoint: Option<String>,

    /// Base URL of the background remover sidecar
    #[arg(long, env = "BACKGROUND_ENDPOINT")]
    pub background_endpoint: Option<String>,

    /// Tesseract executable
    #[arg(long, env = "TESSERACT_CMD")]
    pub tesseract_cmd: Option<PathBuf>,

    /// Tesseract language
    #[arg(long, env = "OCR_LANGUAGE")]
    pub ocr_language: Option<String>,

    /// Timeout for a single collaborator call, in seconds
    #[arg(long, env = "COLLABORATOR_TIMEOUT_SECS")]
    pub collaborator_timeout_secs: Option<u64>,
}

impl ConfigArgs {
    /// Resolve the effective configuration: defaults, then file, then flags
    pub fn load_config(&self) -> Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every flag that was given onto `config`
    pub fn apply(&self, mut config: NodeConfig) -> NodeConfig {
        if let Some(v) = &self.listen_addr {
            config.listen_addr = v.clone();
        }
        if let Some(v) = &self.upload_dir {
            config.upload_dir = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = self.max_upload_bytes {
            config.max_upload_bytes = v;
        }
        if let Some(v) = self.background_output {
            config.background_output = v;
        }
        if let Some(v) = self.retention_days {
            config.retention_days = Some(v);
        }
        if let Some(v) = self.sweep_interval_secs {
            config.sweep_interval_secs = v;
        }
        if let Some(v) = &self.detector_endpoint {
            config.detector_endpoint = v.clone();
        }
        if let Some(v) = &self.background_endpoint {
            config.background_endpoint = v.clone();
        }
        if let Some(v) = &self.tesseract_cmd {
            config.tesseract_cmd = v.clone();
        }
        if let Some(v) = &self.ocr_language {
            config.ocr_language = v.clone();
        }
        if let Some(v) = self.collaborator_timeout_secs {
            config.collaborator_timeout_secs = v;
        }
        config
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            let config = args.load_config()?;
            crate::api::http_server::run_node(config).await
        }
        Commands::Sweep(args) => sweep::run_sweep(args).await,
    }
}
