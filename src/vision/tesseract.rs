// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition through the Tesseract command-line engine

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::collaborators::TextRecognizer;

/// Runs `tesseract <image> stdout -l <lang>` per call
pub struct TesseractRecognizer {
    command: PathBuf,
    language: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<PathBuf>, language: &str, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            language: language.to_string(),
            timeout,
        }
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// Check the engine can be spawned at all
    pub async fn probe(&self) -> Result<String> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("failed to spawn {:?}", self.command))?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().next().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    // Every call is its own process
    fn is_thread_safe(&self) -> bool {
        true
    }

    async fn recognize(&self, image: &Path) -> Result<String> {
        let start = std::time::Instant::now();
        let child = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| anyhow!("tesseract timed out after {:?}", self.timeout))?
            .with_context(|| format!("failed to spawn {:?}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Tesseract recognized {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
