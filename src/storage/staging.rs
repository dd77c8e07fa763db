// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload ingest and staging
//!
//! [`StagingArea::stage`] validates a raw upload and writes it under a fresh
//! request id. The returned [`UploadStaging`] owns the staged file: it is
//! removed exactly once, either through [`UploadStaging::discard`] or, if the
//! handle is dropped without being discarded, synchronously on drop.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::naming::{sanitize_filename, staged_name, RequestId};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No image provided")]
    MissingFile,

    #[error("Invalid file type")]
    InvalidExtension,

    #[error("_id (user id) is required in form-data")]
    MissingUserId,

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to stage upload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory holding in-flight uploads plus the extension allow-list
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    allowed_extensions: BTreeSet<String>,
}

impl StagingArea {
    pub fn new<I, S>(dir: impl Into<PathBuf>, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dir: dir.into(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check a declared filename and payload without touching the filesystem
    pub fn validate(&self, bytes: &[u8], declared_filename: &str) -> Result<(), ValidationError> {
        if declared_filename.is_empty() || bytes.is_empty() {
            return Err(ValidationError::MissingFile);
        }

        let extension = declared_filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or(ValidationError::InvalidExtension)?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension);
        }

        Ok(())
    }

    /// Validate and persist an upload, returning the owning handle
    pub async fn stage(
        &self,
        bytes: &[u8],
        declared_filename: &str,
    ) -> Result<UploadStaging, StagingError> {
        self.validate(bytes, declared_filename)?;

        let request_id = RequestId::generate();
        let path = self.dir.join(staged_name(request_id, declared_filename));
        let io_err = |source| StagingError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(io_err)?;

        // From here on the handle owns the file, so a failed write still cleans up
        let staging = UploadStaging {
            request_id,
            original_filename: sanitize_filename(declared_filename),
            path: path.clone(),
            discarded: false,
        };

        file.write_all(bytes).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        debug!(
            "Staged upload {} ({} bytes) at {:?}",
            request_id,
            bytes.len(),
            staging.path
        );

        Ok(staging)
    }
}

/// Exclusive handle on one staged upload
#[derive(Debug)]
pub struct UploadStaging {
    request_id: RequestId,
    original_filename: String,
    path: PathBuf,
    discarded: bool,
}

impl UploadStaging {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file. Failures are logged, never returned.
    pub async fn discard(mut self) {
        self.discarded = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed staged upload {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staged upload {:?}: {}", self.path, e),
        }
    }
}

impl Drop for UploadStaging {
    fn drop(&mut self) {
        if self.discarded {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged upload {:?} on drop", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staged upload {:?}: {}", self.path, e),
        }
    }
}
