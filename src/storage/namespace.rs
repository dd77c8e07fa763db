// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-user artifact namespaces on the local filesystem
//!
//! Layout: `<output_root>/<namespace_id>/<artifact_name>`. Namespace
//! directories are created lazily on first write and are never removed by the
//! store itself.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::naming::ArtifactName;

/// Upper bound on namespace id length (one filesystem path component)
const MAX_NAMESPACE_LEN: usize = 128;

/// URL prefix under which artifacts are served
pub const OUTPUTS_PREFIX: &str = "/outputs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid namespace id: {0}")]
    InvalidNamespace(String),

    #[error("failed to create namespace directory {path}: {source}")]
    CreateNamespace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list namespace {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Caller-supplied user id, checked only for path safety
///
/// The id must be usable as exactly one path component on any platform:
/// no separators, no drive colons, no control characters, no `%` (so an
/// encoded separator can never be smuggled in) and not `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceId(String);

impl NamespaceId {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let id = raw.trim();
        let reject = |reason: &str| Err(StoreError::InvalidNamespace(reason.to_string()));

        if id.is_empty() {
            return reject("empty");
        }
        if id.len() > MAX_NAMESPACE_LEN {
            return reject("too long");
        }
        if id == "." || id == ".." {
            return reject("relative component");
        }
        if id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '%' | '?' | '#') || c.is_control())
        {
            return reject("contains a reserved character");
        }

        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-relative reference clients use to fetch an artifact
pub fn output_ref(namespace: &NamespaceId, name: &str) -> String {
    format!("{}/{}/{}", OUTPUTS_PREFIX, namespace, name)
}

/// A persisted artifact
#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub namespace: NamespaceId,
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn output_ref(&self) -> String {
        output_ref(&self.namespace, &self.name)
    }
}

/// Filesystem-backed namespace store
#[derive(Debug, Clone)]
pub struct NamespaceStore {
    root: PathBuf,
}

impl NamespaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace_dir(&self, namespace: &NamespaceId) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    /// Create the output root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::CreateNamespace {
                path: self.root.clone(),
                source,
            })
    }

    /// Persist an artifact under a namespace
    ///
    /// Bytes go to a hidden `.part` file first and are renamed into place, so
    /// listings and the output server never observe a half-written artifact.
    pub async fn write(
        &self,
        namespace: &NamespaceId,
        name: &ArtifactName,
        bytes: &[u8],
    ) -> Result<ArtifactRecord, StoreError> {
        let dir = self.namespace_dir(namespace);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::CreateNamespace {
                path: dir.clone(),
                source,
            })?;

        let file_name = name.to_string();
        let final_path = dir.join(&file_name);
        let part_path = dir.join(format!(".{}.part", file_name));

        let write_err = |source| StoreError::Write {
            path: final_path.clone(),
            source,
        };

        let written = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&part_path)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&part_path, &final_path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&part_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial artifact {:?}: {}", part_path, cleanup);
                }
            }
            return Err(write_err(e));
        }

        info!(
            "Stored artifact {}/{} ({} bytes)",
            namespace,
            file_name,
            bytes.len()
        );

        Ok(ArtifactRecord {
            namespace: namespace.clone(),
            name: file_name,
            path: final_path,
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        })
    }

    /// Sorted artifact names of a namespace; empty when it does not exist
    pub async fn list(&self, namespace: &NamespaceId) -> Result<Vec<String>, StoreError> {
        let dir = self.namespace_dir(namespace);
        let list_err = |source| StoreError::List {
            path: dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Namespace {} has no directory yet", namespace);
                return Ok(Vec::new());
            }
            Err(e) => return Err(list_err(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let file_type = entry.file_type().await.map_err(list_err)?;
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}
