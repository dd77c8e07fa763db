// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Output path resolution
//!
//! Turns an untrusted `<namespace>/<file>` reference into a file inside the
//! output root. Every lexical check runs before the filesystem is touched;
//! once a path passes them, the only filesystem calls are canonicalization and
//! metadata of the candidate itself.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::namespace::NamespaceId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid path")]
    InvalidPath,

    #[error("File not found")]
    NotFound,
}

/// A validated artifact location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub namespace: NamespaceId,
    /// Path of the artifact relative to its namespace directory
    pub relative: PathBuf,
    /// Canonical absolute path of the artifact
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ResolvedOutput {
    /// Content type derived from the artifact extension
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.path)
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Lexically normalize an untrusted relative path into its segments
///
/// Backslashes count as separators regardless of host platform. Absolute
/// paths, NUL bytes, drive prefixes, leftover percent-encoding and any `..`
/// that would climb above the root are rejected.
pub fn normalize_segments(raw: &str) -> Result<Vec<String>, ResolveError> {
    if raw.is_empty() || raw.contains('\0') || raw.contains('%') {
        return Err(ResolveError::InvalidPath);
    }

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(ResolveError::InvalidPath);
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::InvalidPath);
                }
            }
            s if s.contains(':') || s.chars().any(char::is_control) => {
                return Err(ResolveError::InvalidPath);
            }
            s => segments.push(s.to_string()),
        }
    }

    Ok(segments)
}

/// Resolves output references against the configured output root
#[derive(Debug, Clone)]
pub struct OutputResolver {
    root: PathBuf,
}

impl OutputResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Split and validate a reference without any filesystem access
    pub fn check(&self, relative_path: &str) -> Result<(NamespaceId, PathBuf), ResolveError> {
        let segments = normalize_segments(relative_path)?;
        if segments.len() < 2 {
            return Err(ResolveError::InvalidPath);
        }

        let namespace =
            NamespaceId::parse(&segments[0]).map_err(|_| ResolveError::InvalidPath)?;
        if namespace.as_str() != segments[0] {
            // parse trims; an id with surrounding whitespace is not a real namespace
            return Err(ResolveError::InvalidPath);
        }

        // In-progress writes and other hidden entries are never served
        if segments[1..].iter().any(|s| s.starts_with('.')) {
            return Err(ResolveError::NotFound);
        }

        let relative: PathBuf = segments[1..].iter().collect();
        Ok((namespace, relative))
    }

    /// Resolve a reference to an existing regular file under the root
    pub async fn resolve(&self, relative_path: &str) -> Result<ResolvedOutput, ResolveError> {
        let (namespace, relative) = self.check(relative_path).map_err(|e| {
            warn!("Rejected output path {:?}", relative_path);
            e
        })?;

        let candidate = self.root.join(namespace.as_str()).join(&relative);

        let canonical_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| ResolveError::NotFound)?;
        let canonical = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|_| ResolveError::NotFound)?;

        if !canonical.starts_with(&canonical_root) {
            // Same answer as a missing file so the root's surroundings can't be probed
            warn!("Output path {:?} escapes the output root", relative_path);
            return Err(ResolveError::NotFound);
        }

        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|_| ResolveError::NotFound)?;
        if !metadata.is_file() {
            return Err(ResolveError::NotFound);
        }

        debug!("Resolved output {:?} -> {:?}", relative_path, canonical);

        Ok(ResolvedOutput {
            namespace,
            relative,
            path: canonical,
            size_bytes: metadata.len(),
        })
    }
}
