// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Artifact naming
//!
//! Every request gets a fresh random [`RequestId`]. The id prefixes the staged
//! upload and is embedded in every artifact the request writes, so two requests
//! can never target the same file even when they share a namespace.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use image::ImageFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name used when sanitization leaves nothing of the original filename
const FALLBACK_FILENAME: &str = "upload";

/// Random identifier for one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Operation tag carried in artifact names (`_processed_<tag>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTag {
    Detect,
    Background,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationTag::Detect => "detect",
            OperationTag::Background => "bg",
        }
    }
}

/// Encoding of a persisted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Jpeg,
    Png,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Jpeg => "jpg",
            ArtifactFormat::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ArtifactFormat::Jpeg => ImageFormat::Jpeg,
            ArtifactFormat::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ArtifactFormat::Jpeg),
            "png" => Ok(ArtifactFormat::Png),
            other => Err(format!("unsupported artifact format '{}', expected jpeg or png", other)),
        }
    }
}

/// Generated artifact filename: `<requestId>_processed_<tag>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    request_id: RequestId,
    tag: OperationTag,
    format: ArtifactFormat,
}

impl ArtifactName {
    pub fn new(request_id: RequestId, tag: OperationTag, format: ArtifactFormat) -> Self {
        Self {
            request_id,
            tag,
            format,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn tag(&self) -> OperationTag {
        self.tag
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_processed_{}.{}",
            self.request_id,
            self.tag.as_str(),
            self.format.extension()
        )
    }
}

fn non_portable() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"))
}

/// Reduce a client-declared filename to a portable single path component
///
/// Path separators become word breaks, whitespace runs are joined with `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped and leading dots or
/// underscores are stripped so the result can never be hidden or relative.
pub fn sanitize_filename(declared: &str) -> String {
    let spaced: String = declared
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let portable = non_portable().replace_all(&joined, "");
    let trimmed = portable.trim_start_matches(['.', '_']);

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Name of the staged upload for a request: `<requestId>_<sanitized>`
pub fn staged_name(request_id: RequestId, declared: &str) -> String {
    format!("{}_{}", request_id, sanitize_filename(declared))
}
