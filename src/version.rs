// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Vision Artifact Node

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Full version string with feature description
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"), "-vision-artifacts");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "object-detection",
    "background-removal",
    "text-extraction",
    "user-namespaces",
    "safe-output-serving",
    "retention-sweep",
];

/// Get formatted version string
pub fn get_version_string() -> String {
    format!("Vision Artifact Node {}", VERSION)
}
