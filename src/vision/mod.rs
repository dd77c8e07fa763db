// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision collaborators and image handling
//!
//! This module provides:
//! - Collaborator contracts (detector, background remover, text recognizer)
//! - Default adapters: HTTP sidecars and the Tesseract CLI
//! - Box/label annotation and alpha flattening for persisted artifacts

pub mod annotate;
pub mod collaborators;
pub mod image_utils;
pub mod services;
pub mod sidecar;
pub mod tesseract;

pub use collaborators::{BackgroundRemover, Detection, ObjectDetector, PixelBox, TextRecognizer};
pub use image_utils::{
    decode_image_bytes, detect_format, encode_artifact, flatten_onto_white, ImageError,
};
pub use services::{CollaboratorInfo, VisionServices};
pub use sidecar::{BackgroundRemoverClient, DetectorClient};
pub use tesseract::TesseractRecognizer;
