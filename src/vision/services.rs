// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared handles on the vision collaborators
//!
//! Collaborators are built once at startup and shared read-mostly across
//! requests. Calls into a collaborator that does not declare itself
//! thread-safe pass through a single-slot gate, so at most one request is
//! inside it at a time.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use image::DynamicImage;
use tokio::sync::{Mutex, MutexGuard};

use super::collaborators::{BackgroundRemover, Detection, ObjectDetector, TextRecognizer};
use super::sidecar::{BackgroundRemoverClient, DetectorClient};
use super::tesseract::TesseractRecognizer;
use crate::config::NodeConfig;

/// Serializes calls unless the collaborator is thread-safe
struct CallGate(Option<Mutex<()>>);

impl CallGate {
    fn new(thread_safe: bool) -> Self {
        Self(if thread_safe { None } else { Some(Mutex::new(())) })
    }

    async fn enter(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.0 {
            Some(slot) => Some(slot.lock().await),
            None => None,
        }
    }

    fn is_serialized(&self) -> bool {
        self.0.is_some()
    }
}

/// Information about a configured collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorInfo {
    pub name: &'static str,
    pub serialized: bool,
}

pub struct VisionServices {
    detector: Arc<dyn ObjectDetector>,
    detector_gate: CallGate,
    background: Arc<dyn BackgroundRemover>,
    background_gate: CallGate,
    recognizer: Arc<dyn TextRecognizer>,
    recognizer_gate: CallGate,
}

impl VisionServices {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        background: Arc<dyn BackgroundRemover>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            detector_gate: CallGate::new(detector.is_thread_safe()),
            background_gate: CallGate::new(background.is_thread_safe()),
            recognizer_gate: CallGate::new(recognizer.is_thread_safe()),
            detector,
            background,
            recognizer,
        }
    }

    /// Build the default collaborators (HTTP sidecars and Tesseract)
    pub async fn from_config(config: &NodeConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.collaborator_timeout_secs);

        let detector = DetectorClient::new(&config.detector_endpoint, timeout)?;
        if detector.health_check().await {
            tracing::info!("✅ Detector sidecar reachable at {}", detector.endpoint());
        } else {
            tracing::warn!("⚠️ Detector sidecar not reachable at {}", detector.endpoint());
        }

        let background = BackgroundRemoverClient::new(&config.background_endpoint, timeout)?;
        if background.health_check().await {
            tracing::info!(
                "✅ Background remover sidecar reachable at {}",
                background.endpoint()
            );
        } else {
            tracing::warn!(
                "⚠️ Background remover sidecar not reachable at {}",
                background.endpoint()
            );
        }

        let recognizer =
            TesseractRecognizer::new(&config.tesseract_cmd, &config.ocr_language, timeout);
        match recognizer.probe().await {
            Ok(version) => tracing::info!("✅ Tesseract available: {}", version),
            Err(e) => tracing::warn!(
                "⚠️ Tesseract not available at {:?}: {}",
                recognizer.command(),
                e
            ),
        }

        Ok(Self::new(
            Arc::new(detector),
            Arc::new(background),
            Arc::new(recognizer),
        ))
    }

    pub async fn detect(&self, image: &Path) -> Result<Vec<Detection>> {
        let _slot = self.detector_gate.enter().await;
        self.detector.detect(image).await
    }

    pub async fn remove_background(&self, image: &Path) -> Result<DynamicImage> {
        let _slot = self.background_gate.enter().await;
        self.background.remove_background(image).await
    }

    pub async fn recognize_text(&self, image: &Path) -> Result<String> {
        let _slot = self.recognizer_gate.enter().await;
        self.recognizer.recognize(image).await
    }

    pub fn collaborators(&self) -> Vec<CollaboratorInfo> {
        vec![
            CollaboratorInfo {
                name: "detector",
                serialized: self.detector_gate.is_serialized(),
            },
            CollaboratorInfo {
                name: "background-remover",
                serialized: self.background_gate.is_serialized(),
            },
            CollaboratorInfo {
                name: "text-recognizer",
                serialized: self.recognizer_gate.is_serialized(),
            },
        ]
    }
}
