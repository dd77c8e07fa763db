// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Operation dispatch
//!
//! Routes a staged upload to exactly one vision operation, persists what the
//! operation produced and always removes the staged upload afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::NodeConfig;
use crate::storage::{
    ArtifactFormat, ArtifactName, ArtifactRecord, NamespaceId, NamespaceStore, OperationTag,
    UploadStaging,
};
use crate::vision::annotate::draw_detections;
use crate::vision::{
    decode_image_bytes, encode_artifact, flatten_onto_white, Detection, PixelBox, VisionServices,
};

/// The processing operations a request can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Detect,
    RemoveBackground,
    ExtractText,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Detect => "detect",
            Operation::RemoveBackground => "remove-bg",
            Operation::ExtractText => "extract-text",
        }
    }

    /// Prefix of the client-facing failure message
    pub fn failure_label(&self) -> &'static str {
        match self {
            Operation::Detect => "Detection",
            Operation::RemoveBackground => "Background removal",
            Operation::ExtractText => "OCR",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized result of one operation
#[derive(Debug, Clone)]
pub enum OperationResult {
    Detection {
        artifact: ArtifactRecord,
        detections: Vec<Detection>,
        distinct_classes: BTreeSet<String>,
    },
    Image {
        artifact: ArtifactRecord,
    },
    Text {
        extracted_text: String,
    },
}

impl OperationResult {
    pub fn artifact(&self) -> Option<&ArtifactRecord> {
        match self {
            OperationResult::Detection { artifact, .. } | OperationResult::Image { artifact } => {
                Some(artifact)
            }
            OperationResult::Text { .. } => None,
        }
    }
}

/// A collaborator or output write failed
#[derive(Debug, Error)]
#[error("{} failed: {}", .operation.failure_label(), .cause)]
pub struct OperationError {
    pub operation: Operation,
    pub cause: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    services: Arc<VisionServices>,
    store: NamespaceStore,
    background_output: ArtifactFormat,
    jpeg_quality: u8,
}

impl Dispatcher {
    pub fn new(
        services: Arc<VisionServices>,
        store: NamespaceStore,
        background_output: ArtifactFormat,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            services,
            store,
            background_output,
            jpeg_quality,
        }
    }

    pub fn from_config(services: Arc<VisionServices>, config: &NodeConfig) -> Self {
        Self::new(
            services,
            NamespaceStore::new(&config.output_dir),
            config.background_output,
            config.jpeg_quality,
        )
    }

    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    pub fn services(&self) -> &Arc<VisionServices> {
        &self.services
    }

    /// Run `operation` on a staged upload
    ///
    /// The staged file is removed once the operation has finished, whether it
    /// succeeded or not.
    pub async fn run(
        &self,
        operation: Operation,
        staging: UploadStaging,
        namespace: &NamespaceId,
    ) -> Result<OperationResult, OperationError> {
        let request_id = staging.request_id();
        debug!(
            "Dispatching {} for request {} (namespace {}, file {})",
            operation,
            request_id,
            namespace,
            staging.original_filename()
        );

        let outcome = match operation {
            Operation::Detect => self.detect(&staging, namespace).await,
            Operation::RemoveBackground => self.remove_background(&staging, namespace).await,
            Operation::ExtractText => self.extract_text(&staging).await,
        };

        staging.discard().await;

        match outcome {
            Ok(result) => {
                info!("{} succeeded for request {}", operation, request_id);
                Ok(result)
            }
            Err(e) => {
                let err = OperationError {
                    operation,
                    cause: format!("{:#}", e),
                };
                error!("Request {}: {}", request_id, err);
                Err(err)
            }
        }
    }

    /// [`run`](Self::run) on its own task, so the caller going away does not
    /// cancel the operation or its cleanup
    pub async fn run_detached(
        &self,
        operation: Operation,
        staging: UploadStaging,
        namespace: NamespaceId,
    ) -> Result<OperationResult, OperationError> {
        let dispatcher = self.clone();
        let task =
            tokio::spawn(async move { dispatcher.run(operation, staging, &namespace).await });
        match task.await {
            Ok(result) => result,
            Err(e) => Err(OperationError {
                operation,
                cause: format!("dispatch task failed: {}", e),
            }),
        }
    }

    async fn detect(
        &self,
        staging: &UploadStaging,
        namespace: &NamespaceId,
    ) -> anyhow::Result<OperationResult> {
        let detections: Vec<Detection> = self
            .services
            .detect(staging.path())
            .await?
            .into_iter()
            .map(Detection::normalized)
            .collect();

        let source = tokio::fs::read(staging.path())
            .await
            .context("reading staged upload")?;
        let boxes: Vec<(PixelBox, String)> = detections
            .iter()
            .map(|d| (d.pixel_box(), d.label.clone()))
            .collect();
        let quality = self.jpeg_quality;

        let (bytes, drawn) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let img = decode_image_bytes(&source)?;
            let mut canvas = flatten_onto_white(&img);
            let drawn = draw_detections(
                &mut canvas,
                boxes.iter().map(|(bbox, label)| (*bbox, label.as_str())),
            );
            let bytes = encode_artifact(
                &DynamicImage::ImageRgb8(canvas),
                ArtifactFormat::Jpeg,
                quality,
            )?;
            Ok((bytes, drawn))
        })
        .await??;
        debug!("Drew {} of {} detections", drawn, detections.len());

        let name = ArtifactName::new(
            staging.request_id(),
            OperationTag::Detect,
            ArtifactFormat::Jpeg,
        );
        let artifact = self.store.write(namespace, &name, &bytes).await?;

        let distinct_classes = detections.iter().map(|d| d.label.clone()).collect();
        Ok(OperationResult::Detection {
            artifact,
            detections,
            distinct_classes,
        })
    }

    async fn remove_background(
        &self,
        staging: &UploadStaging,
        namespace: &NamespaceId,
    ) -> anyhow::Result<OperationResult> {
        let foreground = self.services.remove_background(staging.path()).await?;

        let format = self.background_output;
        let quality = self.jpeg_quality;
        let bytes =
            tokio::task::spawn_blocking(move || encode_artifact(&foreground, format, quality))
                .await??;

        let name = ArtifactName::new(staging.request_id(), OperationTag::Background, format);
        let artifact = self.store.write(namespace, &name, &bytes).await?;
        Ok(OperationResult::Image { artifact })
    }

    async fn extract_text(&self, staging: &UploadStaging) -> anyhow::Result<OperationResult> {
        let text = self.services.recognize_text(staging.path()).await?;
        Ok(OperationResult::Text {
            extracted_text: text.trim().to_string(),
        })
    }
}
