// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processing response types

use serde::{Deserialize, Serialize};

use crate::dispatcher::OperationResult;
use crate::vision::Detection;

const SUCCESS: &str = "success";

/// Response from POST /detect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub status: String,
    /// Reference of the annotated image, fetchable via GET /outputs
    pub output_ref: String,
    /// Every detection, in detector order
    pub detections: Vec<Detection>,
    /// Distinct class labels among `detections`
    pub object_types: Vec<String>,
}

/// Response from POST /remove-bg
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub status: String,
    pub output_ref: String,
}

/// Response from POST /extract-text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponse {
    pub status: String,
    pub extracted_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessResponse {
    Detect(DetectResponse),
    Image(ImageResponse),
    Text(TextResponse),
}

impl From<OperationResult> for ProcessResponse {
    fn from(result: OperationResult) -> Self {
        match result {
            OperationResult::Detection {
                artifact,
                detections,
                distinct_classes,
            } => ProcessResponse::Detect(DetectResponse {
                status: SUCCESS.to_string(),
                output_ref: artifact.output_ref(),
                detections,
                object_types: distinct_classes.into_iter().collect(),
            }),
            OperationResult::Image { artifact } => ProcessResponse::Image(ImageResponse {
                status: SUCCESS.to_string(),
                output_ref: artifact.output_ref(),
            }),
            OperationResult::Text { extracted_text } => ProcessResponse::Text(TextResponse {
                status: SUCCESS.to_string(),
                extracted_text,
            }),
        }
    }
}
