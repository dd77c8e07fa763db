// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processing endpoint handlers

use axum::{extract::State, Json};
use tracing::{debug, warn};

use super::response::ProcessResponse;
use crate::api::errors::ApiError;
use crate::api::form::UploadForm;
use crate::api::http_server::AppState;
use crate::dispatcher::Operation;

/// POST /detect - Detect objects and store an annotated copy
///
/// # Request (multipart/form-data)
/// - `image`: image file, extension jpg, jpeg or png (required)
/// - `_id`: user id selecting the output namespace (required)
///
/// # Response
/// - `outputRef`: reference of the annotated JPEG
/// - `detections`: `{class, confidence, bbox}` per detected object
/// - `objectTypes`: distinct classes among the detections
///
/// # Errors
/// - 400 Bad Request: missing image or `_id`, invalid file type
/// - 500 Internal Server Error: detection failed
pub async fn detect_handler(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ProcessResponse>, ApiError> {
    process(&state, Operation::Detect, form).await
}

/// POST /remove-bg - Remove the background and store the foreground
///
/// The artifact is a JPEG flattened onto white unless the node is configured
/// for PNG output, which keeps transparency.
pub async fn remove_background_handler(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ProcessResponse>, ApiError> {
    process(&state, Operation::RemoveBackground, form).await
}

/// POST /extract-text - Recognize text; nothing is stored
pub async fn extract_text_handler(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<ProcessResponse>, ApiError> {
    process(&state, Operation::ExtractText, form).await
}

async fn process(
    state: &AppState,
    operation: Operation,
    form: UploadForm,
) -> Result<Json<ProcessResponse>, ApiError> {
    // 1. Validate everything before a single byte is staged
    let checked = form.require_image().and_then(|image| {
        let namespace = form.namespace()?;
        state.staging.validate(&image.bytes, &image.filename)?;
        Ok((image, namespace))
    });
    let (image, namespace) = checked.map_err(|e| {
        warn!("{} request rejected: {}", operation, e);
        ApiError::from(e)
    })?;

    debug!(
        "{} request: {} bytes from namespace {}",
        operation,
        image.bytes.len(),
        namespace
    );

    // 2. Stage, then dispatch on a task of its own
    let staging = state.staging.stage(&image.bytes, &image.filename).await?;
    let result = state
        .dispatcher
        .run_detached(operation, staging, namespace)
        .await?;

    Ok(Json(result.into()))
}
