// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Output endpoint handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::response::FindAllResponse;
use crate::api::errors::ApiError;
use crate::api::form::UploadForm;
use crate::api::http_server::AppState;
use crate::storage::output_ref;

/// POST /find-all - List every artifact of a user
///
/// A user that has never produced an artifact gets an empty list.
///
/// # Errors
/// - 400 Bad Request: `_id` missing or not usable as a namespace
pub async fn find_all_handler(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<FindAllResponse>, ApiError> {
    let namespace = form.namespace().map_err(|e| {
        warn!("find-all rejected: {}", e);
        ApiError::from(e)
    })?;

    let names = state.dispatcher.store().list(&namespace).await?;
    debug!("Namespace {} holds {} artifacts", namespace, names.len());

    let images = names
        .iter()
        .map(|name| output_ref(&namespace, name))
        .collect();
    Ok(Json(FindAllResponse { images }))
}

/// GET /outputs/{*path} - Stream one artifact
///
/// `path` is `<userId>/<artifact>`. The body is served inline so browsers
/// render it instead of downloading.
///
/// # Errors
/// - 400 Bad Request: the path escapes the output root or has no namespace
/// - 404 Not Found: no such artifact
pub async fn fetch_output_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state.resolver.resolve(&path).await?;

    let file = tokio::fs::File::open(&resolved.path).await.map_err(|e| {
        warn!("Failed to open resolved artifact {:?}: {}", resolved.path, e);
        ApiError::NotFound
    })?;

    let filename = resolved
        .relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");

    Response::builder()
        .header(header::CONTENT_TYPE, resolved.content_type())
        .header(header::CONTENT_LENGTH, resolved.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::InternalError(e.to_string()))
}
