// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dispatcher::OperationError;
use crate::storage::{ResolveError, StagingError, StoreError, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `"error"`
    pub status: String,
    pub error: String,
    pub error_type: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Rejected upload or form input
    Validation(String),
    /// Malformed request the extractors could not read
    InvalidRequest(String),
    PayloadTooLarge(String),
    InvalidPath,
    NotFound,
    /// Collaborator or output write failure, already formatted for the client
    OperationFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, error) = match self {
            ApiError::Validation(msg) => ("validation_error", msg.clone()),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone()),
            ApiError::InvalidPath => ("invalid_path", ResolveError::InvalidPath.to_string()),
            ApiError::NotFound => ("not_found", ResolveError::NotFound.to_string()),
            ApiError::OperationFailed(msg) => ("operation_failed", msg.clone()),
            ApiError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            status: "error".to_string(),
            error,
            error_type: error_type.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::InvalidRequest(_) | ApiError::InvalidPath => 400,
            ApiError::NotFound => 404,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::OperationFailed(_) | ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InvalidPath => write!(f, "Invalid path"),
            ApiError::NotFound => write!(f, "File not found"),
            ApiError::OperationFailed(msg) => write!(f, "{}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<StagingError> for ApiError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::Validation(v) => v.into(),
            StagingError::Io { .. } => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<OperationError> for ApiError {
    fn from(e: OperationError) -> Self {
        ApiError::OperationFailed(e.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidPath => ApiError::InvalidPath,
            ResolveError::NotFound => ApiError::NotFound,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidNamespace(reason) => {
                ApiError::Validation(ValidationError::InvalidUserId(reason).to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}
