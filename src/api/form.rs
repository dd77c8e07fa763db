// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Form input shared by the processing and listing endpoints
//!
//! Requests carry an `image` file part and an `_id` text part. Multipart is
//! the normal encoding; a url-encoded body is accepted for the `_id`-only
//! listing call.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    Form,
};
use axum_extra::extract::multipart::{Multipart, MultipartError};
use tracing::debug;

use super::errors::ApiError;
use crate::storage::{NamespaceId, StoreError, ValidationError};

pub const IMAGE_FIELD: &str = "image";
pub const USER_ID_FIELD: &str = "_id";

/// File part of an upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as declared by the client, untrusted
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub image: Option<UploadedFile>,
    pub user_id: Option<String>,
}

impl UploadForm {
    pub fn require_image(&self) -> Result<&UploadedFile, ValidationError> {
        self.image.as_ref().ok_or(ValidationError::MissingFile)
    }

    /// The caller's namespace; the id is checked for path safety only
    pub fn namespace(&self) -> Result<NamespaceId, ValidationError> {
        let raw = self
            .user_id
            .as_deref()
            .ok_or(ValidationError::MissingUserId)?;
        NamespaceId::parse(raw).map_err(|e| match e {
            StoreError::InvalidNamespace(reason) => ValidationError::InvalidUserId(reason),
            other => ValidationError::InvalidUserId(other.to_string()),
        })
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(IMAGE_FIELD) => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.image = Some(UploadedFile { filename, bytes });
                }
                Some(USER_ID_FIELD) => {
                    form.user_id = Some(field.text().await.map_err(multipart_error)?);
                }
                other => debug!("Ignoring form field {:?}", other),
            }
        }

        Ok(form)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::InvalidRequest(e.body_text())
    }
}

#[async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            Ok(Self {
                image: None,
                user_id: fields.get(USER_ID_FIELD).cloned(),
            })
        } else {
            // No form at all: let the field checks report what is missing
            Ok(Self::default())
        }
    }
}
