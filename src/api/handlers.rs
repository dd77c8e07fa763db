// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::http_server::AppState;

/// Routes advertised by GET /
pub const ROUTES: &[(&str, &str)] = &[
    ("POST /detect (form-data: image, _id)", "Run object detection"),
    ("POST /remove-bg (form-data: image, _id)", "Remove background"),
    ("POST /extract-text (form-data: image, _id)", "Extract text"),
    ("POST /find-all (form-data: _id)", "List all outputs for a user"),
    ("GET /outputs/{*path}", "Serve an output image"),
    ("GET /health", "Health check"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub routes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorStatus {
    pub name: String,
    /// Calls are queued one at a time
    pub serialized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub collaborators: Vec<CollaboratorStatus>,
}

/// GET / - Service description
pub async fn info_handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Object detection, background removal and OCR API".to_string(),
        version: crate::version::VERSION.to_string(),
        routes: ROUTES
            .iter()
            .map(|(route, what)| (route.to_string(), what.to_string()))
            .collect(),
    })
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let collaborators = state
        .dispatcher
        .services()
        .collaborators()
        .into_iter()
        .map(|c| CollaboratorStatus {
            name: c.name.to_string(),
            serialized: c.serialized,
        })
        .collect();

    Json(HealthResponse {
        status: "success".to_string(),
        message: "Server healthy".to_string(),
        collaborators,
    })
}
