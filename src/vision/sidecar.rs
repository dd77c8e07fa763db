// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP sidecar clients for the detector and background-removal models
//!
//! Both sidecars take `{"image": <base64>, "format": <ext>}`. The detector
//! answers with `{"detections": [{"class", "confidence", "bbox"}]}`; the
//! background remover answers with the RGBA PNG bytes as the response body.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use reqwest::Client;
use tracing::{debug, info};

use super::collaborators::{BackgroundRemover, Detection, ObjectDetector};
use super::image_utils::{decode_image_bytes, detect_format, format_name};

#[derive(serde::Serialize)]
struct SidecarImageRequest {
    image: String,
    format: String,
}

#[derive(serde::Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

async fn image_request(path: &Path) -> Result<SidecarImageRequest> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {:?}", path))?;
    let format = detect_format(&bytes).map_err(|e| anyhow!("{}", e))?;
    Ok(SidecarImageRequest {
        image: STANDARD.encode(&bytes),
        format: format_name(format).to_string(),
    })
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn health(client: &Client, endpoint: &str) -> bool {
    match client.get(format!("{}/health", endpoint)).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            debug!("Sidecar health check failed for {}: {}", endpoint, e);
            false
        }
    }
}

async fn ensure_success(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!("{} sidecar returned {}: {}", what, status, body.trim()))
}

/// Object detector running behind an HTTP sidecar
pub struct DetectorClient {
    client: Client,
    endpoint: String,
}

impl DetectorClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Detector client configured: endpoint={}", endpoint);
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn health_check(&self) -> bool {
        health(&self.client, &self.endpoint).await
    }
}

#[async_trait]
impl ObjectDetector for DetectorClient {
    async fn detect(&self, image: &Path) -> Result<Vec<Detection>> {
        let start = std::time::Instant::now();
        let request = image_request(image).await?;

        let response = self
            .client
            .post(format!("{}/detect", self.endpoint))
            .json(&request)
            .send()
            .await?;
        let parsed: DetectResponse = ensure_success(response, "detector").await?.json().await?;

        debug!(
            "Detector returned {} boxes in {}ms",
            parsed.detections.len(),
            start.elapsed().as_millis()
        );
        Ok(parsed.detections)
    }
}

/// Background remover running behind an HTTP sidecar
pub struct BackgroundRemoverClient {
    client: Client,
    endpoint: String,
}

impl BackgroundRemoverClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Background remover client configured: endpoint={}", endpoint);
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn health_check(&self) -> bool {
        health(&self.client, &self.endpoint).await
    }
}

#[async_trait]
impl BackgroundRemover for BackgroundRemoverClient {
    async fn remove_background(&self, image: &Path) -> Result<DynamicImage> {
        let start = std::time::Instant::now();
        let request = image_request(image).await?;

        let response = self
            .client
            .post(format!("{}/remove-background", self.endpoint))
            .json(&request)
            .send()
            .await?;
        let bytes = ensure_success(response, "background remover")
            .await?
            .bytes()
            .await?;

        let img = decode_image_bytes(&bytes).map_err(|e| anyhow!("{}", e))?;
        debug!(
            "Background remover returned {}x{} in {}ms",
            img.width(),
            img.height(),
            start.elapsed().as_millis()
        );
        Ok(img)
    }
}
