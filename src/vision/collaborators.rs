// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Contracts for the external vision collaborators
//!
//! The node treats the detector, background remover and text recognizer as
//! black boxes. Implementations declare whether they tolerate concurrent
//! calls; [`VisionServices`](super::VisionServices) serializes the ones that
//! don't.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// One labeled bounding box reported by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label
    #[serde(rename = "class")]
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in source pixel coordinates
    pub bbox: [f64; 4],
}

/// Integer box corners used for drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Detection {
    /// Canonical form: ordered corners and confidence clamped to [0, 1]
    pub fn normalized(self) -> Self {
        let [ax, ay, bx, by] = self.bbox;
        let confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        Self {
            label: self.label,
            confidence,
            bbox: [ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)],
        }
    }

    pub fn pixel_box(&self) -> PixelBox {
        let [x1, y1, x2, y2] = self.bbox;
        PixelBox {
            x1: x1.round() as i64,
            y1: y1.round() as i64,
            x2: x2.round() as i64,
            y2: y2.round() as i64,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Whether `detect` may run concurrently on one instance
    fn is_thread_safe(&self) -> bool {
        false
    }

    async fn detect(&self, image: &Path) -> Result<Vec<Detection>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    fn is_thread_safe(&self) -> bool {
        false
    }

    /// Returns the foreground with transparency in its alpha channel
    async fn remove_background(&self, image: &Path) -> Result<DynamicImage>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn is_thread_safe(&self) -> bool {
        false
    }

    async fn recognize(&self, image: &Path) -> Result<String>;
}
