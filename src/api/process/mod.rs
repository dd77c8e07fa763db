// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processing endpoints
//!
//! POST /detect, /remove-bg and /extract-text: validate the upload, stage it
//! and hand it to the dispatcher.

pub mod handler;
pub mod response;

pub use handler::{detect_handler, extract_text_handler, remove_background_handler};
pub use response::{DetectResponse, ImageResponse, ProcessResponse, TextResponse};
