// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Output endpoints
//!
//! POST /find-all lists a namespace; GET /outputs/{*path} serves one artifact.

pub mod handler;
pub mod response;

pub use handler::{fetch_output_handler, find_all_handler};
pub use response::FindAllResponse;
