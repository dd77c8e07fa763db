// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

/// Response from POST /find-all
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindAllResponse {
    /// Output references, sorted by artifact name
    pub images: Vec<String>,
}
