// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod form;
pub mod handlers;
pub mod http_server;
pub mod outputs;
pub mod process;

pub use errors::{ApiError, ErrorResponse};
pub use form::{UploadForm, UploadedFile};
pub use handlers::{HealthResponse, InfoResponse};
pub use http_server::{create_app, run_node, AppState};
pub use outputs::{fetch_output_handler, find_all_handler, FindAllResponse};
pub use process::{
    detect_handler, extract_text_handler, remove_background_handler, DetectResponse,
    ImageResponse, ProcessResponse, TextResponse,
};
