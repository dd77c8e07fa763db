// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod storage;
pub mod version;
pub mod vision;

pub use config::NodeConfig;
pub use dispatcher::{Dispatcher, Operation, OperationError, OperationResult};
pub use storage::{NamespaceId, NamespaceStore, OutputResolver, RetentionSweeper, StagingArea};
pub use vision::VisionServices;
