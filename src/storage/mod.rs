// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local artifact storage
//!
//! - `naming` - request ids and artifact filenames
//! - `staging` - upload validation and the scoped staging handle
//! - `namespace` - per-user artifact directories
//! - `resolver` - safe resolution of output references
//! - `retention` - age-based artifact cleanup

pub mod namespace;
pub mod naming;
pub mod resolver;
pub mod retention;
pub mod staging;

pub use namespace::{
    output_ref, ArtifactRecord, NamespaceId, NamespaceStore, StoreError, OUTPUTS_PREFIX,
};
pub use naming::{sanitize_filename, ArtifactFormat, ArtifactName, OperationTag, RequestId};
pub use resolver::{OutputResolver, ResolveError, ResolvedOutput};
pub use retention::{spawn_retention_task, RetentionSweeper, SweepReport};
pub use staging::{StagingArea, StagingError, UploadStaging, ValidationError};
