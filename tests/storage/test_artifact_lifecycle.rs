// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Artifact lifecycle across the storage components
//!
//! staging -> namespace store -> resolver -> retention sweep

use std::time::{Duration, SystemTime};
use vision_artifact_node::storage::{
    ArtifactFormat, ArtifactName, NamespaceId, NamespaceStore, OperationTag, OutputResolver,
    ResolveError, RetentionSweeper, StagingArea, OUTPUTS_PREFIX,
};

const DAY: Duration = Duration::from_secs(24 * 3600);

#[cfg(test)]
mod artifact_lifecycle_tests {
    use super::*;

    /// Test 1: An artifact written under a staged request id resolves by its reference
    #[tokio::test]
    async fn test_written_artifact_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let staging_area = StagingArea::new(dir.path().join("uploads"), ["jpg", "png"]);
        let store = NamespaceStore::new(dir.path().join("outputs"));
        let resolver = OutputResolver::new(dir.path().join("outputs"));

        let staged = staging_area.stage(b"raw", "my cat.jpg").await.unwrap();
        let ns = NamespaceId::parse("user-42").unwrap();
        let name =
            ArtifactName::new(staged.request_id(), OperationTag::Detect, ArtifactFormat::Jpeg);
        let record = store.write(&ns, &name, b"annotated").await.unwrap();
        staged.discard().await;

        let output_ref = record.output_ref();
        let relative = output_ref
            .strip_prefix(OUTPUTS_PREFIX)
            .unwrap()
            .trim_start_matches('/');
        let resolved = resolver.resolve(relative).await.unwrap();

        assert_eq!(resolved.namespace, ns);
        assert_eq!(resolved.size_bytes, 9);
        assert_eq!(resolved.content_type(), "image/jpeg");
        assert_eq!(std::fs::read(&resolved.path).unwrap(), b"annotated");
        assert!(std::fs::read_dir(dir.path().join("uploads")).unwrap().next().is_none());
    }

    /// Test 2: The resolver refuses escapes even when the target exists
    #[tokio::test]
    async fn test_resolver_rejects_existing_outside_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("outputs/u1")).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();
        let resolver = OutputResolver::new(dir.path().join("outputs"));

        for path in [
            "../secret.txt",
            "u1/../../secret.txt",
            "/secret.txt",
            "u1\\..\\..\\secret.txt",
        ] {
            assert_eq!(
                resolver.resolve(path).await.unwrap_err(),
                ResolveError::InvalidPath,
                "{}",
                path
            );
        }
    }

    /// Test 3: Retention removes only expired artifacts and keeps namespaces
    #[tokio::test]
    async fn test_retention_after_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = NamespaceStore::new(dir.path());
        let ns = NamespaceId::parse("u1").unwrap();

        let uploads = tempfile::tempdir().unwrap();
        let staging_area = StagingArea::new(uploads.path(), ["jpg"]);
        for _ in 0..3 {
            let staged = staging_area.stage(b"x", "a.jpg").await.unwrap();
            let name = ArtifactName::new(
                staged.request_id(),
                OperationTag::Background,
                ArtifactFormat::Png,
            );
            store.write(&ns, &name, b"png").await.unwrap();
            staged.discard().await;
        }

        let sweeper = RetentionSweeper::new(dir.path(), DAY);
        let report = sweeper.sweep().await;
        assert_eq!(report.deleted, 0);
        assert_eq!(store.list(&ns).await.unwrap().len(), 3);

        let report = sweeper.sweep_at(SystemTime::now() + DAY * 2).await;
        assert_eq!(report.deleted, 3);
        assert_eq!(report.failed, 0);
        assert!(store.list(&ns).await.unwrap().is_empty());
        assert!(store.namespace_dir(&ns).is_dir());
    }
}
