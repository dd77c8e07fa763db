// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retention sweeper
//!
//! Deletes artifacts older than a maximum age. Each file is handled on its
//! own, so a sweep interleaves freely with concurrent writes to the same
//! namespace and never removes a namespace directory.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    root: PathBuf,
    max_age: Duration,
}

impl RetentionSweeper {
    pub fn new(root: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            root: root.into(),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Run one pass over every namespace, measuring age against `now`
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let mut namespaces = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                warn!("Retention sweep could not read {:?}: {}", self.root, e);
                report.failed += 1;
                return report;
            }
        };

        loop {
            let entry = match namespaces.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Retention sweep aborted listing {:?}: {}", self.root, e);
                    report.failed += 1;
                    break;
                }
            };
            match entry.file_type().await {
                Ok(t) if t.is_dir() => self.sweep_namespace(&entry.path(), now, &mut report).await,
                _ => continue,
            }
        }

        if report.deleted > 0 || report.failed > 0 {
            info!(
                "Retention sweep: scanned {}, deleted {}, failed {}",
                report.scanned, report.deleted, report.failed
            );
        } else {
            debug!("Retention sweep: scanned {}, nothing expired", report.scanned);
        }

        report
    }

    /// Run one pass against the current time
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now()).await
    }

    async fn sweep_namespace(&self, dir: &Path, now: SystemTime, report: &mut SweepReport) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Retention sweep could not read {:?}: {}", dir, e);
                report.failed += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Retention sweep aborted listing {:?}: {}", dir, e);
                    report.failed += 1;
                    break;
                }
            };
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            report.scanned += 1;

            // Not every filesystem records a birth time
            let Ok(created) = metadata.created().or_else(|_| metadata.modified()) else {
                continue;
            };
            if !is_expired(created, now, self.max_age) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Expired artifact removed: {:?}", path);
                    report.deleted += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove expired artifact {:?}: {}", path, e);
                    report.failed += 1;
                }
            }
        }
    }
}

/// `now - created > max_age`; timestamps in the future are never expired
pub fn is_expired(created: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    match now.duration_since(created) {
        Ok(age) => age > max_age,
        Err(_) => false,
    }
}

/// Run the sweeper periodically on its own task
pub fn spawn_retention_task(sweeper: RetentionSweeper, every: Duration) -> JoinHandle<()> {
    info!(
        "Retention enabled: max age {:?}, sweeping every {:?}",
        sweeper.max_age(),
        every
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            sweeper.sweep().await;
        }
    })
}
