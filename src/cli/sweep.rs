// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;
use crate::storage::RetentionSweeper;

/// Arguments for the sweep command
#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Maximum artifact age in hours; takes precedence over retention days
    #[arg(long)]
    pub max_age_hours: Option<u64>,
}

impl SweepArgs {
    /// Effective max age: explicit hours, else the configured retention
    pub fn max_age(&self, configured: Option<Duration>) -> Result<Duration> {
        match self.max_age_hours {
            Some(hours) => Ok(Duration::from_secs(hours * 3600)),
            None => configured.ok_or_else(|| {
                anyhow!("no max age given: pass --max-age-hours or set retention_days")
            }),
        }
    }
}

/// Sweep the output root once
pub async fn run_sweep(args: SweepArgs) -> Result<()> {
    let config = args.config.load_config()?;
    let max_age = args.max_age(config.retention())?;

    info!(
        "Sweeping {:?} for artifacts older than {:?}",
        config.output_dir, max_age
    );
    let report = RetentionSweeper::new(&config.output_dir, max_age)
        .sweep()
        .await;

    println!("🧹 Retention sweep complete");
    println!("  Scanned: {}", report.scanned);
    println!("  Deleted: {}", report.deleted);
    println!("  Failed:  {}", report.failed);

    if report.failed > 0 {
        return Err(anyhow!("{} artifacts could not be deleted", report.failed));
    }
    Ok(())
}
