use anyhow::{Context, Result};
use influxcat_core::{validate_args, RestoreStats, WriteSink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use super::staged;
use crate::client::InfluxClient;
use crate::config::Settings;

pub async fn execute_restore(settings: &Settings, input: &Path) -> Result<RestoreStats> {
    validate_args(&settings.database, &settings.series).map_err(|e| staged("restore", e))?;

    let client = InfluxClient::new(&settings.influx).map_err(|e| staged("restore", e))?;
    run_restore(&client, settings, input).await
}

/// Read the snapshot at `input` and write it through `sink`
pub async fn run_restore<S>(sink: &S, settings: &Settings, input: &Path) -> Result<RestoreStats>
where
    S: WriteSink + ?Sized,
{
    let file = File::open(input)
        .with_context(|| format!("Failed to open snapshot {}", input.display()))?;

    let stats = influxcat_core::restore(
        sink,
        &settings.database,
        &settings.series,
        BufReader::new(file),
    )
    .await
    .map_err(|e| staged("restore", e))?;

    if stats.written {
        info!(
            "Restored {} points from {} into {}",
            stats.points,
            input.display(),
            settings.database
        );
    } else {
        info!("Nothing to restore from {}", input.display());
    }
    Ok(stats)
}
