use anyhow::{anyhow, Context, Result};
use influxcat_core::{validate_args, QueryExecutor, SnapshotWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::staged;
use crate::client::InfluxClient;
use crate::config::Settings;

/// What a finished dump produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

pub async fn execute_dump(settings: &Settings, output: &Path, pretty: bool) -> Result<DumpSummary> {
    validate_args(&settings.database, &settings.series).map_err(|e| staged("dump", e))?;

    let client = InfluxClient::new(&settings.influx).map_err(|e| staged("dump", e))?;
    run_dump(&client, settings, output, pretty).await
}

/// Query the measurement and write its snapshot to `output`
pub async fn run_dump<E>(
    executor: &E,
    settings: &Settings,
    output: &Path,
    pretty: bool,
) -> Result<DumpSummary>
where
    E: QueryExecutor + ?Sized,
{
    let partial = partial_path(output)?;

    let series = influxcat_core::dump(executor, &settings.database, &settings.series)
        .await
        .map_err(|e| staged("dump", e))?;

    let written = SnapshotWriter::create(&partial)
        .map(|w| w.pretty(pretty))
        .and_then(|w| w.write_snapshot(&series))
        .map(drop);
    if let Err(e) = written {
        if partial.exists() {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                warn!("Failed to remove {}: {}", partial.display(), cleanup);
            }
        }
        return Err(staged("dump", e));
    }

    std::fs::rename(&partial, output)
        .with_context(|| format!("Failed to move snapshot into {}", output.display()))?;

    let summary = DumpSummary {
        path: output.to_path_buf(),
        rows: series.values.len(),
        columns: series.columns.len(),
    };
    info!(
        "Dumped {} rows ({} columns) of {} to {}",
        summary.rows,
        summary.columns,
        settings.series,
        output.display()
    );
    Ok(summary)
}

/// Hidden sibling of `output` used until the snapshot is complete
fn partial_path(output: &Path) -> Result<PathBuf> {
    let name = output
        .file_name()
        .ok_or_else(|| anyhow!("Output path {} does not name a file", output.display()))?;
    Ok(output.with_file_name(format!(".{}.partial", name.to_string_lossy())))
}
