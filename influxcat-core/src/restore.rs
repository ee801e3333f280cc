//! Restore pipeline: stream records out of a snapshot, write them back in one batch

use std::io::BufRead;

use tracing::{info, warn};

use crate::client::{BatchPoints, WriteSink};
use crate::dump::validate_args;
use crate::error::Result;
use crate::reconstruct::ValueReconstructor;
use crate::snapshot::SnapshotReader;

/// Restore statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreStats {
    pub records: usize,
    pub points: usize,
    pub dropped_values: usize,
    /// Whether the batch was submitted to the sink
    pub written: bool,
}

/// Decode the snapshot in `input` and write every point to `database` with one call
pub async fn restore<S, R>(sink: &S, database: &str, series: &str, input: R) -> Result<RestoreStats>
where
    S: WriteSink + ?Sized,
    R: BufRead,
{
    validate_args(database, series)?;

    let mut stats = RestoreStats::default();
    let mut batch = BatchPoints::new(database);
    let mut reader = SnapshotReader::new(input);

    info!("Step 1: Decoding snapshot");
    while let Some(record) = reader.next_series()? {
        if record.name != series {
            warn!(
                "Snapshot record {} does not match --series {}, restoring it as {}",
                record.name, series, record.name
            );
        }

        let reconstruction = ValueReconstructor::new(&record).reconstruct()?;
        stats.dropped_values += reconstruction.dropped_values;
        for point in reconstruction.points {
            batch.add_point(point);
        }
    }
    stats.records = reader.records_read();
    stats.points = batch.len();

    if batch.is_empty() {
        warn!("Snapshot holds no points, nothing to write");
        return Ok(stats);
    }

    info!("Step 2: Writing {} points to {}", batch.len(), database);
    sink.write(batch).await?;
    stats.written = true;

    info!(
        "Restored {} points from {} records",
        stats.points, stats.records
    );
    Ok(stats)
}
