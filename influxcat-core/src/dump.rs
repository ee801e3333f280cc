//! Dump pipeline: query the measurement and its schema, shape one record

use tracing::{info, warn};

use crate::client::QueryExecutor;
use crate::error::{InfluxcatError, Result};
use crate::projector::RowProjector;
use crate::schema::SchemaProbe;
use crate::snapshot::Series;

/// Reject empty database or series names before anything is queried
pub fn validate_args(database: &str, series: &str) -> Result<()> {
    if database.trim().is_empty() {
        return Err(InfluxcatError::InvalidArgument(
            "You need to specify a database with --database name".to_string(),
        ));
    }
    if series.trim().is_empty() {
        return Err(InfluxcatError::InvalidArgument(
            "You need to specify a series with --series name".to_string(),
        ));
    }
    Ok(())
}

/// `SELECT *` over one measurement, with the identifier quoted
pub fn select_all(series: &str) -> String {
    format!("SELECT * FROM \"{}\"", series.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Build the snapshot record for `series` in `database`
pub async fn dump<E>(executor: &E, database: &str, series: &str) -> Result<Series>
where
    E: QueryExecutor + ?Sized,
{
    validate_args(database, series)?;

    info!("Step 1: Querying {} from {}", series, database);
    let results = executor.execute(&select_all(series), database).await?;

    let probe = SchemaProbe::new(executor);

    info!("Step 2: Listing tag keys");
    let tag_keys = probe.list_tag_keys(database, series).await?;

    info!("Step 3: Listing field keys");
    let field_keys = match probe.list_field_keys(database, series).await {
        Ok(fields) => fields,
        Err(InfluxcatError::EmptyResultError(reason)) => {
            warn!("No field keys found ({}), dumping without field types", reason);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    info!("Step 4: Projecting record");
    let record = RowProjector::new(&tag_keys, &field_keys).project(results)?;

    info!(
        "Dumped {} rows of {} ({} tags, {} fields)",
        record.values.len(),
        record.name,
        record.meta.tags.len(),
        record.meta.fields.len()
    );
    Ok(record)
}
