//! Tag and field key discovery

use std::collections::BTreeSet;

use tracing::debug;

use crate::client::{QueryExecutor, QueryResult, SeriesRow};
use crate::error::{InfluxcatError, Result};
use crate::value::RawValue;

/// Name of a tag column
pub type TagKey = String;

/// A field column and the type the database declares for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKey {
    pub name: String,
    /// Kept verbatim so types this tool does not know still reach the snapshot
    pub field_type: String,
}

impl FieldKey {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Reads tag and field key metadata for a database
pub struct SchemaProbe<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: QueryExecutor + ?Sized> SchemaProbe<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Tag keys of `measurement`. The listing covers the whole database: an
    /// empty listing is an error, a measurement absent from it has no tags.
    pub async fn list_tag_keys(&self, database: &str, measurement: &str) -> Result<BTreeSet<TagKey>> {
        let results = self.executor.execute("SHOW TAG KEYS", database).await?;
        let series = listing_series(&results, "SHOW TAG KEYS")?;

        let mut tags = BTreeSet::new();
        for row in rows_of(series, measurement) {
            tags.insert(string_cell(row, 0, "tagKey")?);
        }

        debug!("Found {} tag keys for {} in database {}", tags.len(), measurement, database);
        Ok(tags)
    }

    /// Field keys of `measurement` with their declared types
    pub async fn list_field_keys(&self, database: &str, measurement: &str) -> Result<Vec<FieldKey>> {
        let results = self.executor.execute("SHOW FIELD KEYS", database).await?;
        let series = listing_series(&results, "SHOW FIELD KEYS")?;

        let mut fields = Vec::new();
        for row in rows_of(series, measurement) {
            fields.push(FieldKey {
                name: string_cell(row, 0, "fieldKey")?,
                field_type: string_cell(row, 1, "fieldType")?,
            });
        }

        debug!("Found {} field keys for {} in database {}", fields.len(), measurement, database);
        Ok(fields)
    }
}

/// Listing rows that belong to one measurement; other measurements may reuse the same names
fn rows_of<'r>(series: &'r [SeriesRow], measurement: &'r str) -> impl Iterator<Item = &'r Vec<RawValue>> {
    series
        .iter()
        .filter(move |s| s.name == measurement)
        .flat_map(|s| s.values.iter())
}

fn listing_series<'r>(results: &'r [QueryResult], statement: &str) -> Result<&'r [SeriesRow]> {
    match results.first() {
        Some(result) if !result.series.is_empty() => Ok(&result.series),
        _ => Err(InfluxcatError::EmptyResultError(format!(
            "{} returned no series",
            statement
        ))),
    }
}

fn string_cell(row: &[RawValue], index: usize, column: &str) -> Result<String> {
    match row.get(index) {
        Some(RawValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(InfluxcatError::QueryError(format!(
            "expected {} to be a string, found {}",
            column,
            other.kind()
        ))),
        None => Err(InfluxcatError::QueryError(format!(
            "metadata row is missing the {} column",
            column
        ))),
    }
}
