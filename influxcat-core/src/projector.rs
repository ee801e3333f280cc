//! Shapes a raw query result into a self-describing snapshot record

use std::collections::BTreeSet;

use tracing::debug;

use crate::client::QueryResult;
use crate::error::{InfluxcatError, Result};
use crate::schema::{FieldKey, TagKey};
use crate::snapshot::{FieldMeta, Meta, Series};

/// Merges tag/field metadata with the column layout of a query result
pub struct RowProjector<'a> {
    tag_keys: &'a BTreeSet<TagKey>,
    field_keys: &'a [FieldKey],
}

impl<'a> RowProjector<'a> {
    pub fn new(tag_keys: &'a BTreeSet<TagKey>, field_keys: &'a [FieldKey]) -> Self {
        Self {
            tag_keys,
            field_keys,
        }
    }

    /// Build the record for the first series of the first result
    pub fn project(&self, results: Vec<QueryResult>) -> Result<Series> {
        let row = results
            .into_iter()
            .next()
            .and_then(|result| result.series.into_iter().next())
            .ok_or_else(|| {
                InfluxcatError::EmptyResultError("the measurement returned no series".to_string())
            })?;

        let meta = self.meta_for(&row.columns);
        debug!(
            "Projected {}: {} columns, {} tags, {} fields, {} rows",
            row.name,
            row.columns.len(),
            meta.tags.len(),
            meta.fields.len(),
            row.values.len()
        );

        Ok(Series {
            name: row.name,
            columns: row.columns,
            values: row.values,
            meta,
        })
    }

    /// Classify every column after the timestamp. A name that is both a tag and a
    /// field key is recorded as a tag only.
    pub fn meta_for(&self, columns: &[String]) -> Meta {
        let mut meta = Meta::default();

        for (index, column) in columns.iter().enumerate().skip(1) {
            if self.tag_keys.contains(column) {
                meta.tags.insert(index.to_string(), column.clone());
            } else if let Some(field) = self.field_keys.iter().find(|f| &f.name == column) {
                meta.fields
                    .insert(index, FieldMeta::new(&field.name, &field.field_type));
            }
        }

        meta
    }
}
