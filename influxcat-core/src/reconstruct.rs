//! Typed reconstruction of snapshot rows into points

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::client::Point;
use crate::error::{InfluxcatError, Result};
use crate::snapshot::Series;
use crate::value::{FieldType, RawValue};

/// Outcome of reconstructing one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub points: Vec<Point>,
    /// Non-null values that sat in a column mapped neither as tag nor field
    pub dropped_values: usize,
    /// Indices of the columns those values came from
    pub unmapped_columns: BTreeSet<usize>,
}

/// Converts the rows of one decoded record into points
pub struct ValueReconstructor<'a> {
    series: &'a Series,
}

impl<'a> ValueReconstructor<'a> {
    pub fn new(series: &'a Series) -> Self {
        Self { series }
    }

    /// Convert every row. The first malformed row aborts the whole record.
    pub fn reconstruct(&self) -> Result<Reconstruction> {
        let mut out = Reconstruction {
            points: Vec::with_capacity(self.series.values.len()),
            ..Default::default()
        };

        for row in &self.series.values {
            let point = self.convert_row(row, &mut out)?;
            out.points.push(point);
        }

        if out.dropped_values > 0 {
            warn!(
                "Dropped {} values from {} in columns {:?} that are neither tags nor fields",
                out.dropped_values, self.series.name, out.unmapped_columns
            );
        }

        Ok(out)
    }

    fn convert_row(&self, row: &[RawValue], out: &mut Reconstruction) -> Result<Point> {
        let timestamp = match row.first() {
            Some(value) => value.to_timestamp()?,
            None => {
                return Err(InfluxcatError::TimestampFormatError {
                    value: String::new(),
                    reason: "row has no time column".to_string(),
                })
            }
        };

        let meta = &self.series.meta;
        let mut tags = BTreeMap::new();
        let mut fields = BTreeMap::new();

        for (index, value) in row.iter().enumerate().skip(1) {
            if let Some(field) = meta.field_at(index) {
                let field_type: FieldType = field.field_type().parse().map_err(|_| {
                    InfluxcatError::UnknownFieldTypeError {
                        field_type: field.field_type().to_string(),
                        value: value.to_string(),
                    }
                })?;
                if value.is_null() {
                    continue;
                }
                fields.insert(field.name().to_string(), field_type.convert(field.name(), value)?);
            } else if let Some(tag) = meta.tag_at(index) {
                match value {
                    RawValue::Null => {}
                    RawValue::String(s) => {
                        tags.insert(tag.to_string(), s.clone());
                    }
                    other => {
                        return Err(InfluxcatError::TypeMismatchError {
                            column: tag.to_string(),
                            expected: "string".to_string(),
                            found: format!("{} {}", other.kind(), other),
                        })
                    }
                }
            } else if !value.is_null() {
                out.dropped_values += 1;
                out.unmapped_columns.insert(index);
            }
        }

        Ok(Point {
            measurement: self.series.name.clone(),
            tags,
            fields,
            timestamp,
        })
    }
}
