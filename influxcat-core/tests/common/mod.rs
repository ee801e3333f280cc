//! In-memory database used by the integration tests
//!
//! Answers the three statements the dump pipeline issues and records every batch
//! written to it. Columns of `SELECT *` come back as time, then tag keys, then
//! field keys, each group sorted by name.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use influxcat_core::value::{format_timestamp, parse_timestamp};
use influxcat_core::{
    BatchPoints, FieldValue, InfluxcatError, Point, QueryExecutor, QueryResult, RawValue,
    Result, SeriesRow, WriteSink,
};

#[derive(Default)]
struct State {
    points: Vec<Point>,
    batches: Vec<BatchPoints>,
    statements: Vec<String>,
}

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
    /// Declared type overrides reported by SHOW FIELD KEYS
    declared_types: BTreeMap<String, String>,
    pub hide_field_keys: bool,
    pub unreachable: bool,
    pub reject_writes: bool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<Point>) -> Self {
        let db = Self::new();
        db.state.lock().unwrap().points = points;
        db
    }

    pub fn declare_type(mut self, field: &str, field_type: &str) -> Self {
        self.declared_types
            .insert(field.to_string(), field_type.to_string());
        self
    }

    pub fn points(&self) -> Vec<Point> {
        self.state.lock().unwrap().points.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().batches.len()
    }

    pub fn batches(&self) -> Vec<BatchPoints> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    fn tag_keys_by_measurement(points: &[Point]) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for p in points {
            let keys = out.entry(p.measurement.clone()).or_default();
            keys.extend(p.tags.keys().cloned());
        }
        out
    }

    fn show_tag_keys(points: &[Point]) -> QueryResult {
        let series = Self::tag_keys_by_measurement(points)
            .into_iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(name, keys)| SeriesRow {
                name,
                columns: vec!["tagKey".to_string()],
                values: keys.into_iter().map(|k| vec![RawValue::String(k)]).collect(),
                ..Default::default()
            })
            .collect();
        QueryResult {
            series,
            ..Default::default()
        }
    }

    fn show_field_keys(&self, points: &[Point]) -> QueryResult {
        let mut by_measurement: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for p in points {
            let fields = by_measurement.entry(p.measurement.clone()).or_default();
            for (name, value) in &p.fields {
                let declared = self
                    .declared_types
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| value.field_type().to_string());
                fields.insert(name.clone(), declared);
            }
        }

        let series = by_measurement
            .into_iter()
            .map(|(name, fields)| SeriesRow {
                name,
                columns: vec!["fieldKey".to_string(), "fieldType".to_string()],
                values: fields
                    .into_iter()
                    .map(|(k, t)| vec![RawValue::String(k), RawValue::String(t)])
                    .collect(),
                ..Default::default()
            })
            .collect();
        QueryResult {
            series,
            ..Default::default()
        }
    }

    fn select_all(points: &[Point], measurement: &str) -> QueryResult {
        let mut rows: Vec<&Point> = points.iter().filter(|p| p.measurement == measurement).collect();
        if rows.is_empty() {
            return QueryResult::default();
        }
        rows.sort_by_key(|p| p.timestamp);

        let tag_keys: BTreeSet<&String> = rows.iter().flat_map(|p| p.tags.keys()).collect();
        let field_keys: BTreeSet<&String> = rows.iter().flat_map(|p| p.fields.keys()).collect();

        let mut columns = vec!["time".to_string()];
        columns.extend(tag_keys.iter().map(|k| k.to_string()));
        columns.extend(field_keys.iter().map(|k| k.to_string()));

        let values = rows
            .iter()
            .map(|p| {
                let mut row = vec![RawValue::String(format_timestamp(&p.timestamp))];
                for key in &tag_keys {
                    row.push(
                        p.tags
                            .get(*key)
                            .map(|v| RawValue::String(v.clone()))
                            .unwrap_or(RawValue::Null),
                    );
                }
                for key in &field_keys {
                    row.push(
                        p.fields
                            .get(*key)
                            .map(|v| RawValue::from(v.clone()))
                            .unwrap_or(RawValue::Null),
                    );
                }
                row
            })
            .collect();

        QueryResult {
            series: vec![SeriesRow {
                name: measurement.to_string(),
                columns,
                values,
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

#[async_trait]
impl QueryExecutor for MemoryDatabase {
    async fn execute(&self, statement: &str, _database: &str) -> Result<Vec<QueryResult>> {
        if self.unreachable {
            return Err(InfluxcatError::ConnectionError(
                "dial tcp 127.0.0.1:8086: connection refused".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.to_string());

        let result = match statement {
            "SHOW TAG KEYS" => Self::show_tag_keys(&state.points),
            "SHOW FIELD KEYS" if self.hide_field_keys => QueryResult::default(),
            "SHOW FIELD KEYS" => self.show_field_keys(&state.points),
            other => match other
                .strip_prefix("SELECT * FROM \"")
                .and_then(|rest| rest.strip_suffix('"'))
            {
                Some(measurement) => Self::select_all(&state.points, measurement),
                None => {
                    return Err(InfluxcatError::QueryError(format!(
                        "error parsing query: {}",
                        other
                    )))
                }
            },
        };
        Ok(vec![result])
    }
}

#[async_trait]
impl WriteSink for MemoryDatabase {
    async fn write(&self, batch: BatchPoints) -> Result<()> {
        if self.reject_writes {
            return Err(InfluxcatError::WriteError(
                "partial write: field type conflict".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        state.points.extend(batch.points.iter().cloned());
        state.batches.push(batch);
        Ok(())
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    parse_timestamp(s).unwrap()
}

pub fn point(
    measurement: &str,
    time: &str,
    tags: &[(&str, &str)],
    fields: &[(&str, FieldValue)],
) -> Point {
    Point {
        measurement: measurement.to_string(),
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        timestamp: ts(time),
    }
}
