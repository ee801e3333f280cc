//! Collaborator interfaces for the database the snapshot is taken from or restored into
//!
//! The core never talks to a network itself. Dump reads through a [`QueryExecutor`]
//! and restore writes through a [`WriteSink`]; the `influxcat` crate provides the
//! HTTP implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::value::{FieldValue, RawValue};

/// Result of one statement
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub statement_id: u32,
    #[serde(default)]
    pub series: Vec<SeriesRow>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One named series inside a statement result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<RawValue>>,
    /// Set on every chunk of a chunked response except the last one of the series
    #[serde(default)]
    pub partial: bool,
}

/// Executes statements against a database
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `statement` against `database`.
    ///
    /// Implementations return [`crate::InfluxcatError::ConnectionError`] when the
    /// database cannot be reached and [`crate::InfluxcatError::QueryError`] when the
    /// statement is rejected or any result carries an error payload.
    async fn execute(&self, statement: &str, database: &str) -> Result<Vec<QueryResult>>;
}

/// One row ready to be written back
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

/// Points submitted to a [`WriteSink`] in a single request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPoints {
    pub database: String,
    pub points: Vec<Point>,
}

impl BatchPoints {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Commits batches of points
#[async_trait]
pub trait WriteSink: Send + Sync {
    /// Commit every point of `batch` as one request.
    ///
    /// Fails with [`crate::InfluxcatError::WriteError`] when a point is malformed or
    /// the database rejects the write.
    async fn write(&self, batch: BatchPoints) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_decodes_influx_payload() {
        let payload = r#"{
            "statement_id": 0,
            "series": [{
                "name": "cpu_load",
                "columns": ["time", "host", "value"],
                "values": [["2023-01-01T00:00:00Z", "h1", 0.42]]
            }]
        }"#;

        let result: QueryResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.statement_id, 0);
        assert!(result.error.is_none());

        let series = &result.series[0];
        assert_eq!(series.name, "cpu_load");
        assert_eq!(series.columns, vec!["time", "host", "value"]);
        assert_eq!(series.values[0][2], RawValue::Float(0.42));
        assert!(!series.partial);
    }

    #[test]
    fn test_query_result_without_series() {
        let result: QueryResult = serde_json::from_str(r#"{"statement_id": 0}"#).unwrap();
        assert!(result.series.is_empty());

        let result: QueryResult =
            serde_json::from_str(r#"{"statement_id": 0, "error": "database not found: x"}"#)
                .unwrap();
        assert_eq!(result.error.as_deref(), Some("database not found: x"));
    }
}
