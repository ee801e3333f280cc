//! influxcat core - schema-preserving snapshots of a single InfluxDB measurement
//!
//! This crate provides:
//! - Value typing rules shared by both directions
//! - Tag and field key discovery (`SchemaProbe`)
//! - Record shaping for dumps (`RowProjector`)
//! - The snapshot document format (`SnapshotWriter` / `SnapshotReader`)
//! - Typed reconstruction for restores (`ValueReconstructor`)
//! - The dump and restore pipelines over the `QueryExecutor` / `WriteSink` traits

pub mod client;
pub mod dump;
pub mod error;
pub mod projector;
pub mod reconstruct;
pub mod restore;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use client::{BatchPoints, Point, QueryExecutor, QueryResult, SeriesRow, WriteSink};
pub use dump::{dump, validate_args};
pub use error::{InfluxcatError, Result};
pub use projector::RowProjector;
pub use reconstruct::{Reconstruction, ValueReconstructor};
pub use restore::{restore, RestoreStats};
pub use schema::{FieldKey, SchemaProbe, TagKey};
pub use snapshot::{FieldMeta, Meta, Series, SnapshotReader, SnapshotWriter};
pub use value::{FieldType, FieldValue, RawValue};
