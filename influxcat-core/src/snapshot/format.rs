//! Snapshot file format definitions
//!
//! A snapshot is a JSON array holding one record per measurement:
//!
//! ```json
//! [
//!   {
//!     "name": "cpu_load",
//!     "columns": ["time", "host", "region", "value"],
//!     "values": [["2023-01-01T00:00:00Z", "h1", "us-east", 0.42]],
//!     "_meta": {
//!       "fields": {"3": ["value", "float"]},
//!       "tags": {"1": "host", "2": "region"}
//!     }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::RawValue;

/// One measurement with the metadata needed to retype its rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<RawValue>>,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

/// Column index to tag/field mappings. Index 0 (time) never appears in either map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub fields: BTreeMap<usize, FieldMeta>,
    /// Keyed by the column index rendered as a string
    pub tags: BTreeMap<String, String>,
}

/// `[field name, declared type]`, serialized as a two element array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta(pub String, pub String);

impl FieldMeta {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self(name.into(), field_type.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn field_type(&self) -> &str {
        &self.1
    }
}

impl Meta {
    pub fn tag_at(&self, index: usize) -> Option<&str> {
        self.tags.get(&index.to_string()).map(String::as_str)
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(&index)
    }
}
