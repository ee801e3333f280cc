//! Snapshot writer implementation

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::Series;
use crate::error::{InfluxcatError, Result};

/// Serializes a single record as a snapshot document
pub struct SnapshotWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl SnapshotWriter<BufWriter<File>> {
    /// Create (or truncate) a snapshot file
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Indent the output for human readers
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write `[series]`, flush, and hand back the underlying writer
    pub fn write_snapshot(mut self, series: &Series) -> Result<W> {
        let document = std::slice::from_ref(series);

        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, document)
        } else {
            serde_json::to_writer(&mut self.writer, document)
        };
        written.map_err(|e| {
            if e.is_io() {
                InfluxcatError::IoError(e.into())
            } else {
                InfluxcatError::FormatError(e.to_string())
            }
        })?;

        if self.pretty {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;

        debug!(
            "Wrote snapshot record {} ({} rows)",
            series.name,
            series.values.len()
        );
        Ok(self.writer)
    }
}
