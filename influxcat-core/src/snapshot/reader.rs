//! Snapshot reader implementation
//!
//! The document is consumed one record at a time so value sets larger than memory
//! can be decoded. Only the array punctuation is handled here; each record object is
//! handed to serde_json directly from the underlying reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::Series;
use crate::error::{InfluxcatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Nothing consumed yet
    Start,
    /// After `[`
    First,
    /// After a record
    Next,
    Finished,
}

/// Streaming reader over a snapshot document
pub struct SnapshotReader<R: BufRead> {
    reader: R,
    state: ReadState,
    records_read: usize,
}

impl SnapshotReader<BufReader<File>> {
    /// Open a snapshot file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SnapshotReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ReadState::Start,
            records_read: 0,
        }
    }

    /// Number of records decoded so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Decode the next record, or `None` once the closing bracket has been read
    pub fn next_series(&mut self) -> Result<Option<Series>> {
        let result = self.advance();
        if result.is_err() {
            self.state = ReadState::Finished;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Series>> {
        match self.state {
            ReadState::Finished => Ok(None),
            ReadState::Start => {
                self.skip_whitespace()?;
                match self.peek_byte()? {
                    Some(b'[') => self.reader.consume(1),
                    Some(other) => {
                        return Err(InfluxcatError::FormatError(format!(
                            "expected opening bracket, found {:?}",
                            other as char
                        )))
                    }
                    None => {
                        return Err(InfluxcatError::FormatError(
                            "missing opening bracket: snapshot is empty".to_string(),
                        ))
                    }
                }
                self.state = ReadState::First;
                self.advance()
            }
            ReadState::First => {
                self.skip_whitespace()?;
                if self.peek_byte()? == Some(b']') {
                    self.reader.consume(1);
                    return self.finish();
                }
                self.decode_record().map(Some)
            }
            ReadState::Next => {
                self.skip_whitespace()?;
                match self.peek_byte()? {
                    Some(b']') => {
                        self.reader.consume(1);
                        self.finish()
                    }
                    Some(b',') => {
                        self.reader.consume(1);
                        self.skip_whitespace()?;
                        self.decode_record().map(Some)
                    }
                    Some(other) => Err(InfluxcatError::FormatError(format!(
                        "expected ',' or ']' after record {}, found {:?}",
                        self.records_read, other as char
                    ))),
                    None => Err(InfluxcatError::FormatError(
                        "missing closing bracket".to_string(),
                    )),
                }
            }
        }
    }

    fn decode_record(&mut self) -> Result<Series> {
        if self.peek_byte()?.is_none() {
            return Err(InfluxcatError::FormatError(
                "missing closing bracket".to_string(),
            ));
        }

        let index = self.records_read;
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        let series = Series::deserialize(&mut de).map_err(|e| {
            if e.is_io() {
                InfluxcatError::IoError(e.into())
            } else {
                InfluxcatError::FormatError(format!("record {} is malformed: {}", index, e))
            }
        })?;

        self.records_read += 1;
        self.state = ReadState::Next;
        debug!(
            "Decoded snapshot record {} ({} rows)",
            series.name,
            series.values.len()
        );
        Ok(series)
    }

    fn finish(&mut self) -> Result<Option<Series>> {
        self.skip_whitespace()?;
        if let Some(other) = self.peek_byte()? {
            return Err(InfluxcatError::FormatError(format!(
                "unexpected {:?} after closing bracket",
                other as char
            )));
        }
        self.state = ReadState::Finished;
        Ok(None)
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let skipped = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            let exhausted = skipped == buf.len();
            self.reader.consume(skipped);
            if !exhausted {
                return Ok(());
            }
        }
    }
}

impl<R: BufRead> Iterator for SnapshotReader<R> {
    type Item = Result<Series>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_series().transpose()
    }
}
