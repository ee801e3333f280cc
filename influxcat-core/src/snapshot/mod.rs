//! Snapshot document reading and writing
//!
//! - `format`: the record types and their JSON layout
//! - `writer`: SnapshotWriter for dumping one record
//! - `reader`: SnapshotReader for streaming records back

pub mod format;
pub mod reader;
pub mod writer;

pub use format::*;
pub use reader::*;
pub use writer::*;
