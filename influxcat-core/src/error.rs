//! Error types shared by the dump and restore pipelines

/// Result alias used across the core crate
pub type Result<T> = std::result::Result<T, InfluxcatError>;

/// Every failure the core can report. None of them is recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum InfluxcatError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Empty result: {0}")]
    EmptyResultError(String),

    #[error("Snapshot format error: {0}")]
    FormatError(String),

    #[error("Invalid timestamp {value:?}: {reason}")]
    TimestampFormatError { value: String, reason: String },

    #[error("Unknown data type {field_type:?} for value {value}")]
    UnknownFieldTypeError { field_type: String, value: String },

    #[error("Type mismatch in column {column:?}: expected {expected}, found {found}")]
    TypeMismatchError {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InfluxcatError {
    /// Short name of the pipeline stage that failed, used in user-facing messages
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => "connect",
            Self::QueryError(_) | Self::EmptyResultError(_) => "query",
            Self::FormatError(_) | Self::IoError(_) => "snapshot",
            Self::TimestampFormatError { .. }
            | Self::UnknownFieldTypeError { .. }
            | Self::TypeMismatchError { .. } => "reconstruct",
            Self::WriteError(_) => "write",
            Self::InvalidArgument(_) => "arguments",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = InfluxcatError::UnknownFieldTypeError {
            field_type: "duration".to_string(),
            value: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown data type \"duration\" for value 42");
        assert_eq!(err.stage(), "reconstruct");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: InfluxcatError = io.into();
        assert!(matches!(err, InfluxcatError::IoError(_)));
        assert_eq!(err.stage(), "snapshot");
    }
}
