//! Error type shared by discovery, planning and execution.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::exec::ExecError;

/// Error type for discovery, planning and ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A column's physical type has no entry in the type mapping.
    #[error("unsupported type '{found}' for column '{column}'")]
    UnsupportedType {
        /// Column carrying the type, empty when mapping a bare type name.
        column: String,
        /// The physical type as read from the file.
        found: String,
    },
    /// A node table's primary-key column is absent from its probed schema.
    #[error("primary key '{key}' not found in schema of node table '{table}'")]
    MissingPrimaryKey {
        /// Node table name.
        table: String,
        /// The configured primary-key column.
        key: String,
    },
    /// No data file was found where one was required.
    #[error("no data files found under {}", .0.display())]
    EmptyPartition(PathBuf),
    /// A data file lacks the column the enumerator was asked to project.
    #[error("column '{column}' not found in {}", .path.display())]
    MissingColumn {
        /// File that was read.
        path: PathBuf,
        /// Requested column.
        column: String,
    },
    /// A relationship sub-directory name is not of the form `<from>_<to>`.
    #[error("relationship table '{table}' has malformed endpoint directory '{dir}'")]
    InvalidEndpointPair {
        /// Relationship table name.
        table: String,
        /// Offending directory name.
        dir: String,
    },
    /// A relationship table has no endpoint-pair sub-directories.
    #[error("relationship table '{0}' has no endpoint pair directories")]
    NoEndpointPairs(String),
    /// Parquet decoding failure.
    #[error("failed to read parquet file {}: {source}", .path.display())]
    Parquet {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: parquet::errors::ParquetError,
    },
    /// Arrow conversion failure.
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    /// Filesystem failure.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A statement failed with an unclassified error.
    #[error("statement failed: {statement}: {source}")]
    Execution {
        /// Statement text.
        statement: String,
        /// Database error.
        source: ExecError,
    },
    /// A statement kept failing on key visibility until the attempt budget ran out.
    #[error("statement failed after {attempts} attempts: {statement}: {source}")]
    RetriesExhausted {
        /// Statement text.
        statement: String,
        /// Attempts performed.
        attempts: u32,
        /// Last database error.
        source: ExecError,
    },
    /// An ingestion plan violates the creation/load ordering invariants.
    #[error("invalid ingestion plan: {0}")]
    PlanOrdering(String),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn parquet(path: impl AsRef<Path>, source: parquet::errors::ParquetError) -> Self {
        IngestError::Parquet {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
