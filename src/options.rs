//! Options for discovery and statement execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::exec::{RetryPolicy, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};

/// Options controlling dataset discovery and statement execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Partition directory holding node tables.
    pub node_dir: String,
    /// Partition directory holding relationship tables.
    pub edge_dir: String,
    /// Column whose values name the node tables.
    pub node_discriminator: String,
    /// Column whose values name the relationship tables.
    pub edge_discriminator: String,
    /// Primary-key column of every node table.
    pub primary_key: String,
    /// Data file extension, without the dot.
    pub file_extension: String,
    /// Separator between a namespace prefix and the table name in
    /// discriminator values. Empty keeps values verbatim.
    pub namespace_separator: String,
    /// Attempts per statement.
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            node_dir: "nodes".into(),
            edge_dir: "edges".into(),
            node_discriminator: "category".into(),
            edge_discriminator: "predicate".into(),
            primary_key: "id".into(),
            file_extension: "parquet".into(),
            namespace_separator: ":".into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF.as_millis() as u64,
        }
    }
}

impl IngestOptions {
    /// Retry policy derived from these options.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}
