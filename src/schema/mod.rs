//! Schema inference for dataset partitions.
//!
//! Maps physical column types read from Parquet footers to graph column
//! types, probes table partitions for their column lists, and enumerates the
//! logical table names stored in a discriminator column.

mod names;
mod probe;
mod types;

use serde::Serialize;

pub use names::{enumerate_table_names, table_name_from_value};
pub use probe::{probe_schema, read_arrow_schema, ENDPOINT_COLUMNS};
pub use types::{map_type, GraphType, PhysicalType};

/// Kind of graph table a partition populates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Entity table keyed by a primary key.
    Node,
    /// Edge table between node tables.
    Relationship,
}

/// One column of a probed table schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Type read from the data file.
    pub physical: PhysicalType,
    /// Graph column type.
    pub target: GraphType,
}

impl ColumnSchema {
    /// Builds a column, deriving its graph type from the physical type.
    pub fn new(name: impl Into<String>, physical: PhysicalType) -> Self {
        Self {
            name: name.into(),
            physical,
            target: physical.graph_type(),
        }
    }
}
