//! Loads partitioned Parquet property-graph datasets into a graph database.
//!
//! The pipeline infers each table's schema from its data files, generates
//! the node and relationship DDL, and bulk loads every table in an order
//! that keeps relationship endpoints resolvable.

#![warn(missing_docs)]

pub mod cli;
pub mod ddl;
pub mod error;
pub mod exec;
pub mod ingest;
pub mod layout;
pub mod options;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

pub use ddl::TableDescriptor;
pub use error::{IngestError, Result};
pub use exec::{Connection, ExecError, RetryExecutor, RetryOutcome, RetryPolicy};
pub use ingest::{ingest, plan_dataset, IngestSummary, IngestionPlan, Ingestor};
pub use options::IngestOptions;
pub use schema::{ColumnSchema, GraphType, PhysicalType, TableKind};
