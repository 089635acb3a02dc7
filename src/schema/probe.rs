use std::fs::File;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::layout::first_data_file;
use crate::schema::{ColumnSchema, PhysicalType, TableKind};

/// Number of leading relationship columns holding the endpoint identifiers.
pub const ENDPOINT_COLUMNS: usize = 2;

/// Infers the column schema of a table partition from its first data file.
///
/// Relationship partitions drop their two leading endpoint columns.
pub fn probe_schema(partition: &Path, kind: TableKind, extension: &str) -> Result<Vec<ColumnSchema>> {
    let file = first_data_file(partition, extension)?
        .ok_or_else(|| IngestError::EmptyPartition(partition.to_path_buf()))?;
    debug!(file = %file.display(), ?kind, "schema.probe");
    let schema = read_arrow_schema(&file)?;
    let skip = match kind {
        TableKind::Node => 0,
        TableKind::Relationship => ENDPOINT_COLUMNS,
    };
    schema
        .fields()
        .iter()
        .skip(skip)
        .map(|field| {
            let physical = PhysicalType::from_arrow(field.name(), field.data_type())?;
            Ok(ColumnSchema::new(field.name().clone(), physical))
        })
        .collect()
}

/// Reads the Arrow schema from a Parquet footer without decoding row groups.
pub fn read_arrow_schema(path: &Path) -> Result<SchemaRef> {
    let file = File::open(path).map_err(|err| IngestError::io(path, err))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|err| IngestError::parquet(path, err))?;
    Ok(builder.schema().clone())
}
