use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::layout::data_files;

/// Collects the distinct values of `column` across every data file of a
/// partition. Only that column is decoded.
///
/// A missing or empty partition yields an empty set.
pub fn enumerate_table_names(
    partition: &Path,
    column: &str,
    extension: &str,
) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for file in data_files(partition, extension)? {
        collect_distinct(&file, column, &mut names)?;
    }
    debug!(
        partition = %partition.display(),
        column,
        distinct = names.len(),
        "schema.enumerate"
    );
    Ok(names)
}

fn collect_distinct(path: &Path, column: &str, out: &mut BTreeSet<String>) -> Result<()> {
    let file = File::open(path).map_err(|err| IngestError::io(path, err))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|err| IngestError::parquet(path, err))?;
    let root = builder
        .schema()
        .fields()
        .iter()
        .position(|field| field.name() == column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [root]);
    let reader = builder
        .with_projection(mask)
        .build()
        .map_err(|err| IngestError::parquet(path, err))?;

    for batch in reader {
        let batch = batch?;
        let values = cast(batch.column(0), &DataType::Utf8)?;
        let values = values.as_string::<i32>();
        for idx in 0..values.len() {
            if values.is_valid(idx) {
                let value = values.value(idx);
                if !out.contains(value) {
                    out.insert(value.to_string());
                }
            }
        }
    }
    Ok(())
}

/// Derives a graph-safe table name from a discriminator value by dropping a
/// namespace prefix such as `biolink:`.
pub fn table_name_from_value(value: &str, separator: &str) -> String {
    if separator.is_empty() {
        return value.to_string();
    }
    match value.split_once(separator) {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => value.to_string(),
    }
}
