//! Graph DDL and bulk-load statement text.

use std::path::Path;

use serde::Serialize;

use crate::error::{IngestError, Result};
use crate::layout::EndpointPair;
use crate::schema::{ColumnSchema, TableKind};

/// Everything needed to create one graph table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Node or relationship.
    pub kind: TableKind,
    /// Payload columns in probed order.
    pub columns: Vec<ColumnSchema>,
    /// Primary-key column, for node tables.
    pub primary_key: Option<String>,
    /// Endpoint combinations, for relationship tables.
    pub endpoint_pairs: Vec<EndpointPair>,
}

impl TableDescriptor {
    /// Describes a node table.
    pub fn node(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Node,
            columns,
            primary_key: Some(primary_key.into()),
            endpoint_pairs: Vec::new(),
        }
    }

    /// Describes a relationship table.
    pub fn relationship(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        endpoint_pairs: Vec<EndpointPair>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Relationship,
            columns,
            primary_key: None,
            endpoint_pairs,
        }
    }

    /// Whether this relationship is created as a table group.
    pub fn is_group(&self) -> bool {
        self.kind == TableKind::Relationship && self.endpoint_pairs.len() > 1
    }
}

/// Generates the `CREATE` statement for a table.
///
/// # Errors
///
/// Node tables fail with [`IngestError::MissingPrimaryKey`] when the key is
/// unset or not among the probed columns. Relationship tables without an
/// endpoint pair fail with [`IngestError::NoEndpointPairs`].
pub fn create_statement(table: &TableDescriptor) -> Result<String> {
    match table.kind {
        TableKind::Node => create_node_statement(table),
        TableKind::Relationship => create_rel_statement(table),
    }
}

fn create_node_statement(table: &TableDescriptor) -> Result<String> {
    let key = table
        .primary_key
        .as_deref()
        .filter(|key| table.columns.iter().any(|col| col.name == *key))
        .ok_or_else(|| IngestError::MissingPrimaryKey {
            table: table.name.clone(),
            key: table.primary_key.clone().unwrap_or_default(),
        })?;
    Ok(format!(
        "CREATE NODE TABLE {}({}, PRIMARY KEY ({}))",
        table.name,
        column_list(&table.columns),
        key
    ))
}

fn create_rel_statement(table: &TableDescriptor) -> Result<String> {
    if table.endpoint_pairs.is_empty() {
        return Err(IngestError::NoEndpointPairs(table.name.clone()));
    }
    let head = if table.is_group() {
        "CREATE REL TABLE GROUP"
    } else {
        "CREATE REL TABLE"
    };
    let mut body: Vec<String> = table
        .endpoint_pairs
        .iter()
        .map(|pair| format!("FROM {} TO {}", pair.from, pair.to))
        .collect();
    if !table.columns.is_empty() {
        body.push(column_list(&table.columns));
    }
    Ok(format!("{head} {} ({})", table.name, body.join(", ")))
}

fn column_list(columns: &[ColumnSchema]) -> String {
    columns
        .iter()
        .map(|col| format!("{} {}", col.name, col.target))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `DROP TABLE <name>`
pub fn drop_statement(table: &str) -> String {
    format!("DROP TABLE {table}")
}

/// Wildcard bulk load of every `*.<extension>` file directly under `dir`.
pub fn copy_statement(target: &str, dir: &Path, extension: &str) -> String {
    format!(
        "COPY {} FROM \"{}/*.{}\"",
        target,
        dir.display(),
        extension
    )
}

/// Name of the group member table backing one endpoint directory.
pub fn group_member_name(table: &str, pair_dir: &str) -> String {
    format!("{table}_{pair_dir}")
}
