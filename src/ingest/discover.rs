use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::ddl::TableDescriptor;
use crate::error::Result;
use crate::layout::{endpoint_partitions, SubPartition};
use crate::options::IngestOptions;
use crate::schema::{enumerate_table_names, probe_schema, table_name_from_value, TableKind};

/// A discovered table and where its data lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableSource {
    /// Table definition inferred from the data.
    pub descriptor: TableDescriptor,
    /// Table directory.
    pub location: PathBuf,
    /// Directories to bulk load, in load order.
    pub partitions: Vec<SubPartition>,
}

impl TableSource {
    /// Table name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Table kind.
    pub fn kind(&self) -> TableKind {
        self.descriptor.kind
    }
}

/// Discovers every node table, then every relationship table, under `root`.
pub fn discover(root: &Path, opts: &IngestOptions) -> Result<Vec<TableSource>> {
    let mut sources = discover_nodes(&root.join(&opts.node_dir), opts)?;
    sources.extend(discover_relationships(&root.join(&opts.edge_dir), opts)?);
    info!(
        root = %root.display(),
        tables = sources.len(),
        "ingest.discover"
    );
    Ok(sources)
}

fn discover_nodes(partition: &Path, opts: &IngestOptions) -> Result<Vec<TableSource>> {
    let mut out = Vec::new();
    for name in table_names(partition, &opts.node_discriminator, opts)? {
        let location = partition.join(&name);
        let columns = probe_schema(&location, TableKind::Node, &opts.file_extension)?;
        debug!(table = %name, columns = columns.len(), "ingest.discover.node");
        out.push(TableSource {
            descriptor: TableDescriptor::node(name, columns, opts.primary_key.clone()),
            partitions: vec![SubPartition::node(location.clone())],
            location,
        });
    }
    Ok(out)
}

fn discover_relationships(partition: &Path, opts: &IngestOptions) -> Result<Vec<TableSource>> {
    let mut out = Vec::new();
    for name in table_names(partition, &opts.edge_discriminator, opts)? {
        let location = partition.join(&name);
        let partitions = endpoint_partitions(&name, &location, &opts.file_extension)?;
        let columns = probe_schema(&location, TableKind::Relationship, &opts.file_extension)?;
        let pairs = partitions
            .iter()
            .filter_map(|part| part.pair.clone())
            .collect();
        debug!(
            table = %name,
            columns = columns.len(),
            pairs = partitions.len(),
            "ingest.discover.relationship"
        );
        out.push(TableSource {
            descriptor: TableDescriptor::relationship(name, columns, pairs),
            location,
            partitions,
        });
    }
    Ok(out)
}

fn table_names(partition: &Path, column: &str, opts: &IngestOptions) -> Result<Vec<String>> {
    let names: BTreeSet<String> = enumerate_table_names(partition, column, &opts.file_extension)?
        .iter()
        .map(|value| table_name_from_value(value, &opts.namespace_separator))
        .collect();
    Ok(names.into_iter().collect())
}
