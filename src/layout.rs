//! On-disk dataset layout.
//!
//! ```text
//! <root>/nodes/<table>/*.parquet
//! <root>/edges/<table>/<from>_<to>/*.parquet
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{IngestError, Result};

/// Source and target node table of a relationship sub-partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointPair {
    /// Source node table.
    pub from: String,
    /// Target node table.
    pub to: String,
}

impl EndpointPair {
    /// Creates a pair from its endpoint table names.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parses a `<from>_<to>` directory name.
    ///
    /// Splits on the first underscore, so endpoint table names other than the
    /// last cannot contain one.
    pub fn parse(dir_name: &str) -> Option<Self> {
        let (from, to) = dir_name.split_once('_')?;
        if from.is_empty() || to.is_empty() {
            return None;
        }
        Some(Self::new(from, to))
    }
}

impl fmt::Display for EndpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

/// Directory holding the files of one node table or of one relationship
/// endpoint combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubPartition {
    /// Directory containing the data files.
    pub path: PathBuf,
    /// Endpoint pair, for relationship sub-partitions.
    pub pair: Option<EndpointPair>,
    /// Directory name the pair was parsed from.
    pub pair_dir: Option<String>,
}

impl SubPartition {
    /// A node table directory.
    pub fn node(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pair: None,
            pair_dir: None,
        }
    }

    /// A relationship endpoint directory.
    pub fn relationship(path: impl Into<PathBuf>, dir: impl Into<String>, pair: EndpointPair) -> Self {
        Self {
            path: path.into(),
            pair: Some(pair),
            pair_dir: Some(dir.into()),
        }
    }
}

/// Returns every file under `dir` with the given extension, depth-first with
/// entries visited in name order. A missing directory yields no files.
///
/// Symbolic links are not followed.
pub fn data_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// First data file under `dir` in [`data_files`] order.
pub fn first_data_file(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    Ok(data_files(dir, extension)?.into_iter().next())
}

/// Immediate sub-directories of `dir`, sorted by name.
pub fn sub_directories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        if entry.file_type().is_dir() {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

fn walk_error(root: &Path, err: walkdir::Error) -> IngestError {
    let path = err.path().unwrap_or(root).to_path_buf();
    IngestError::io(path, io::Error::from(err))
}

/// Lists the endpoint-pair sub-partitions of a relationship table directory.
///
/// Every pair directory must hold at least one data file.
pub fn endpoint_partitions(table: &str, dir: &Path, extension: &str) -> Result<Vec<SubPartition>> {
    let mut parts = Vec::new();
    for path in sub_directories(dir)? {
        let name = dir_name(&path);
        let pair = EndpointPair::parse(&name).ok_or_else(|| IngestError::InvalidEndpointPair {
            table: table.to_string(),
            dir: name.clone(),
        })?;
        if first_data_file(&path, extension)?.is_none() {
            return Err(IngestError::EmptyPartition(path));
        }
        parts.push(SubPartition::relationship(path, name, pair));
    }
    if parts.is_empty() {
        return Err(IngestError::NoEndpointPairs(table.to_string()));
    }
    Ok(parts)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
