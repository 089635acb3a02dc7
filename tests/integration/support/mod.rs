#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use graphload::exec::{Connection, ExecError};
use parquet::arrow::ArrowWriter;

pub fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    let batch = RecordBatch::try_from_iter(columns).expect("record batch");
    let file = File::create(path).expect("create parquet file");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("writer");
    writer.write(&batch).expect("write batch");
    writer.close().expect("close writer");
}

pub fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

pub fn ints(values: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

pub fn floats(values: &[f64]) -> ArrayRef {
    Arc::new(Float64Array::from(values.to_vec()))
}

/// Two node tables, a single-pair relationship and a grouped relationship:
///
/// ```text
/// nodes/Gene, nodes/Disease
/// edges/related_to/Gene_Disease
/// edges/interacts_with/{Gene_Disease,Gene_Gene}
/// ```
pub fn sample_dataset(root: &Path) {
    write_parquet(
        &root.join("nodes/Gene/part-0.parquet"),
        vec![
            ("id", strings(&["HGNC:1", "HGNC:2"])),
            ("name", strings(&["BRCA1", "TP53"])),
            ("category", strings(&["biolink:Gene", "biolink:Gene"])),
            ("length", ints(&[81_189, 19_149])),
        ],
    );
    write_parquet(
        &root.join("nodes/Disease/part-0.parquet"),
        vec![
            ("id", strings(&["MONDO:1"])),
            ("name", strings(&["cancer"])),
            ("category", strings(&["biolink:Disease"])),
            ("length", ints(&[0])),
        ],
    );
    write_parquet(
        &root.join("edges/related_to/Gene_Disease/part-0.parquet"),
        vec![
            ("subject", strings(&["HGNC:1"])),
            ("object", strings(&["MONDO:1"])),
            ("predicate", strings(&["biolink:related_to"])),
            ("score", floats(&[0.9])),
        ],
    );
    for (dir, object) in [("Gene_Disease", "MONDO:1"), ("Gene_Gene", "HGNC:2")] {
        write_parquet(
            &root.join("edges/interacts_with").join(dir).join("part-0.parquet"),
            vec![
                ("subject", strings(&["HGNC:1"])),
                ("object", strings(&[object])),
                ("predicate", strings(&["biolink:interacts_with"])),
            ],
        );
    }
}

/// Records statements and fails those matching a queued prefix.
#[derive(Default)]
pub struct RecordingConnection {
    pub executed: Vec<String>,
    failures: VecDeque<(String, String)>,
}

impl RecordingConnection {
    pub fn fail_next(mut self, prefix: &str, message: &str) -> Self {
        self.failures.push_back((prefix.to_string(), message.to_string()));
        self
    }

    pub fn executed_matching(&self, prefix: &str) -> Vec<&str> {
        self.executed
            .iter()
            .map(String::as_str)
            .filter(|s| s.starts_with(prefix))
            .collect()
    }
}

impl Connection for RecordingConnection {
    fn execute(&mut self, statement: &str) -> Result<(), ExecError> {
        self.executed.push(statement.to_string());
        let hit = self
            .failures
            .front()
            .is_some_and(|(prefix, _)| statement.starts_with(prefix.as_str()));
        if hit {
            if let Some((_, message)) = self.failures.pop_front() {
                return Err(ExecError::from_message(message));
            }
        }
        Ok(())
    }
}
