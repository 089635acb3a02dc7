#![allow(missing_docs)]

mod support;

use std::path::Path;
use std::time::Duration;

use graphload::exec::{RetryExecutor, RetryPolicy, Sleeper};
use graphload::ingest::{discover, ingest, plan_dataset, Ingestor, NoProgress, StatementKind};
use graphload::{IngestError, IngestOptions, TableKind};
use support::{sample_dataset, strings, write_parquet, RecordingConnection};
use tempfile::TempDir;

fn dataset() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    sample_dataset(dir.path());
    dir
}

fn copy_from(root: &Path, target: &str, rel: &str) -> String {
    format!("COPY {target} FROM \"{}/*.parquet\"", root.join(rel).display())
}

#[derive(Default)]
struct CountingSleeper(Vec<Duration>);

impl Sleeper for CountingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.0.push(duration);
    }
}

#[test]
fn discovery_orders_nodes_before_relationships() {
    let dir = dataset();
    let tables = discover(dir.path(), &IngestOptions::default()).expect("discover");
    let names: Vec<(&str, TableKind)> = tables.iter().map(|t| (t.name(), t.kind())).collect();
    assert_eq!(
        names,
        [
            ("Disease", TableKind::Node),
            ("Gene", TableKind::Node),
            ("interacts_with", TableKind::Relationship),
            ("related_to", TableKind::Relationship),
        ]
    );

    let related = &tables[3].descriptor;
    let columns: Vec<&str> = related.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["predicate", "score"]);
    assert!(!related.is_group());

    let interacts = &tables[2];
    assert!(interacts.descriptor.is_group());
    let dirs: Vec<_> = interacts
        .partitions
        .iter()
        .filter_map(|p| p.pair_dir.as_deref())
        .collect();
    assert_eq!(dirs, ["Gene_Disease", "Gene_Gene"]);
}

#[test]
fn plan_matches_expected_statements() {
    let dir = dataset();
    let root = dir.path();
    let plan = plan_dataset(root, &IngestOptions::default()).expect("plan");
    assert_eq!(plan.teardown, ["interacts_with", "related_to", "Disease", "Gene"]);

    let statements: Vec<String> = plan.steps().map(|s| s.statement.clone()).collect();
    assert_eq!(
        statements,
        [
            "CREATE NODE TABLE Disease(id STRING, name STRING, category STRING, length INT64, PRIMARY KEY (id))".to_string(),
            "CREATE NODE TABLE Gene(id STRING, name STRING, category STRING, length INT64, PRIMARY KEY (id))".to_string(),
            copy_from(root, "Disease", "nodes/Disease"),
            copy_from(root, "Gene", "nodes/Gene"),
            "CREATE REL TABLE GROUP interacts_with (FROM Gene TO Disease, FROM Gene TO Gene, predicate STRING)".to_string(),
            "CREATE REL TABLE related_to (FROM Gene TO Disease, predicate STRING, score FLOAT)".to_string(),
            copy_from(root, "interacts_with_Gene_Disease", "edges/interacts_with/Gene_Disease"),
            copy_from(root, "interacts_with_Gene_Gene", "edges/interacts_with/Gene_Gene"),
            copy_from(root, "related_to", "edges/related_to/Gene_Disease"),
        ]
    );
    plan.validate().expect("plan is ordered");
}

#[test]
fn planning_is_deterministic() {
    let dir = dataset();
    let opts = IngestOptions::default();
    let first = plan_dataset(dir.path(), &opts).expect("plan");
    let second = plan_dataset(dir.path(), &opts).expect("plan");
    assert_eq!(first, second);
}

#[test]
fn ingest_runs_teardown_then_phases() {
    let dir = dataset();
    let mut conn = RecordingConnection::default();
    let summary = ingest(dir.path(), &mut conn, &IngestOptions::default(), &mut NoProgress)
        .expect("ingest");
    assert_eq!(summary.tables_dropped, 4);
    assert_eq!(summary.tables_created, 4);
    assert_eq!(summary.loads_completed, 5);
    assert_eq!(summary.loads_skipped, 0);
    assert_eq!(conn.executed.len(), 13);
    assert_eq!(
        conn.executed_matching("DROP"),
        [
            "DROP TABLE interacts_with",
            "DROP TABLE related_to",
            "DROP TABLE Disease",
            "DROP TABLE Gene",
        ]
    );
    let last_node_copy = conn
        .executed
        .iter()
        .rposition(|s| s.starts_with("COPY Gene"))
        .expect("gene load");
    let first_rel_create = conn
        .executed
        .iter()
        .position(|s| s.starts_with("CREATE REL"))
        .expect("rel create");
    assert!(last_node_copy < first_rel_create);
}

#[test]
fn missing_primary_key_aborts_before_any_statement() {
    let dir = dataset();
    let opts = IngestOptions {
        primary_key: "curie".into(),
        ..IngestOptions::default()
    };
    let mut conn = RecordingConnection::default();
    let err = ingest(dir.path(), &mut conn, &opts, &mut NoProgress).unwrap_err();
    assert!(matches!(err, IngestError::MissingPrimaryKey { ref key, .. } if key == "curie"));
    assert!(conn.executed.is_empty());
}

#[test]
fn duplicate_load_is_skipped_and_run_continues() {
    let dir = dataset();
    let plan = plan_dataset(dir.path(), &IngestOptions::default()).expect("plan");
    let conn = RecordingConnection::default().fail_next(
        "COPY Disease",
        "Copy exception: COPY commands can only be executed once on a table.",
    );
    let mut ingestor = Ingestor::with_executor(
        conn,
        RetryExecutor::with_sleeper(RetryPolicy::default(), CountingSleeper::default()),
    );
    let summary = ingestor.execute(&plan, &mut NoProgress).expect("ingest");
    assert_eq!(summary.loads_skipped, 1);
    assert_eq!(summary.loads_completed, 4);
    let (conn, executor) = ingestor.into_parts();
    assert_eq!(conn.executed_matching("COPY Disease").len(), 1);
    assert!(executor.into_sleeper().0.is_empty());
}

#[test]
fn key_visibility_failures_back_off_then_succeed() {
    let dir = dataset();
    let plan = plan_dataset(dir.path(), &IngestOptions::default()).expect("plan");
    let message = "Copy exception: Unable to find primary key value HGNC:1.";
    let conn = RecordingConnection::default()
        .fail_next("COPY related_to", message)
        .fail_next("COPY related_to", message);
    let policy = RetryPolicy {
        max_attempts: 5,
        backoff: Duration::from_millis(500),
    };
    let mut ingestor =
        Ingestor::with_executor(conn, RetryExecutor::with_sleeper(policy, CountingSleeper::default()));
    let summary = ingestor.execute(&plan, &mut NoProgress).expect("ingest");
    assert_eq!(summary.retries, 2);
    let (conn, executor) = ingestor.into_parts();
    assert_eq!(conn.executed_matching("COPY related_to").len(), 3);
    assert_eq!(
        executor.into_sleeper().0,
        [Duration::from_millis(500), Duration::from_millis(500)]
    );
}

#[test]
fn exhausted_retries_abort_the_run() {
    let dir = dataset();
    let plan = plan_dataset(dir.path(), &IngestOptions::default()).expect("plan");
    let message = "Copy exception: Unable to find primary key value HGNC:1.";
    let conn = (0..3).fold(RecordingConnection::default(), |conn, _| {
        conn.fail_next("COPY interacts_with", message)
    });
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(10),
    };
    let mut ingestor =
        Ingestor::with_executor(conn, RetryExecutor::with_sleeper(policy, CountingSleeper::default()));
    let err = ingestor.execute(&plan, &mut NoProgress).unwrap_err();
    assert!(matches!(err, IngestError::RetriesExhausted { attempts: 3, .. }));
    let (conn, executor) = ingestor.into_parts();
    assert_eq!(executor.into_sleeper().0.len(), 2);
    assert!(conn.executed_matching("COPY related_to").is_empty());
}

#[test]
fn statement_kinds_follow_phase_layout() {
    let dir = dataset();
    let plan = plan_dataset(dir.path(), &IngestOptions::default()).expect("plan");
    let kinds: Vec<StatementKind> = plan.edge_phase.steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        [
            StatementKind::CreateRelationship,
            StatementKind::CreateRelationship,
            StatementKind::BulkLoad,
            StatementKind::BulkLoad,
            StatementKind::BulkLoad,
        ]
    );
}

#[test]
fn empty_dataset_yields_empty_plan() {
    let dir = TempDir::new().expect("tempdir");
    let plan = plan_dataset(dir.path(), &IngestOptions::default()).expect("plan");
    assert!(plan.is_empty());
    assert!(plan.teardown.is_empty());
}

#[test]
fn malformed_pair_directory_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    write_parquet(
        &dir.path().join("edges/knows/AB/part-0.parquet"),
        vec![
            ("subject", strings(&["a"])),
            ("object", strings(&["b"])),
            ("predicate", strings(&["knows"])),
        ],
    );
    let err = plan_dataset(dir.path(), &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::InvalidEndpointPair { ref dir, .. } if dir == "AB"));
}

#[test]
fn namespace_prefix_is_kept_when_separator_is_empty() {
    let dir = TempDir::new().expect("tempdir");
    write_parquet(
        &dir.path().join("nodes/Gene/part-0.parquet"),
        vec![("id", strings(&["g"])), ("category", strings(&["Gene"]))],
    );
    let opts = IngestOptions {
        namespace_separator: String::new(),
        ..IngestOptions::default()
    };
    let tables = discover(dir.path(), &opts).expect("discover");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name(), "Gene");
}

#[test]
fn pair_directory_without_data_files_is_rejected() {
    let dir = dataset();
    std::fs::create_dir_all(dir.path().join("edges/related_to/Gene_Gene")).expect("empty pair dir");
    let err = plan_dataset(dir.path(), &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::EmptyPartition(ref p) if p.ends_with("Gene_Gene")));
}
