#![allow(missing_docs)]

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use graphload::ingest::{IngestionPlan, StatementKind, TableSource};
use graphload::layout::{EndpointPair, SubPartition};
use graphload::{ColumnSchema, IngestOptions, PhysicalType, TableDescriptor, TableKind};
use proptest::prelude::*;

fn node_source(name: &str) -> TableSource {
    let location = PathBuf::from("/data/nodes").join(name);
    TableSource {
        descriptor: TableDescriptor::node(
            name,
            vec![
                ColumnSchema::new("id", PhysicalType::String),
                ColumnSchema::new("score", PhysicalType::Double),
            ],
            "id",
        ),
        partitions: vec![SubPartition::node(location.clone())],
        location,
    }
}

fn rel_source(name: &str, pairs: &BTreeSet<(String, String)>, payload: bool) -> TableSource {
    let location = PathBuf::from("/data/edges").join(name);
    let partitions: Vec<SubPartition> = pairs
        .iter()
        .map(|(from, to)| {
            let dir = format!("{from}_{to}");
            SubPartition::relationship(location.join(&dir), dir, EndpointPair::new(from, to))
        })
        .collect();
    let columns = if payload {
        vec![ColumnSchema::new("since", PhysicalType::Int64)]
    } else {
        Vec::new()
    };
    TableSource {
        descriptor: TableDescriptor::relationship(
            name,
            columns,
            partitions.iter().filter_map(|p| p.pair.clone()).collect(),
        ),
        location,
        partitions,
    }
}

fn arb_sources() -> impl Strategy<Value = Vec<TableSource>> {
    prop::collection::btree_set("[A-Z][a-z]{2,6}", 1..5).prop_flat_map(|nodes| {
        let names: Vec<String> = nodes.into_iter().collect();
        let pair = (0..names.len(), 0..names.len());
        let rel = (
            prop::collection::vec(pair, 1..4),
            any::<bool>(),
        );
        let rels = prop::collection::btree_map("[a-z]{3,8}", rel, 0..4);
        (Just(names), rels).prop_map(|(names, rels)| {
            let mut sources: Vec<TableSource> = names.iter().map(|n| node_source(n)).collect();
            for (rel_name, (pairs, payload)) in rels {
                let pairs: BTreeSet<(String, String)> = pairs
                    .into_iter()
                    .map(|(f, t)| (names[f].clone(), names[t].clone()))
                    .collect();
                sources.push(rel_source(&rel_name, &pairs, payload));
            }
            sources
        })
    })
}

proptest! {
    #[test]
    fn prop_plan_respects_ordering(sources in arb_sources()) {
        let plan = IngestionPlan::build(&sources, &IngestOptions::default()).unwrap();
        prop_assert!(plan.validate().is_ok());

        let steps: Vec<_> = plan.steps().collect();
        for (idx, step) in steps.iter().enumerate() {
            prop_assert_eq!(step.sequence, idx);
        }

        let last_node = steps.iter().rposition(|s| s.table_kind == TableKind::Node);
        let first_rel = steps.iter().position(|s| s.table_kind == TableKind::Relationship);
        if let (Some(last_node), Some(first_rel)) = (last_node, first_rel) {
            prop_assert!(last_node < first_rel);
        }

        let mut created: HashMap<&str, usize> = HashMap::new();
        for step in &steps {
            if step.kind == StatementKind::BulkLoad {
                prop_assert!(created.contains_key(step.table.as_str()));
            } else {
                created.insert(step.table.as_str(), step.sequence);
            }
        }

        let expected_loads: usize = sources.iter().map(|s| s.partitions.len()).sum();
        let loads = steps.iter().filter(|s| s.kind == StatementKind::BulkLoad).count();
        prop_assert_eq!(loads, expected_loads);
        prop_assert_eq!(created.len(), sources.len());
    }

    #[test]
    fn prop_group_loads_target_member_tables(sources in arb_sources()) {
        let plan = IngestionPlan::build(&sources, &IngestOptions::default()).unwrap();
        for src in sources.iter().filter(|s| s.kind() == TableKind::Relationship) {
            let targets: Vec<&str> = plan
                .edge_phase
                .steps
                .iter()
                .filter(|s| s.kind == StatementKind::BulkLoad && s.table == src.name())
                .map(|s| s.target.as_str())
                .collect();
            if src.descriptor.is_group() {
                let expected: Vec<String> = src
                    .partitions
                    .iter()
                    .filter_map(|p| p.pair_dir.as_ref())
                    .map(|dir| format!("{}_{}", src.name(), dir))
                    .collect();
                prop_assert_eq!(targets, expected.iter().map(String::as_str).collect::<Vec<_>>());
            } else {
                prop_assert_eq!(targets, vec![src.name()]);
            }
        }
    }

    #[test]
    fn prop_teardown_drops_relationships_first(sources in arb_sources()) {
        let plan = IngestionPlan::build(&sources, &IngestOptions::default()).unwrap();
        let rel_count = sources.iter().filter(|s| s.kind() == TableKind::Relationship).count();
        for (idx, table) in plan.teardown.iter().enumerate() {
            let kind = sources
                .iter()
                .find(|s| s.name() == table)
                .map(TableSource::kind);
            let expected = if idx < rel_count { TableKind::Relationship } else { TableKind::Node };
            prop_assert_eq!(kind, Some(expected));
        }
    }
}
