use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::ddl::{copy_statement, create_statement, group_member_name};
use crate::error::{IngestError, Result};
use crate::ingest::TableSource;
use crate::options::IngestOptions;
use crate::schema::TableKind;

/// What a plan step does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// `CREATE NODE TABLE`
    CreateNode,
    /// `CREATE REL TABLE [GROUP]`
    CreateRelationship,
    /// `COPY ... FROM`
    BulkLoad,
}

impl StatementKind {
    /// Whether this creates a table.
    pub fn is_create(self) -> bool {
        !matches!(self, StatementKind::BulkLoad)
    }
}

/// The two ingestion phases, in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Node tables are created and loaded.
    NodePhase,
    /// Relationship tables are created and loaded.
    EdgePhase,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::NodePhase => f.write_str("nodes"),
            PhaseKind::EdgePhase => f.write_str("edges"),
        }
    }
}

/// Position of a load step among its phase's tables and sub-tables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    /// 1-based table number within the phase.
    pub table: usize,
    /// Tables in the phase.
    pub tables: usize,
    /// 1-based sub-table number and sub-table count, for group members.
    pub sub_table: Option<(usize, usize)>,
}

impl fmt::Display for StepProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {}/{}", self.table, self.tables)?;
        if let Some((index, count)) = self.sub_table {
            write!(f, ", sub-table {index}/{count}")?;
        }
        Ok(())
    }
}

/// One statement of an [`IngestionPlan`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Global position in the plan, starting at zero.
    pub sequence: usize,
    /// Statement kind.
    pub kind: StatementKind,
    /// Kind of the logical table the statement concerns.
    pub table_kind: TableKind,
    /// Logical table.
    pub table: String,
    /// Statement target: the table itself or a group member.
    pub target: String,
    /// Directory being loaded, for bulk loads.
    pub source: Option<PathBuf>,
    /// Statement text.
    pub statement: String,
    /// Counters for progress display, for bulk loads.
    pub progress: Option<StepProgress>,
}

/// Ordered statements of one phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Phase {
    /// Which phase.
    pub kind: PhaseKind,
    /// Creation steps followed by load steps.
    pub steps: Vec<PlanStep>,
}

/// Complete, ordered set of statements for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestionPlan {
    /// Tables to drop before creation; relationship tables first.
    pub teardown: Vec<String>,
    /// Node tables.
    pub node_phase: Phase,
    /// Relationship tables.
    pub edge_phase: Phase,
}

impl IngestionPlan {
    /// Builds the plan for discovered tables.
    ///
    /// Every `CREATE` statement is generated here, so schema errors surface
    /// before anything executes.
    pub fn build(sources: &[TableSource], opts: &IngestOptions) -> Result<Self> {
        let nodes: Vec<&TableSource> = sources
            .iter()
            .filter(|src| src.kind() == TableKind::Node)
            .collect();
        let rels: Vec<&TableSource> = sources
            .iter()
            .filter(|src| src.kind() == TableKind::Relationship)
            .collect();

        let teardown = rels
            .iter()
            .chain(nodes.iter())
            .map(|src| src.name().to_string())
            .collect();

        let mut builder = PhaseBuilder {
            next_sequence: 0,
            extension: &opts.file_extension,
        };
        let node_phase = builder.phase(PhaseKind::NodePhase, &nodes)?;
        let edge_phase = builder.phase(PhaseKind::EdgePhase, &rels)?;
        Ok(Self {
            teardown,
            node_phase,
            edge_phase,
        })
    }

    /// Phases in execution order.
    pub fn phases(&self) -> [&Phase; 2] {
        [&self.node_phase, &self.edge_phase]
    }

    /// Every step in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.node_phase.steps.iter().chain(self.edge_phase.steps.iter())
    }

    /// Total number of steps.
    pub fn len(&self) -> usize {
        self.node_phase.steps.len() + self.edge_phase.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the ordering invariants: sequence numbers increase, node steps
    /// precede relationship steps, and each table is created before any load
    /// that references it.
    pub fn validate(&self) -> Result<()> {
        let mut created: HashMap<&str, usize> = HashMap::new();
        let mut last: Option<usize> = None;
        let mut seen_relationship = false;
        for phase in self.phases() {
            let expected = match phase.kind {
                PhaseKind::NodePhase => TableKind::Node,
                PhaseKind::EdgePhase => TableKind::Relationship,
            };
            for step in &phase.steps {
                if last.is_some_and(|prev| step.sequence <= prev) {
                    return Err(ordering(format!(
                        "step {} is out of sequence",
                        step.sequence
                    )));
                }
                last = Some(step.sequence);
                if step.table_kind != expected {
                    return Err(ordering(format!(
                        "{:?} step for '{}' is in the {} phase",
                        step.table_kind, step.table, phase.kind
                    )));
                }
                match step.table_kind {
                    TableKind::Relationship => seen_relationship = true,
                    TableKind::Node if seen_relationship => {
                        return Err(ordering(format!(
                            "node step for '{}' follows a relationship step",
                            step.table
                        )))
                    }
                    TableKind::Node => {}
                }
                if step.kind.is_create() {
                    created.insert(step.table.as_str(), step.sequence);
                } else if !created.contains_key(step.table.as_str()) {
                    return Err(ordering(format!(
                        "load of '{}' precedes its creation",
                        step.target
                    )));
                }
            }
        }
        Ok(())
    }
}

fn ordering(message: String) -> IngestError {
    IngestError::PlanOrdering(message)
}

struct PhaseBuilder<'a> {
    next_sequence: usize,
    extension: &'a str,
}

impl PhaseBuilder<'_> {
    fn phase(&mut self, kind: PhaseKind, tables: &[&TableSource]) -> Result<Phase> {
        let mut steps = Vec::new();
        for src in tables {
            let statement = create_statement(&src.descriptor)?;
            let create_kind = match src.kind() {
                TableKind::Node => StatementKind::CreateNode,
                TableKind::Relationship => StatementKind::CreateRelationship,
            };
            steps.push(self.step(src, create_kind, src.name(), None, statement, None));
        }

        let count = tables.len();
        for (idx, src) in tables.iter().enumerate() {
            let parts = &src.partitions;
            let grouped = parts.len() > 1;
            for (part_idx, part) in parts.iter().enumerate() {
                let target = match (&part.pair_dir, grouped) {
                    (Some(dir), true) => group_member_name(src.name(), dir),
                    _ => src.name().to_string(),
                };
                let progress = StepProgress {
                    table: idx + 1,
                    tables: count,
                    sub_table: grouped.then_some((part_idx + 1, parts.len())),
                };
                let statement = copy_statement(&target, &part.path, self.extension);
                steps.push(self.step(
                    src,
                    StatementKind::BulkLoad,
                    &target,
                    Some(part.path.clone()),
                    statement,
                    Some(progress),
                ));
            }
        }
        Ok(Phase { kind, steps })
    }

    fn step(
        &mut self,
        src: &TableSource,
        kind: StatementKind,
        target: &str,
        source: Option<PathBuf>,
        statement: String,
        progress: Option<StepProgress>,
    ) -> PlanStep {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        PlanStep {
            sequence,
            kind,
            table_kind: src.kind(),
            table: src.name().to_string(),
            target: target.to_string(),
            source,
            statement,
            progress,
        }
    }
}
