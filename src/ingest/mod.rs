//! Dataset discovery, plan construction and plan execution.
//!
//! A run discovers node and relationship tables, builds an
//! [`IngestionPlan`] whose steps are fully generated up front, and executes
//! it on a single connection: teardown, then every node table, then every
//! relationship table.

mod discover;
mod orchestrator;
mod plan;
mod progress;

pub use discover::{discover, TableSource};
pub use orchestrator::{ingest, plan_dataset, IngestSummary, Ingestor};
pub use plan::{IngestionPlan, Phase, PhaseKind, PlanStep, StatementKind, StepProgress};
pub use progress::{NoProgress, ProgressSink, TracingProgress};
