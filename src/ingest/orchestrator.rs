use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::exec::{drop_if_exists, Connection, RetryExecutor, RetryOutcome, Sleeper, ThreadSleeper};
use crate::ingest::{discover, IngestionPlan, ProgressSink, StatementKind};
use crate::options::IngestOptions;

/// Counters reported after a successful run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Tables whose drop statement succeeded.
    pub tables_dropped: usize,
    /// Tables created.
    pub tables_created: usize,
    /// Bulk loads that ran.
    pub loads_completed: usize,
    /// Bulk loads skipped because the table was already loaded.
    pub loads_skipped: usize,
    /// Extra attempts spent on key-visibility retries.
    pub retries: u64,
    /// Wall-clock time of the run.
    pub duration_ms: f64,
}

/// Discovers the dataset under `root` and builds its plan.
pub fn plan_dataset(root: &Path, opts: &IngestOptions) -> Result<IngestionPlan> {
    let sources = discover(root, opts)?;
    let plan = IngestionPlan::build(&sources, opts)?;
    plan.validate()?;
    Ok(plan)
}

/// Runs ingestion plans against one connection.
///
/// Statements execute strictly one at a time, in plan order.
pub struct Ingestor<C, S = ThreadSleeper> {
    conn: C,
    executor: RetryExecutor<S>,
}

impl<C: Connection> Ingestor<C> {
    /// Creates an ingestor retrying with `opts`'s policy.
    pub fn new(conn: C, opts: &IngestOptions) -> Self {
        Self::with_executor(conn, RetryExecutor::new(opts.retry_policy()))
    }
}

impl<C: Connection, S: Sleeper> Ingestor<C, S> {
    /// Creates an ingestor with an explicit executor.
    pub fn with_executor(conn: C, executor: RetryExecutor<S>) -> Self {
        Self { conn, executor }
    }

    /// Returns the connection and executor.
    pub fn into_parts(self) -> (C, RetryExecutor<S>) {
        (self.conn, self.executor)
    }

    /// Executes `plan`: teardown, then the node phase, then the edge phase.
    ///
    /// Stops at the first statement that fails fatally or exhausts its
    /// retries. Statements already executed are not rolled back.
    pub fn execute(
        &mut self,
        plan: &IngestionPlan,
        progress: &mut dyn ProgressSink,
    ) -> Result<IngestSummary> {
        plan.validate()?;
        let started = Instant::now();
        let mut summary = IngestSummary::default();

        for table in &plan.teardown {
            let dropped = drop_if_exists(&mut self.conn, table);
            if dropped {
                summary.tables_dropped += 1;
            }
            progress.table_dropped(table, dropped);
        }

        for phase in plan.phases() {
            progress.phase_started(phase.kind, phase.steps.len());
            for step in &phase.steps {
                progress.step_started(step);
                let outcome = self.executor.run(&mut self.conn, &step.statement);
                progress.step_finished(step, &outcome);
                match outcome {
                    RetryOutcome::Succeeded { attempts } => {
                        summary.retries += u64::from(attempts.saturating_sub(1));
                        match step.kind {
                            StatementKind::BulkLoad => summary.loads_completed += 1,
                            StatementKind::CreateNode | StatementKind::CreateRelationship => {
                                summary.tables_created += 1
                            }
                        }
                    }
                    RetryOutcome::SkippedDuplicate(_) if step.kind == StatementKind::BulkLoad => {
                        summary.loads_skipped += 1
                    }
                    RetryOutcome::SkippedDuplicate(source) | RetryOutcome::Fatal(source) => {
                        return Err(IngestError::Execution {
                            statement: step.statement.clone(),
                            source,
                        })
                    }
                    RetryOutcome::ExhaustedRetries {
                        attempts,
                        last_error,
                    } => {
                        return Err(IngestError::RetriesExhausted {
                            statement: step.statement.clone(),
                            attempts,
                            source: last_error,
                        })
                    }
                }
            }
        }

        summary.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            created = summary.tables_created,
            loaded = summary.loads_completed,
            skipped = summary.loads_skipped,
            retries = summary.retries,
            duration_ms = summary.duration_ms,
            "ingest.done"
        );
        Ok(summary)
    }
}

/// Plans the dataset under `root` and executes it on `conn`.
pub fn ingest<C: Connection>(
    root: &Path,
    conn: C,
    opts: &IngestOptions,
    progress: &mut dyn ProgressSink,
) -> Result<IngestSummary> {
    let plan = plan_dataset(root, opts)?;
    Ingestor::new(conn, opts).execute(&plan, progress)
}
