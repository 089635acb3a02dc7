use tracing::{debug, info, warn};

use crate::exec::RetryOutcome;
use crate::ingest::{PhaseKind, PlanStep};

/// Receives progress notifications while a plan executes.
///
/// Notifications cannot fail and do not affect execution.
pub trait ProgressSink {
    /// Teardown dropped (or failed to drop) a table.
    fn table_dropped(&mut self, _table: &str, _dropped: bool) {}

    /// A phase is about to run `_steps` statements.
    fn phase_started(&mut self, _phase: PhaseKind, _steps: usize) {}

    /// A statement is about to run.
    fn step_started(&mut self, _step: &PlanStep) {}

    /// A statement reached a terminal outcome.
    fn step_finished(&mut self, _step: &PlanStep, _outcome: &RetryOutcome) {}
}

/// Discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Reports progress as `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn table_dropped(&mut self, table: &str, dropped: bool) {
        debug!(table, dropped, "ingest.teardown");
    }

    fn phase_started(&mut self, phase: PhaseKind, steps: usize) {
        info!(%phase, steps, "ingest.phase");
    }

    fn step_started(&mut self, step: &PlanStep) {
        match step.progress {
            Some(progress) => info!(
                target_table = %step.target,
                %progress,
                "ingest.load"
            ),
            None => info!(table = %step.table, kind = ?step.kind, "ingest.create"),
        }
    }

    fn step_finished(&mut self, step: &PlanStep, outcome: &RetryOutcome) {
        match outcome {
            RetryOutcome::Succeeded { attempts } => {
                debug!(sequence = step.sequence, attempts, "ingest.step.done")
            }
            RetryOutcome::SkippedDuplicate(_) => {
                info!(target_table = %step.target, "ingest.step.already_loaded")
            }
            RetryOutcome::ExhaustedRetries { attempts, .. } => {
                warn!(sequence = step.sequence, attempts, "ingest.step.exhausted")
            }
            RetryOutcome::Fatal(err) => {
                warn!(sequence = step.sequence, error = %err, "ingest.step.failed")
            }
        }
    }
}
