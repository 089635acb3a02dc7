use std::time::Duration;

use tracing::{info, warn};

use crate::exec::{Connection, ErrorKind, ExecError};

/// Default number of attempts per statement.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default pause between attempts after a key-visibility failure.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Attempt budget and backoff for one statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves as one.
    pub max_attempts: u32,
    /// Fixed pause before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Terminal state of running one statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The statement ran.
    Succeeded {
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// The table was already bulk loaded by an earlier run.
    SkippedDuplicate(ExecError),
    /// Every attempt failed on key visibility.
    ExhaustedRetries {
        /// Attempts performed.
        attempts: u32,
        /// Error of the final attempt.
        last_error: ExecError,
    },
    /// An unclassified failure; never retried.
    Fatal(ExecError),
}

/// Blocking pause between attempts.
pub trait Sleeper {
    /// Blocks the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Runs statements under a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryExecutor<S = ThreadSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryExecutor<ThreadSleeper> {
    /// Executor sleeping on the calling thread.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, ThreadSleeper)
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    /// Executor with a custom sleeper.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    /// Active policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the sleeper.
    pub fn into_sleeper(self) -> S {
        self.sleeper
    }

    /// Executes `statement`, retrying only key-visibility failures.
    pub fn run<C: Connection + ?Sized>(&mut self, conn: &mut C, statement: &str) -> RetryOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match conn.execute(statement) {
                Ok(()) => return RetryOutcome::Succeeded { attempts },
                Err(err) => err,
            };
            match err.kind {
                ErrorKind::DuplicateLoad => {
                    info!(statement, message = %err, "exec.retry.duplicate_load");
                    return RetryOutcome::SkippedDuplicate(err);
                }
                ErrorKind::KeyNotVisible if attempts < max_attempts => {
                    warn!(
                        statement,
                        attempt = attempts,
                        max_attempts,
                        message = %err,
                        "exec.retry.key_not_visible"
                    );
                    self.sleeper.sleep(self.policy.backoff);
                }
                ErrorKind::KeyNotVisible => {
                    return RetryOutcome::ExhaustedRetries {
                        attempts,
                        last_error: err,
                    };
                }
                ErrorKind::Other => return RetryOutcome::Fatal(err),
            }
        }
    }
}

/// Runs one statement with the default thread sleeper.
pub fn run_with_retry<C: Connection + ?Sized>(
    conn: &mut C,
    statement: &str,
    max_attempts: u32,
) -> RetryOutcome {
    let policy = RetryPolicy {
        max_attempts,
        ..RetryPolicy::default()
    };
    RetryExecutor::new(policy).run(conn, statement)
}
