//! Statement execution against the target graph database.

mod connection;
mod lifecycle;
mod retry;

pub use connection::{
    CommandConnection, Connection, ErrorKind, ExecError, ScriptConnection, DUPLICATE_LOAD_MARKER,
    KEY_NOT_VISIBLE_MARKER,
};
pub use lifecycle::drop_if_exists;
pub use retry::{
    run_with_retry, RetryExecutor, RetryOutcome, RetryPolicy, Sleeper, ThreadSleeper,
    DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS,
};
