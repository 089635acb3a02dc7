use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

/// Message fragment the database reports when a table was already bulk loaded.
pub const DUPLICATE_LOAD_MARKER: &str = "COPY commands can only be executed once";
/// Message fragment the database reports when a referenced key is not visible yet.
pub const KEY_NOT_VISIBLE_MARKER: &str = "Unable to find primary key value";

/// Category of a failed statement, as far as retrying is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The bulk load already ran for this table.
    DuplicateLoad,
    /// A referenced endpoint row is not visible yet.
    KeyNotVisible,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Classifies a database error message.
    ///
    /// Matching is by substring because the database shell only exposes
    /// human-readable text; a reworded message falls through to `Other`.
    pub fn classify(message: &str) -> Self {
        if message.contains(DUPLICATE_LOAD_MARKER) {
            ErrorKind::DuplicateLoad
        } else if message.contains(KEY_NOT_VISIBLE_MARKER) {
            ErrorKind::KeyNotVisible
        } else {
            ErrorKind::Other
        }
    }
}

/// A failed statement.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecError {
    /// Retry classification.
    pub kind: ErrorKind,
    /// Database message.
    pub message: String,
}

impl ExecError {
    /// Builds an error with an explicit category.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error, deriving its category from the message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::classify(&message),
            message,
        }
    }
}

/// A connection able to run one statement at a time.
pub trait Connection {
    /// Executes a single DDL or bulk-load statement.
    fn execute(&mut self, statement: &str) -> Result<(), ExecError>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn execute(&mut self, statement: &str) -> Result<(), ExecError> {
        (**self).execute(statement)
    }
}

/// Writes statements to a Cypher script instead of executing them.
pub struct ScriptConnection<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> ScriptConnection<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Number of statements written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the writer.
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Connection for ScriptConnection<W> {
    fn execute(&mut self, statement: &str) -> Result<(), ExecError> {
        writeln!(self.out, "{statement};")
            .map_err(|err| ExecError::new(ErrorKind::Other, err.to_string()))?;
        self.written += 1;
        Ok(())
    }
}

/// Runs every statement through a fresh database shell process.
///
/// The shell is invoked as `<program> [args..] <database>` with the statement
/// on stdin. A statement fails when the process exits unsuccessfully or
/// prints a line starting with `Error`.
#[derive(Clone, Debug)]
pub struct CommandConnection {
    program: PathBuf,
    args: Vec<String>,
    database: PathBuf,
}

impl CommandConnection {
    /// Creates a connection for `database` using the given shell program.
    pub fn new(program: impl Into<PathBuf>, database: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            database: database.as_ref().to_path_buf(),
        }
    }

    /// Extra arguments placed before the database path.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl Connection for CommandConnection {
    fn execute(&mut self, statement: &str) -> Result<(), ExecError> {
        trace!(program = %self.program.display(), statement, "exec.command");
        let spawn_err = |err: std::io::Error| {
            ExecError::new(
                ErrorKind::Other,
                format!("failed to run {}: {err}", self.program.display()),
            )
        };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.database)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            writeln!(stdin, "{statement};").map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let status = output.status;

        if let Some(line) = stdout
            .lines()
            .chain(stderr.lines())
            .find(|line| line.trim_start().starts_with("Error"))
        {
            return Err(ExecError::from_message(line.trim()));
        }
        if !status.success() {
            let text = if stderr.trim().is_empty() {
                format!("{} exited with {status}", self.program.display())
            } else {
                stderr.trim().to_string()
            };
            return Err(ExecError::from_message(text));
        }
        Ok(())
    }
}
