#![forbid(unsafe_code)]

//! Command helpers shared by the `graphload` binary.
//!
//! Each helper takes a plain configuration struct, runs one command against
//! the library and returns a serializable result for display.

mod commands;

pub use commands::{
    run_load, run_plan, run_schema, run_script, CliError, LoadConfig, ScriptConfig, ScriptSummary,
    DEFAULT_SHELL,
};
