use crate::files::{read_json, write_json};
use anyhow::Result;
use clap::Args;
use quire_model::Operation;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InvertArgs {
    /// JSON array of operations
    pub operations: PathBuf,
}

/// The operations that undo `log`, in the order they must be applied.
pub fn inverse_log(log: &[Operation]) -> Vec<Operation> {
    log.iter().rev().map(Operation::inverse).collect()
}

pub fn invert(args: InvertArgs) -> Result<()> {
    let log: Vec<Operation> = read_json(&args.operations)?;
    write_json(&inverse_log(&log), None)
}
