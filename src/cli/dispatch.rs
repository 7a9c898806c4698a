// src/cli/dispatch.rs
use anyhow::Result;

use super::args::Commands;
use super::handlers::{handle_execute, handle_graph, handle_index, handle_score, handle_trace};
use crate::exit::RefguardExit;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the command handler fails.
pub fn execute(command: Commands) -> Result<RefguardExit> {
    match command {
        Commands::Index {
            path,
            include_tests,
            json,
        } => handle_index(&path, include_tests, json),
        Commands::Graph {
            root,
            include_tests,
            json,
        } => handle_graph(&root, include_tests, json),
        Commands::Trace {
            file,
            direction,
            depth,
            include_unused,
            root,
            json,
        } => handle_trace(&file, direction, depth, include_unused, root.as_deref(), json),
        Commands::Score { root, coverage, json } => handle_score(&root, coverage, json),
        Commands::Execute { request, root, json } => handle_execute(&request, &root, json),
    }
}
