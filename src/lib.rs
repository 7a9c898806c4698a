//! Dependency-graph risk analysis and transactional change execution.

pub mod analysis;
pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod exit;
pub mod graph;
pub mod index;
pub mod lang;
pub mod project;
pub mod reporting;
pub mod safety;
pub mod types;
pub mod verification;
