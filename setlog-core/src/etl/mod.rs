//! The ETL pipeline: parse staged rows, resolve exercise names against the
//! reference table, type and compute metrics, then load atomically.

pub mod coordinator;
pub mod loader;
pub mod metrics;
pub mod parser;
pub mod resolver;

pub use coordinator::{InputSource, RunCoordinator, RunResult, StagedBatch, StagedRows};
pub use loader::LoadOutcome;
