use thiserror::Error;

/// Failure taxonomy for one ETL run. `UnresolvedExercise` is the only
/// per-row, non-fatal case; the coordinator collects those as diagnostics
/// and keeps the row in the raw table. Everything else aborts the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EtlError {
    #[error("authentication failed: shared secret mismatch")]
    Authentication,

    #[error("empty batch: no set rows to process")]
    EmptyBatch,

    #[error("unresolved exercise \"{name}\" (row {row})")]
    UnresolvedExercise { name: String, row: usize },

    #[error("invalid numeric value \"{value}\" for {field} (row {row})")]
    InvalidNumericField {
        field: &'static str,
        row: usize,
        value: String,
    },

    #[error("session field {0} is missing")]
    MissingSessionField(&'static str),

    #[error("invalid session date \"{0}\"")]
    InvalidSessionDate(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("input source error: {0}")]
    Source(String),
}
