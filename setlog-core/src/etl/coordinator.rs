use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;

use crate::config::EtlConfig;
use crate::db::models::Exercise;
use crate::db::operations;
use crate::error::EtlError;
use crate::etl::loader::{self, LoadOutcome};
use crate::etl::metrics;
use crate::etl::parser::{self, RawSetRow};
use crate::etl::resolver::ExerciseResolver;

/// The staging area boundary. The CLI implements this over a JSON file;
/// the production deployment would implement it over the spreadsheet RPC
/// layer this core deliberately excludes.
#[allow(async_fn_in_trait)]
pub trait InputSource {
    async fn fetch_batch(&self) -> Result<StagedBatch, EtlError>;

    /// Clear the staged rows, preserving structure, so the next workout
    /// starts from a blank slate. Only called after a committed load.
    async fn clear_staging(&self) -> Result<(), EtlError>;
}

/// One run's input: session metadata plus set rows, which arrive either as
/// a raw text blob or already split into field mappings.
#[derive(Debug, Clone, Deserialize)]
pub struct StagedBatch {
    #[serde(deserialize_with = "scalar_map")]
    pub session: HashMap<String, String>,
    pub rows: StagedRows,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StagedRows {
    Blob(String),
    Rows(Vec<HashMap<String, String>>),
}

impl StagedRows {
    pub fn raw_rows(&self) -> Vec<RawSetRow> {
        match self {
            StagedRows::Blob(blob) => parser::parse_blob(blob),
            StagedRows::Rows(mappings) => parser::rows_from_mappings(mappings),
        }
    }
}

// Session fields come in as text or numbers depending on how the staging
// layer serialized them; normalize everything to raw text.
fn scalar_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

/// Structured result relayed as the response body of the triggering
/// request: `{success, message, session_date}` on success,
/// `{success, error}` on failure.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    fn ok(outcome: LoadOutcome) -> Self {
        Self {
            success: true,
            message: Some(format!("Logged {} sets", outcome.raw_rows)),
            session_date: Some(outcome.session_date),
            unresolved: outcome.unresolved,
            error: None,
        }
    }

    fn err(error: &EtlError) -> Self {
        Self {
            success: false,
            message: None,
            session_date: None,
            unresolved: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Orchestrates one end-to-end cycle: fetch, parse, resolve, compute, load,
/// then signal the source to clear. Owns no business logic of its own.
pub struct RunCoordinator<S> {
    config: EtlConfig,
    pool: SqlitePool,
    source: S,
}

impl<S: InputSource> RunCoordinator<S> {
    pub fn new(config: EtlConfig, pool: SqlitePool, source: S) -> Self {
        Self {
            config,
            pool,
            source,
        }
    }

    /// Run one batch. Never panics or propagates; every outcome becomes a
    /// structured `RunResult` for the caller to relay.
    pub async fn run(&self, secret: &str) -> RunResult {
        match self.execute(secret).await {
            Ok(outcome) => RunResult::ok(outcome),
            Err(error) => {
                warn!("run failed: {}", error);
                RunResult::err(&error)
            }
        }
    }

    /// The reference table, as served to the input-collection UI.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, EtlError> {
        Ok(operations::get_all_exercises(&self.pool).await?)
    }

    async fn execute(&self, secret: &str) -> Result<LoadOutcome, EtlError> {
        if secret != self.config.shared_secret {
            return Err(EtlError::Authentication);
        }

        let batch = self.source.fetch_batch().await?;
        let session = metrics::session_record(&batch.session)?;
        let raw_rows = batch.rows.raw_rows();
        info!(
            "staged batch for {}: {} rows",
            session.workout_date,
            raw_rows.len()
        );

        let resolver =
            ExerciseResolver::new(operations::get_all_exercises(&self.pool).await?);
        if resolver.is_empty() {
            warn!("exercise reference table is empty; every row will be unresolved");
        }

        let mut records = Vec::with_capacity(raw_rows.len());
        for (index, raw) in raw_rows.iter().enumerate() {
            let row = index + 1;
            let exercise = match resolver.resolve(&raw.exercise_name, row) {
                Ok(exercise) => Some(exercise.clone()),
                Err(unresolved @ EtlError::UnresolvedExercise { .. }) => {
                    // Non-fatal: the row stays in history and surfaces as a
                    // diagnostic in the outcome.
                    warn!("{}", unresolved);
                    None
                }
                Err(other) => return Err(other),
            };
            records.push(metrics::typed_record(raw, row, exercise)?);
        }

        let outcome = loader::load_batch(&self.pool, &session, &records).await?;

        // The load is committed; a failed clear only means the next run may
        // re-append rows that history keeps anyway.
        if let Err(error) = self.source.clear_staging().await {
            warn!("staging clear failed after committed load: {}", error);
        }

        Ok(outcome)
    }
}
