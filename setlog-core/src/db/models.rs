use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reference entity. Curated outside the ETL run and read-only to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exercise {
    pub exercise_id: i64,
    pub name: String,
    pub muscle_group: Option<String>,
    pub category: Option<String>,
}

/// Input shape for the reference-table import command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: Option<String>,
    pub category: Option<String>,
}

/// Current-session metadata, replaced wholesale on every successful run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionRecord {
    pub workout_date: String,
    pub location: Option<String>,
    pub workout_length: Option<f64>,
    pub time_of_day: Option<String>,
    pub calories: Option<f64>,
    pub comments: Option<String>,
}

/// One row of the clean table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkoutSet {
    pub workout_date: String,
    pub exercise_id: i64,
    pub set_index: i64,
    pub reps: Option<f64>,
    pub weight: Option<f64>,
    pub duration: Option<f64>,
    pub distance: Option<f64>,
    pub rpe: Option<f64>,
    pub volume: Option<f64>,
}

impl fmt::Display for WorkoutSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weight = self.weight.map(|w| format!("{:.1}kg", w));
        let reps = self.reps.map(|r| format!("{} reps", r));
        let rpe = self.rpe.map(|r| format!(" @{:.1}", r)).unwrap_or_default();

        write!(
            f,
            "Exercise #{} set {}: {} x {}{}",
            self.exercise_id,
            self.set_index,
            weight.as_deref().unwrap_or("-"),
            reps.as_deref().unwrap_or("-"),
            rpe
        )
    }
}

/// Database summary served by the CLI `summary` command.
#[derive(Debug, Clone, Serialize)]
pub struct DbSummary {
    pub total_sets: i64,
    pub unique_dates: i64,
    pub volume_by_muscle_group: Vec<(String, f64)>,
}
