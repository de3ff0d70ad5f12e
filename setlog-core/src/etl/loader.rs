use chrono::Utc;
use log::info;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::{SessionRecord, WorkoutSet};
use crate::db::operations::{
    RawSetInsert, append_raw_set, delete_clean_sets_for_date, insert_clean_set, replace_session,
};
use crate::error::EtlError;
use crate::etl::metrics::TypedSetRecord;

/// What one successful load did, relayed to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub raw_rows: u64,
    pub clean_rows: u64,
    pub unresolved: Vec<String>,
    pub session_date: String,
}

/// Persist one validated batch as a single transaction: append every record
/// to raw history, replace the current session row, and upsert the clean
/// table with the resolved records. Either all three land or none do.
///
/// An empty batch is refused before any write; a no-op run must not wipe the
/// current session.
pub async fn load_batch(
    pool: &SqlitePool,
    session: &SessionRecord,
    records: &[TypedSetRecord],
) -> Result<LoadOutcome, EtlError> {
    if records.is_empty() {
        return Err(EtlError::EmptyBatch);
    }

    let created_at = Utc::now().to_rfc3339();
    let mut unresolved = Vec::new();
    let mut clean_rows = 0u64;

    let mut tx = pool.begin().await?;

    for record in records {
        let exercise = record.exercise.as_ref();
        append_raw_set(
            &mut *tx,
            &RawSetInsert {
                workout_date: &session.workout_date,
                location: session.location.as_deref(),
                exercise_id: exercise.map(|e| e.exercise_id),
                exercise_name: &record.exercise_name,
                muscle_group: exercise.and_then(|e| e.muscle_group.as_deref()),
                category: exercise.and_then(|e| e.category.as_deref()),
                set_index: record.set_index,
                reps: record.reps,
                weight: record.weight,
                duration: record.duration,
                distance: record.distance,
                rpe: record.rpe,
                volume: record.volume,
                created_at: &created_at,
            },
        )
        .await?;
    }

    replace_session(&mut *tx, session, &created_at).await?;

    delete_clean_sets_for_date(&mut *tx, &session.workout_date).await?;
    for record in records {
        match record.exercise.as_ref() {
            Some(exercise) => {
                insert_clean_set(
                    &mut *tx,
                    &WorkoutSet {
                        workout_date: session.workout_date.clone(),
                        exercise_id: exercise.exercise_id,
                        set_index: record.set_index,
                        reps: record.reps,
                        weight: record.weight,
                        duration: record.duration,
                        distance: record.distance,
                        rpe: record.rpe,
                        volume: record.volume,
                    },
                )
                .await?;
                clean_rows += 1;
            }
            None => unresolved.push(record.exercise_name.clone()),
        }
    }

    tx.commit().await?;

    info!(
        "loaded batch for {}: {} raw, {} clean, {} unresolved",
        session.workout_date,
        records.len(),
        clean_rows,
        unresolved.len()
    );

    Ok(LoadOutcome {
        raw_rows: records.len() as u64,
        clean_rows,
        unresolved,
        session_date: session.workout_date.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Exercise;
    use crate::db::operations::{
        count_raw_sets, get_clean_sets_for_date, get_current_session, replace_exercises,
    };
    use crate::db::{self, models::NewExercise};

    fn session(date: &str) -> SessionRecord {
        SessionRecord {
            workout_date: date.to_string(),
            location: Some("Gym".to_string()),
            workout_length: Some(45.0),
            time_of_day: None,
            calories: None,
            comments: None,
        }
    }

    fn record(index: i64, name: &str, exercise: Option<Exercise>) -> TypedSetRecord {
        TypedSetRecord {
            set_index: index,
            exercise_name: name.to_string(),
            exercise,
            reps: Some(10.0),
            weight: Some(60.0),
            duration: None,
            distance: None,
            rpe: Some(7.0),
            volume: Some(600.0),
        }
    }

    async fn seeded_pool() -> (SqlitePool, Exercise) {
        let pool = db::memory_pool().await;
        replace_exercises(
            &pool,
            &[NewExercise {
                name: "Bench Press".to_string(),
                muscle_group: Some("Chest".to_string()),
                category: Some("Barbell".to_string()),
            }],
        )
        .await
        .unwrap();
        let exercise = crate::db::operations::get_all_exercises(&pool)
            .await
            .unwrap()
            .remove(0);
        (pool, exercise)
    }

    #[tokio::test]
    async fn empty_batch_is_refused_before_any_write() {
        let (pool, exercise) = seeded_pool().await;
        load_batch(
            &pool,
            &session("2026-01-17"),
            &[record(1, "Bench Press", Some(exercise))],
        )
        .await
        .unwrap();

        let err = load_batch(&pool, &session("2026-01-18"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::EmptyBatch));

        // Current session must be untouched by the refused run.
        let current = get_current_session(&pool).await.unwrap().unwrap();
        assert_eq!(current.workout_date, "2026-01-17");
        assert_eq!(count_raw_sets(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unresolved_rows_reach_raw_but_not_clean() {
        let (pool, exercise) = seeded_pool().await;
        let outcome = load_batch(
            &pool,
            &session("2026-01-18"),
            &[
                record(1, "Bench Press", Some(exercise)),
                record(2, "Mystery Lift", None),
            ],
        )
        .await
        .unwrap();

        assert_eq!(outcome.raw_rows, 2);
        assert_eq!(outcome.clean_rows, 1);
        assert_eq!(outcome.unresolved, vec!["Mystery Lift".to_string()]);
        assert_eq!(count_raw_sets(&pool).await.unwrap(), 2);
        let clean = get_clean_sets_for_date(&pool, "2026-01-18").await.unwrap();
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].volume, Some(600.0));
    }

    #[tokio::test]
    async fn same_date_resubmission_appends_raw_and_replaces_clean() {
        let (pool, exercise) = seeded_pool().await;
        let batch = [record(1, "Bench Press", Some(exercise))];
        load_batch(&pool, &session("2026-01-18"), &batch)
            .await
            .unwrap();
        load_batch(&pool, &session("2026-01-18"), &batch)
            .await
            .unwrap();

        // History never deduplicates; the clean table keeps one row per
        // (date, exercise, set index).
        assert_eq!(count_raw_sets(&pool).await.unwrap(), 2);
        let clean = get_clean_sets_for_date(&pool, "2026-01-18").await.unwrap();
        assert_eq!(clean.len(), 1);
    }
}
