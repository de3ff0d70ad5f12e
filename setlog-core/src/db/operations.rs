use log::debug;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{DbSummary, Exercise, NewExercise, SessionRecord, WorkoutSet};

// Exercises (reference table)

pub async fn get_all_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>, sqlx::Error> {
    sqlx::query_as::<_, Exercise>(
        "SELECT exercise_id, name, muscle_group, category FROM exercises ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

/// Replace the whole reference table. This is the curation path, never
/// called from inside an ETL run.
pub async fn replace_exercises(
    pool: &SqlitePool,
    exercises: &[NewExercise],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM exercises")
        .execute(&mut *tx)
        .await?;
    for exercise in exercises {
        sqlx::query("INSERT INTO exercises (name, muscle_group, category) VALUES (?1, ?2, ?3)")
            .bind(&exercise.name)
            .bind(&exercise.muscle_group)
            .bind(&exercise.category)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(exercises.len() as u64)
}

// Session info (single current row)

pub async fn get_current_session(
    pool: &SqlitePool,
) -> Result<Option<SessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, SessionRecord>(
        "SELECT workout_date, location, workout_length, time_of_day, calories, comments
         FROM session_info WHERE id = 1",
    )
    .fetch_optional(pool)
    .await
}

pub async fn replace_session(
    conn: &mut SqliteConnection,
    session: &SessionRecord,
    updated_at: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM session_info")
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO session_info
            (id, workout_date, location, workout_length, time_of_day, calories, comments, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&session.workout_date)
    .bind(&session.location)
    .bind(session.workout_length)
    .bind(&session.time_of_day)
    .bind(session.calories)
    .bind(&session.comments)
    .bind(updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// Raw history (append-only)

pub struct RawSetInsert<'a> {
    pub workout_date: &'a str,
    pub location: Option<&'a str>,
    pub exercise_id: Option<i64>,
    pub exercise_name: &'a str,
    pub muscle_group: Option<&'a str>,
    pub category: Option<&'a str>,
    pub set_index: i64,
    pub reps: Option<f64>,
    pub weight: Option<f64>,
    pub duration: Option<f64>,
    pub distance: Option<f64>,
    pub rpe: Option<f64>,
    pub volume: Option<f64>,
    pub created_at: &'a str,
}

pub async fn append_raw_set(
    conn: &mut SqliteConnection,
    row: &RawSetInsert<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO workout_sets_raw
            (workout_date, location, exercise_id, exercise_name, muscle_group, category,
             set_index, reps, weight, duration, distance, rpe, volume, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(row.workout_date)
    .bind(row.location)
    .bind(row.exercise_id)
    .bind(row.exercise_name)
    .bind(row.muscle_group)
    .bind(row.category)
    .bind(row.set_index)
    .bind(row.reps)
    .bind(row.weight)
    .bind(row.duration)
    .bind(row.distance)
    .bind(row.rpe)
    .bind(row.volume)
    .bind(row.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// Clean table (upserted per workout date)

pub async fn delete_clean_sets_for_date(
    conn: &mut SqliteConnection,
    workout_date: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM workout_sets WHERE workout_date = ?1")
        .bind(workout_date)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_clean_set(
    conn: &mut SqliteConnection,
    set: &WorkoutSet,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO workout_sets
            (workout_date, exercise_id, set_index, reps, weight, duration, distance, rpe, volume)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&set.workout_date)
    .bind(set.exercise_id)
    .bind(set.set_index)
    .bind(set.reps)
    .bind(set.weight)
    .bind(set.duration)
    .bind(set.distance)
    .bind(set.rpe)
    .bind(set.volume)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_clean_sets_for_date(
    pool: &SqlitePool,
    workout_date: &str,
) -> Result<Vec<WorkoutSet>, sqlx::Error> {
    sqlx::query_as::<_, WorkoutSet>(
        "SELECT workout_date, exercise_id, set_index, reps, weight, duration, distance, rpe, volume
         FROM workout_sets WHERE workout_date = ?1
         ORDER BY exercise_id, set_index",
    )
    .bind(workout_date)
    .fetch_all(pool)
    .await
}

pub async fn count_raw_sets(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM workout_sets_raw")
        .fetch_one(pool)
        .await
}

// Summary reporting

pub async fn summarize(pool: &SqlitePool) -> Result<DbSummary, sqlx::Error> {
    let total_sets = count_raw_sets(pool).await?;
    let unique_dates =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT workout_date) FROM workout_sets_raw")
            .fetch_one(pool)
            .await?;
    let volume_by_muscle_group = sqlx::query_as::<_, (String, f64)>(
        "SELECT muscle_group, SUM(volume) AS total_volume
         FROM workout_sets_raw
         WHERE volume IS NOT NULL AND muscle_group IS NOT NULL
         GROUP BY muscle_group
         ORDER BY total_volume DESC
         LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    debug!(
        "summary: {} sets over {} dates",
        total_sets, unique_dates
    );

    Ok(DbSummary {
        total_sets,
        unique_dates,
        volume_by_muscle_group,
    })
}
