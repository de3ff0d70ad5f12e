use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::db::models::{Exercise, SessionRecord};
use crate::error::EtlError;
use crate::etl::parser::RawSetRow;

/// Coarse session timing derived from the staged timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Am,
    Pm,
    Evening,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Am => write!(f, "AM"),
            TimeOfDay::Pm => write!(f, "PM"),
            TimeOfDay::Evening => write!(f, "Evening"),
        }
    }
}

pub fn classify_hour(hour: u32) -> TimeOfDay {
    match hour {
        0..12 => TimeOfDay::Am,
        12..17 => TimeOfDay::Pm,
        _ => TimeOfDay::Evening,
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Classify a combined date-and-time string. A timestamp with no separable
/// time token is a valid unknown, not an error.
pub fn time_of_day(raw: &str) -> Option<TimeOfDay> {
    let trimmed = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| classify_hour(dt.hour()))
}

/// Parse an optional numeric field: empty means absent, not zero.
pub fn parse_optional_number(
    field: &'static str,
    row: usize,
    raw: &str,
) -> Result<Option<f64>, EtlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| EtlError::InvalidNumericField {
            field,
            row,
            value: trimmed.to_string(),
        })
}

/// A fully typed set record. `exercise` is `None` when resolution failed;
/// such rows still reach the raw table but never the clean one.
#[derive(Debug, Clone)]
pub struct TypedSetRecord {
    pub set_index: i64,
    pub exercise_name: String,
    pub exercise: Option<Exercise>,
    pub reps: Option<f64>,
    pub weight: Option<f64>,
    pub duration: Option<f64>,
    pub distance: Option<f64>,
    pub rpe: Option<f64>,
    pub volume: Option<f64>,
}

/// Type one raw row and compute its derived metrics. `row` is the 1-based
/// position in the batch, which doubles as the set index for the day.
pub fn typed_record(
    raw: &RawSetRow,
    row: usize,
    exercise: Option<Exercise>,
) -> Result<TypedSetRecord, EtlError> {
    let reps = parse_optional_number("reps", row, &raw.reps)?;
    let weight = parse_optional_number("weight", row, &raw.weight)?;
    let duration = parse_optional_number("duration", row, &raw.duration)?;
    let distance = parse_optional_number("distance", row, &raw.distance)?;
    let rpe = parse_optional_number("rpe", row, &raw.rpe)?;

    // Volume only exists when both factors do; missing is never zero-filled.
    let volume = match (reps, weight) {
        (Some(r), Some(w)) => Some(r * w),
        _ => None,
    };

    Ok(TypedSetRecord {
        set_index: row as i64,
        exercise_name: raw.exercise_name.clone(),
        exercise,
        reps,
        weight,
        duration,
        distance,
        rpe,
        volume,
    })
}

/// Build the typed session record from the staged field map. The workout
/// date must be resolvable before any set referencing it persists.
pub fn session_record(fields: &HashMap<String, String>) -> Result<SessionRecord, EtlError> {
    let raw_date = fields
        .get("workout_date")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(EtlError::MissingSessionField("workout_date"))?;

    let date_part = raw_date
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(raw_date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| EtlError::InvalidSessionDate(raw_date.to_string()))?;

    let text = |key: &str| {
        fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let workout_length = match fields.get("workout_length") {
        Some(v) => parse_optional_number("workout_length", 0, v)?,
        None => None,
    };
    let calories = match fields.get("calories") {
        Some(v) => parse_optional_number("calories", 0, v)?,
        None => None,
    };

    Ok(SessionRecord {
        workout_date: date_part.to_string(),
        location: text("location"),
        workout_length,
        time_of_day: time_of_day(raw_date).map(|t| t.to_string()),
        calories,
        comments: text("comments"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(reps: &str, weight: &str) -> RawSetRow {
        RawSetRow {
            exercise_name: "Bench Press".to_string(),
            reps: reps.to_string(),
            weight: weight.to_string(),
            duration: String::new(),
            distance: String::new(),
            rpe: "7".to_string(),
        }
    }

    #[test]
    fn volume_requires_both_reps_and_weight() {
        let record = typed_record(&raw("10", "60"), 1, None).unwrap();
        assert_eq!(record.volume, Some(600.0));

        let record = typed_record(&raw("10", ""), 1, None).unwrap();
        assert_eq!(record.reps, Some(10.0));
        assert_eq!(record.weight, None);
        assert_eq!(record.volume, None);
    }

    #[test]
    fn empty_field_is_absent_not_zero() {
        let record = typed_record(&raw("", ""), 2, None).unwrap();
        assert_eq!(record.reps, None);
        assert_eq!(record.weight, None);
        assert_eq!(record.rpe, Some(7.0));
        assert_eq!(record.set_index, 2);
    }

    #[test]
    fn non_numeric_field_names_field_and_row() {
        let err = typed_record(&raw("ten", "60"), 3, None).unwrap_err();
        match err {
            EtlError::InvalidNumericField { field, row, value } => {
                assert_eq!(field, "reps");
                assert_eq!(row, 3);
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn hour_boundaries() {
        assert_eq!(classify_hour(0), TimeOfDay::Am);
        assert_eq!(classify_hour(11), TimeOfDay::Am);
        assert_eq!(classify_hour(12), TimeOfDay::Pm);
        assert_eq!(classify_hour(16), TimeOfDay::Pm);
        assert_eq!(classify_hour(17), TimeOfDay::Evening);
        assert_eq!(classify_hour(23), TimeOfDay::Evening);
    }

    #[test]
    fn timestamp_without_time_token_is_unknown() {
        assert_eq!(time_of_day("2026-01-18"), None);
        assert_eq!(time_of_day("2026-01-18 06:30"), Some(TimeOfDay::Am));
        assert_eq!(time_of_day("2026-01-18T18:30:00"), Some(TimeOfDay::Evening));
    }

    #[test]
    fn session_record_requires_a_parsable_date() {
        let mut fields = HashMap::new();
        assert!(matches!(
            session_record(&fields),
            Err(EtlError::MissingSessionField("workout_date"))
        ));

        fields.insert("workout_date".to_string(), "yesterday".to_string());
        assert!(matches!(
            session_record(&fields),
            Err(EtlError::InvalidSessionDate(_))
        ));

        fields.insert("workout_date".to_string(), "2026-01-18 18:30".to_string());
        fields.insert("location".to_string(), "Gym".to_string());
        fields.insert("workout_length".to_string(), "45".to_string());
        let session = session_record(&fields).unwrap();
        assert_eq!(session.workout_date, "2026-01-18");
        assert_eq!(session.location.as_deref(), Some("Gym"));
        assert_eq!(session.workout_length, Some(45.0));
        assert_eq!(session.time_of_day.as_deref(), Some("Evening"));
        assert_eq!(session.calories, None);
    }
}
