use std::collections::HashMap;

use crate::db::models::Exercise;
use crate::error::EtlError;

/// In-memory index over the reference table for one run. Lookup is exact
/// match on the trimmed, lowercased display name; the reference table is
/// never mutated here (no auto-creation of exercises).
pub struct ExerciseResolver {
    by_name: HashMap<String, Exercise>,
}

impl ExerciseResolver {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        let by_name = exercises
            .into_iter()
            .map(|e| (e.name.trim().to_lowercase(), e))
            .collect();
        Self { by_name }
    }

    pub fn resolve(&self, name: &str, row: usize) -> Result<&Exercise, EtlError> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| EtlError::UnresolvedExercise {
                name: name.trim().to_string(),
                row,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ExerciseResolver {
        ExerciseResolver::new(vec![Exercise {
            exercise_id: 3,
            name: "Bench Press".to_string(),
            muscle_group: Some("Chest".to_string()),
            category: Some("Barbell".to_string()),
        }])
    }

    #[test]
    fn resolution_ignores_case_and_surrounding_whitespace() {
        let r = resolver();
        for name in ["bench press", "Bench Press", " Bench Press ", "BENCH PRESS"] {
            assert_eq!(r.resolve(name, 1).unwrap().exercise_id, 3);
        }
    }

    #[test]
    fn unknown_name_reports_name_and_row() {
        let err = resolver().resolve(" Zercher Squat ", 4).unwrap_err();
        match err {
            EtlError::UnresolvedExercise { name, row } => {
                assert_eq!(name, "Zercher Squat");
                assert_eq!(row, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
