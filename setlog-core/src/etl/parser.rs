use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One staged set row, straight from the input source. All numeric-ish
/// fields stay raw text here; typing happens in `metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSetRow {
    pub exercise_name: String,
    pub reps: String,
    pub weight: String,
    pub duration: String,
    pub distance: String,
    pub rpe: String,
}

/// Parse a staged text blob into set rows. Pure and infallible: malformed
/// lines are dropped, never reported.
///
/// The blob may arrive double-escaped (literal `\n` / `\r` two-character
/// sequences instead of real line breaks), so normalization runs in a fixed
/// order: strip carriage returns in both forms, turn literal newline escapes
/// into real newlines, then split, trim, and drop empty lines. Each line
/// splits on commas into at most six positional fields; a missing trailing
/// field is an empty string, and a line with no exercise name yields no row.
pub fn parse_blob(blob: &str) -> Vec<RawSetRow> {
    let normalized = blob.replace("\\r", "").replace('\r', "");
    let normalized = normalized.replace("\\n", "\n");

    normalized
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<RawSetRow> {
    let mut fields = line.splitn(6, ',').map(str::trim);

    let exercise_name = fields.next().unwrap_or("");
    if exercise_name.is_empty() {
        return None;
    }

    let mut next = || fields.next().unwrap_or("").to_string();
    Some(RawSetRow {
        exercise_name: exercise_name.to_string(),
        reps: next(),
        weight: next(),
        duration: next(),
        distance: next(),
        rpe: next(),
    })
}

/// Convert pre-split row mappings (the boundary's alternate input shape)
/// into the same records `parse_blob` produces, with the same rule: rows
/// without an exercise name are skipped.
pub fn rows_from_mappings(mappings: &[HashMap<String, String>]) -> Vec<RawSetRow> {
    let field = |mapping: &HashMap<String, String>, key: &str| {
        mapping.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
    };

    mappings
        .iter()
        .filter_map(|mapping| {
            let exercise_name = field(mapping, "exercise_name");
            if exercise_name.is_empty() {
                return None;
            }
            Some(RawSetRow {
                exercise_name,
                reps: field(mapping, "reps"),
                weight: field(mapping, "weight"),
                duration: field(mapping, "duration"),
                distance: field(mapping, "distance"),
                rpe: field(mapping, "rpe"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_rows() {
        let rows = parse_blob("Bench Press,10,60,,,7\nPull-ups,8,0,,,6");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].exercise_name, "Bench Press");
        assert_eq!(rows[0].reps, "10");
        assert_eq!(rows[0].weight, "60");
        assert_eq!(rows[0].duration, "");
        assert_eq!(rows[0].rpe, "7");
        assert_eq!(rows[1].exercise_name, "Pull-ups");
        assert_eq!(rows[1].weight, "0");
    }

    #[test]
    fn literal_escapes_parse_like_real_newlines() {
        let real = parse_blob("Bench Press,10,60,,,7\nPull-ups,8,0,,,6");
        let escaped = parse_blob("Bench Press,10,60,,,7\\nPull-ups,8,0,,,6");
        assert_eq!(real, escaped);
    }

    #[test]
    fn carriage_returns_are_stripped_in_both_forms() {
        let rows = parse_blob("Bench Press,10,60,,,7\\r\\nSquat,5,100,,,9\r\nDeadlift,3,140,,,9");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].exercise_name, "Squat");
        assert_eq!(rows[2].exercise_name, "Deadlift");
    }

    #[test]
    fn parsing_is_idempotent_per_input() {
        let blob = " \nBench Press,10,60,,,7\n\nSquat,5,100\n ";
        assert_eq!(parse_blob(blob), parse_blob(blob));
    }

    #[test]
    fn ragged_row_pads_missing_fields() {
        let rows = parse_blob("Plank");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name, "Plank");
        assert_eq!(rows[0].reps, "");
        assert_eq!(rows[0].weight, "");
        assert_eq!(rows[0].duration, "");
        assert_eq!(rows[0].distance, "");
        assert_eq!(rows[0].rpe, "");
    }

    #[test]
    fn empty_exercise_name_skips_the_line() {
        assert!(parse_blob(",10,60,,,7").is_empty());
        let rows = parse_blob(",10,60,,,7\nSquat,5,100,,,9");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name, "Squat");
    }

    #[test]
    fn blank_blob_yields_no_rows() {
        assert!(parse_blob("").is_empty());
        assert!(parse_blob(" \n\t\n\\r\\n ").is_empty());
    }

    #[test]
    fn mappings_follow_the_same_skip_rule() {
        let make = |name: &str| {
            let mut m = HashMap::new();
            m.insert("exercise_name".to_string(), name.to_string());
            m.insert("reps".to_string(), "5".to_string());
            m
        };
        let rows = rows_from_mappings(&[make("Squat"), make(""), make("  ")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name, "Squat");
        assert_eq!(rows[0].reps, "5");
        assert_eq!(rows[0].weight, "");
    }
}
