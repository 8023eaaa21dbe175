use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Outcome, Word};

/// Raw ASR alignment output. The field casing and the numeric-or-string
/// offsets come from the upstream aligner; everything is coerced here so the
/// rest of the code never sees this shape.
#[derive(Debug, Deserialize)]
pub struct RawAlignment {
    #[serde(default)]
    pub cwpm: Value,
    #[serde(default)]
    pub words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
pub struct RawWord {
    #[serde(rename = "Word", default)]
    pub text: String,
    #[serde(rename = "Align", default)]
    pub align: Option<String>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub start: Value,
    #[serde(default)]
    pub end: Value,
}

/// Lenient numeric coercion: numbers pass through, numeric strings parse,
/// everything else becomes 0.0. Never errors.
pub fn seconds_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn load_alignment(path: &Path) -> anyhow::Result<RawAlignment> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid alignment JSON", path.display()))
}

/// Normalize a raw alignment into the closed word model: legacy outcome
/// labels remapped, offsets coerced, empty answers dropped.
pub fn normalize(raw: &RawAlignment) -> (f64, Vec<Word>) {
    let cwpm = seconds_from_value(&raw.cwpm);
    let words = raw
        .words
        .iter()
        .map(|word| Word {
            text: word.text.clone(),
            student_answer: word
                .align
                .as_deref()
                .map(str::trim)
                .filter(|answer| !answer.is_empty())
                .map(str::to_string),
            outcome: Outcome::from_label(&word.error),
            start_seconds: seconds_from_value(&word.start),
            end_seconds: seconds_from_value(&word.end),
        })
        .collect();
    (cwpm, words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_offsets_from_numbers_and_strings() {
        assert_eq!(seconds_from_value(&json!(1.25)), 1.25);
        assert_eq!(seconds_from_value(&json!("2.5")), 2.5);
        assert_eq!(seconds_from_value(&json!(" 3 ")), 3.0);
        assert_eq!(seconds_from_value(&json!("fast")), 0.0);
        assert_eq!(seconds_from_value(&Value::Null), 0.0);
        assert_eq!(seconds_from_value(&json!([1.0])), 0.0);
    }

    #[test]
    fn normalizes_a_raw_alignment() {
        let raw: RawAlignment = serde_json::from_value(json!({
            "cwpm": "92.5",
            "words": [
                {"Word": "The", "Align": "The", "error": "right", "start": 0.1, "end": "0.4"},
                {"Word": "cat", "Align": "", "error": "missed", "start": "0.5", "end": 0.9},
                {"Word": "sat", "Align": "sad", "error": "incorrect", "start": "oops", "end": 1.6}
            ]
        }))
        .expect("valid raw alignment");

        let (cwpm, words) = normalize(&raw);
        assert_eq!(cwpm, 92.5);
        assert_eq!(words.len(), 3);

        assert_eq!(words[0].outcome, Outcome::Correct);
        assert_eq!(words[0].student_answer.as_deref(), Some("The"));
        assert_eq!(words[0].start_seconds, 0.1);
        assert_eq!(words[0].end_seconds, 0.4);

        assert_eq!(words[1].outcome, Outcome::Missed);
        assert_eq!(words[1].student_answer, None);

        assert_eq!(words[2].outcome, Outcome::Incorrect);
        assert_eq!(words[2].student_answer.as_deref(), Some("sad"));
        assert_eq!(words[2].start_seconds, 0.0);
        assert_eq!(words[2].end_seconds, 1.6);
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let raw: RawAlignment =
            serde_json::from_value(json!({"words": [{"Word": "hello"}]})).expect("parses");
        let (cwpm, words) = normalize(&raw);
        assert_eq!(cwpm, 0.0);
        assert_eq!(words[0].outcome, Outcome::Correct);
        assert_eq!(words[0].student_answer, None);
        assert_eq!(words[0].start_seconds, 0.0);
    }
}
