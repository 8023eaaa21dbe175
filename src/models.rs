use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub grade: String,
    pub course: String,
    pub latest_cwpm: Option<f64>,
}

/// One assessment's score on a given day, with the date already rendered as
/// the chart label ("Mon D"). The label is the only identity the chart sees.
#[derive(Debug, Clone)]
pub struct PerformanceSample {
    pub date: String,
    pub cwpm: f64,
}

#[derive(Debug, Clone)]
pub struct AssessmentRef {
    pub id: Uuid,
    pub assessment_date: NaiveDate,
}

/// Per-word classification. The legacy label "right" and anything
/// unrecognized collapse to `Correct` at the ingestion boundary; the rest of
/// the code only ever sees this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Missed,
    Extra,
    Incorrect,
}

impl Outcome {
    pub fn from_label(label: &str) -> Outcome {
        match label.to_ascii_lowercase().as_str() {
            "correct" | "right" => Outcome::Correct,
            "missed" => Outcome::Missed,
            "extra" => Outcome::Extra,
            "incorrect" => Outcome::Incorrect,
            _ => Outcome::Correct,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Missed => "missed",
            Outcome::Extra => "extra",
            Outcome::Incorrect => "incorrect",
        }
    }
}

/// One word of a read passage, in passage order. `student_answer` is what the
/// reader actually said; it is absent for missed words.
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub student_answer: Option<String>,
    pub outcome: Outcome,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct AssessmentSummary {
    pub id: Uuid,
    pub passage: String,
    pub cwpm_score: f64,
    pub total_words: i64,
    pub total_correct: i64,
    pub total_missed: i64,
    pub total_extras: i64,
    pub total_incorrect: i64,
    pub assessment_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct AssessmentDetail {
    pub summary: AssessmentSummary,
    pub words: Vec<Word>,
}
