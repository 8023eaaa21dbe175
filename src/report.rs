use std::fmt::Write;

use crate::models::{AssessmentDetail, Outcome, PerformanceSample, Student};

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn build_report(
    student: &Student,
    history: &[PerformanceSample],
    latest: Option<&AssessmentDetail>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Reading Fluency Report");
    let _ = writeln!(
        output,
        "Generated for {} (grade {}, {})",
        student.name, student.grade, student.course
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance History");

    if history.is_empty() {
        let _ = writeln!(output, "No assessments recorded yet.");
    } else {
        for sample in history {
            let _ = writeln!(output, "- {}: {:.1} CWPM", sample.date, sample.cwpm);
        }
    }

    let Some(detail) = latest else {
        return output;
    };
    let summary = &detail.summary;

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Assessment ({})", summary.assessment_date);
    let _ = writeln!(
        output,
        "Score {:.1} CWPM over {} words.",
        summary.cwpm_score, summary.total_words
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "### Error Distribution");

    let total = summary.total_correct
        + summary.total_missed
        + summary.total_extras
        + summary.total_incorrect;
    let rows = [
        ("correct", summary.total_correct),
        ("missed", summary.total_missed),
        ("extra", summary.total_extras),
        ("incorrect", summary.total_incorrect),
    ];
    for (label, count) in rows {
        let _ = writeln!(output, "- {}: {} ({:.1}%)", label, count, percent(count, total));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Errors");

    if detail.words.is_empty() {
        let _ = writeln!(output, "No word-level detail recorded for this assessment.");
        return output;
    }

    let mut wrote_error = false;
    for word in &detail.words {
        let note = match word.outcome {
            Outcome::Correct => continue,
            Outcome::Missed => "not attempted".to_string(),
            Outcome::Extra => "inserted by the reader".to_string(),
            Outcome::Incorrect => match &word.student_answer {
                Some(answer) => format!("read as \"{answer}\""),
                None => "read as --".to_string(),
            },
        };
        let _ = writeln!(output, "- {} ({}): {}", word.text, word.outcome.as_str(), note);
        wrote_error = true;
    }
    if !wrote_error {
        let _ = writeln!(output, "No errors found.");
    }

    output
}
