use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{PerformanceSample, Student};

pub const NO_DATA_LABEL: &str = "No Data";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse a "Mon D" chart label into a date in the current year. The sentinel
/// and anything else that fails to parse sort to the epoch rather than
/// erroring; labels never carry a year, so dates spanning a year boundary
/// will collide (a known limitation of the label format).
pub fn parse_chart_date(label: &str) -> NaiveDate {
    let epoch = NaiveDate::default();
    let mut parts = label.split(' ');
    let (Some(month), Some(day)) = (parts.next(), parts.next()) else {
        return epoch;
    };
    let Some(month_index) = MONTHS.iter().position(|m| *m == month) else {
        return epoch;
    };
    let Ok(day) = day.parse::<u32>() else {
        return epoch;
    };
    NaiveDate::from_ymd_opt(Utc::now().year(), month_index as u32 + 1, day).unwrap_or(epoch)
}

/// Per-student score rows aligned to one shared date axis. Every row has the
/// same length as `labels`; gaps stay `None` rather than being interpolated.
#[derive(Debug, Clone)]
pub struct TimelineSeries {
    pub labels: Vec<String>,
    pub series: BTreeMap<Uuid, Vec<Option<f64>>>,
}

/// Merge sparse per-student samples onto a single chronological axis.
///
/// Labels are deduplicated by exact string only, then stably sorted by parsed
/// date, so two spellings of the same day remain separate x-axis points in
/// their original relative order. Students with no samples get no row; if no
/// student has any sample the axis degenerates to the sentinel label.
pub fn align(per_student: &[(Uuid, Vec<PerformanceSample>)]) -> TimelineSeries {
    let mut labels: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for (_, samples) in per_student {
        for sample in samples {
            if seen.insert(sample.date.as_str()) {
                labels.push(sample.date.clone());
            }
        }
    }
    labels.sort_by_key(|label| parse_chart_date(label));

    if labels.is_empty() {
        return TimelineSeries {
            labels: vec![NO_DATA_LABEL.to_string()],
            series: BTreeMap::new(),
        };
    }

    let mut series = BTreeMap::new();
    for (student_id, samples) in per_student {
        if samples.is_empty() {
            continue;
        }
        let by_label: HashMap<&str, f64> = samples
            .iter()
            .map(|sample| (sample.date.as_str(), sample.cwpm))
            .collect();
        let row = labels
            .iter()
            .map(|label| {
                if label == NO_DATA_LABEL {
                    None
                } else {
                    by_label.get(label.as_str()).copied()
                }
            })
            .collect();
        series.insert(*student_id, row);
    }

    TimelineSeries { labels, series }
}

#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataset {
    pub student_id: Uuid,
    pub label: String,
    pub data: Vec<Option<f64>>,
}

/// Attach student names to the aligned rows, in roster order.
pub fn chart_payload(series: &TimelineSeries, students: &[Student]) -> ChartPayload {
    let datasets = students
        .iter()
        .filter_map(|student| {
            series.series.get(&student.id).map(|row| ChartDataset {
                student_id: student.id,
                label: student.name.clone(),
                data: row.clone(),
            })
        })
        .collect();
    ChartPayload {
        labels: series.labels.clone(),
        datasets,
    }
}
