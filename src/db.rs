use anyhow::{bail, Context};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AssessmentDetail, AssessmentRef, AssessmentSummary, Outcome, PerformanceSample, Student, Word,
};
use crate::words;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn add_student(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
    grade: &str,
    course: &str,
) -> anyhow::Result<Uuid> {
    let row = sqlx::query(
        r#"
        INSERT INTO reading_fluency.students (id, name, email, password, grade, course)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET name = EXCLUDED.name, grade = EXCLUDED.grade, course = EXCLUDED.course
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password)
    .bind(grade)
    .bind(course)
    .fetch_one(pool)
    .await?;

    Ok(row.get("id"))
}

fn student_from_row(row: &sqlx::postgres::PgRow) -> Student {
    Student {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        grade: row.get("grade"),
        course: row.get("course"),
        latest_cwpm: row.get("latest_cwpm"),
    }
}

const STUDENT_WITH_LATEST: &str = "SELECT s.id, s.name, s.email, s.grade, s.course, \
     latest.cwpm_score AS latest_cwpm \
     FROM reading_fluency.students s \
     LEFT JOIN LATERAL ( \
         SELECT a.cwpm_score FROM reading_fluency.assessments a \
         WHERE a.student_id = s.id \
         ORDER BY a.assessment_date DESC, a.created_at DESC \
         LIMIT 1 \
     ) latest ON true";

pub async fn list_students(pool: &PgPool) -> anyhow::Result<Vec<Student>> {
    let query = format!("{STUDENT_WITH_LATEST} ORDER BY s.name");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    Ok(rows.iter().map(student_from_row).collect())
}

pub async fn find_student(pool: &PgPool, email: &str) -> anyhow::Result<Student> {
    let query = format!("{STUDENT_WITH_LATEST} WHERE s.email = $1");
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no student with email {email}"))?;
    Ok(student_from_row(&row))
}

/// All assessments for a student, oldest first. Ties on the assessment date
/// break on insertion time, so same-day retests keep their entry order.
pub async fn fetch_assessments(pool: &PgPool, student_id: Uuid) -> anyhow::Result<Vec<AssessmentRef>> {
    let rows = sqlx::query(
        "SELECT id, assessment_date FROM reading_fluency.assessments \
         WHERE student_id = $1 \
         ORDER BY assessment_date, created_at",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| AssessmentRef {
            id: row.get("id"),
            assessment_date: row.get("assessment_date"),
        })
        .collect())
}

/// Score history with dates pre-rendered as "Mon D" chart labels.
pub async fn fetch_performance(pool: &PgPool, student_id: Uuid) -> anyhow::Result<Vec<PerformanceSample>> {
    let rows = sqlx::query(
        "SELECT assessment_date, cwpm_score FROM reading_fluency.assessments \
         WHERE student_id = $1 \
         ORDER BY assessment_date, created_at",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let date: NaiveDate = row.get("assessment_date");
            PerformanceSample {
                date: date.format("%b %-d").to_string(),
                cwpm: row.get("cwpm_score"),
            }
        })
        .collect())
}

pub async fn fetch_assessment(pool: &PgPool, assessment_id: Uuid) -> anyhow::Result<AssessmentDetail> {
    let row = sqlx::query(
        "SELECT id, passage, cwpm_score, total_words, total_correct, total_missed, \
         total_extras, total_incorrect, assessment_date \
         FROM reading_fluency.assessments WHERE id = $1",
    )
    .bind(assessment_id)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no assessment with id {assessment_id}"))?;

    let summary = AssessmentSummary {
        id: row.get("id"),
        passage: row.get("passage"),
        cwpm_score: row.get("cwpm_score"),
        total_words: row.get("total_words"),
        total_correct: row.get("total_correct"),
        total_missed: row.get("total_missed"),
        total_extras: row.get("total_extras"),
        total_incorrect: row.get("total_incorrect"),
        assessment_date: row.get("assessment_date"),
    };

    let word_rows = sqlx::query(
        "SELECT word_text, student_answer, word_type, timestamp_start, timestamp_end \
         FROM reading_fluency.word_results \
         WHERE assessment_id = $1 \
         ORDER BY word_position",
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await?;

    let words = word_rows
        .iter()
        .map(|row| {
            let label: String = row.get("word_type");
            Word {
                text: row.get("word_text"),
                student_answer: row.get("student_answer"),
                outcome: Outcome::from_label(&label),
                start_seconds: row.get("timestamp_start"),
                end_seconds: row.get("timestamp_end"),
            }
        })
        .collect();

    Ok(AssessmentDetail { summary, words })
}

pub struct NewAssessment {
    pub student_id: Uuid,
    pub passage: String,
    pub cwpm_score: f64,
    pub words: Vec<Word>,
    pub assessment_date: NaiveDate,
}

/// Record an assessment with optional word-level detail. Input is validated
/// before the first query so a bad submission never reaches the database.
pub async fn create_assessment(pool: &PgPool, new: &NewAssessment) -> anyhow::Result<Uuid> {
    if new.passage.trim().is_empty() {
        bail!("the reading passage must not be empty");
    }
    if new.cwpm_score <= 0.0 {
        bail!("the CWPM score must be positive");
    }

    let counts = words::tally(&new.words);
    let total_words = if new.words.is_empty() {
        new.passage.split_whitespace().count() as i64
    } else {
        counts.total()
    };

    let assessment_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO reading_fluency.assessments
        (id, student_id, passage, cwpm_score, total_words, total_correct,
         total_missed, total_extras, total_incorrect, assessment_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(assessment_id)
    .bind(new.student_id)
    .bind(&new.passage)
    .bind(new.cwpm_score)
    .bind(total_words)
    .bind(counts.correct)
    .bind(counts.missed)
    .bind(counts.extras)
    .bind(counts.incorrect)
    .bind(new.assessment_date)
    .execute(pool)
    .await?;

    insert_words(pool, assessment_id, &new.words).await?;
    Ok(assessment_id)
}

async fn insert_words(pool: &PgPool, assessment_id: Uuid, words: &[Word]) -> anyhow::Result<()> {
    for (index, word) in words.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO reading_fluency.word_results
            (id, assessment_id, word_text, student_answer, word_type,
             word_position, timestamp_start, timestamp_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(assessment_id)
        .bind(&word.text)
        .bind(&word.student_answer)
        .bind(word.outcome.as_str())
        .bind(index as i64 + 1)
        .bind(word.start_seconds)
        .bind(word.end_seconds)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn export_students_csv(pool: &PgPool, path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Serialize)]
    struct CsvRow<'a> {
        name: &'a str,
        email: &'a str,
        grade: &'a str,
        course: &'a str,
        latest_cwpm: f64,
    }

    let students = list_students(pool).await?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for student in &students {
        writer.serialize(CsvRow {
            name: &student.name,
            email: &student.email,
            grade: &student.grade,
            course: &student.course,
            latest_cwpm: student.latest_cwpm.unwrap_or(0.0),
        })?;
    }

    writer.flush()?;
    Ok(students.len())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("650e8400-e29b-41d4-a716-446655440001")?,
            "Emma Johnson",
            "emma.johnson@school.example",
            "3",
            "Reading Foundations",
        ),
        (
            Uuid::parse_str("650e8400-e29b-41d4-a716-446655440002")?,
            "Liam Smith",
            "liam.smith@school.example",
            "3",
            "Reading Foundations",
        ),
        (
            Uuid::parse_str("650e8400-e29b-41d4-a716-446655440003")?,
            "Olivia Davis",
            "olivia.davis@school.example",
            "4",
            "Fluency Builders",
        ),
    ];

    for (id, name, email, grade, course) in students.iter().copied() {
        sqlx::query(
            r#"
            INSERT INTO reading_fluency.students (id, name, email, password, grade, course)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, grade = EXCLUDED.grade, course = EXCLUDED.course
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind("changeme")
        .bind(grade)
        .bind(course)
        .fetch_one(pool)
        .await?;
    }

    let emma = students[0].0;
    let liam = students[1].0;
    let olivia = students[2].0;

    let plain = vec![
        ("a2e1c001-0000-4000-8000-000000000001", emma, 72.0, (2026, 1, 5)),
        ("a2e1c001-0000-4000-8000-000000000002", emma, 78.5, (2026, 1, 19)),
        ("a2e1c001-0000-4000-8000-000000000003", liam, 61.0, (2026, 1, 12)),
        ("a2e1c001-0000-4000-8000-000000000004", olivia, 88.0, (2026, 1, 7)),
        ("a2e1c001-0000-4000-8000-000000000005", olivia, 91.5, (2026, 2, 2)),
    ];

    for (id, student_id, cwpm, (year, month, day)) in plain {
        let date = NaiveDate::from_ymd_opt(year, month, day).context("invalid seed date")?;
        seed_assessment(
            pool,
            Uuid::parse_str(id)?,
            student_id,
            cwpm,
            date,
            "The sun rose over the quiet town and the streets slowly came to life",
            &[],
        )
        .await?;
    }

    let detail_words = seed_words();
    let date = NaiveDate::from_ymd_opt(2026, 2, 9).context("invalid seed date")?;
    seed_assessment(
        pool,
        Uuid::parse_str("a2e1c001-0000-4000-8000-000000000006")?,
        emma,
        81.0,
        date,
        &words::passage_text(&detail_words),
        &detail_words,
    )
    .await?;

    Ok(())
}

fn seed_words() -> Vec<Word> {
    let entries: [(&str, Option<&str>, Outcome); 9] = [
        ("The", Some("The"), Outcome::Correct),
        ("sun", Some("sun"), Outcome::Correct),
        ("rose", Some("rows"), Outcome::Incorrect),
        ("over", Some("over"), Outcome::Correct),
        ("the", None, Outcome::Missed),
        ("quiet", Some("quiet"), Outcome::Correct),
        ("um", Some("um"), Outcome::Extra),
        ("little", Some("little"), Outcome::Correct),
        ("town", Some("town"), Outcome::Correct),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (text, answer, outcome))| Word {
            text: text.to_string(),
            student_answer: answer.map(str::to_string),
            outcome: *outcome,
            start_seconds: i as f64 * 0.6,
            end_seconds: i as f64 * 0.6 + 0.4,
        })
        .collect()
}

async fn seed_assessment(
    pool: &PgPool,
    id: Uuid,
    student_id: Uuid,
    cwpm: f64,
    date: NaiveDate,
    passage: &str,
    words: &[Word],
) -> anyhow::Result<()> {
    let counts = words::tally(words);
    let total_words = if words.is_empty() {
        passage.split_whitespace().count() as i64
    } else {
        counts.total()
    };

    let result = sqlx::query(
        r#"
        INSERT INTO reading_fluency.assessments
        (id, student_id, passage, cwpm_score, total_words, total_correct,
         total_missed, total_extras, total_incorrect, assessment_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(student_id)
    .bind(passage)
    .bind(cwpm)
    .bind(total_words)
    .bind(counts.correct)
    .bind(counts.missed)
    .bind(counts.extras)
    .bind(counts.incorrect)
    .bind(date)
    .execute(pool)
    .await?;

    // Word rows only go in alongside a fresh assessment; reruns are no-ops.
    if result.rows_affected() > 0 {
        insert_words(pool, id, words).await?;
    }

    Ok(())
}
