use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod db;
mod ingest;
mod models;
mod playback;
mod report;
mod timeline;
mod words;

use crate::models::Word;
use crate::playback::{PlaybackMode, Sequencer, StartError};

#[derive(Parser)]
#[command(name = "reading-fluency-dashboard")]
#[command(about = "Reading fluency assessment dashboard and review tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Register a student (upserts by email)
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        grade: String,
        #[arg(long)]
        course: String,
    },
    /// List the roster with each student's latest CWPM
    Roster,
    /// Export the roster to CSV
    Export {
        #[arg(long, default_value = "students.csv")]
        out: PathBuf,
    },
    /// Record an assessment from a raw ASR alignment JSON file
    Import {
        #[arg(long)]
        json: PathBuf,
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record an assessment by hand (no word-level detail)
    Record {
        #[arg(long)]
        email: String,
        #[arg(long)]
        passage: String,
        #[arg(long)]
        cwpm: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Emit the roster-wide performance chart data as JSON
    Chart {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report for one student
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Step through an assessment word by word on a timer
    #[command(group(
        ArgGroup::new("target")
            .args(["email", "assessment"])
            .required(true)
            .multiple(false)
    ))]
    Review {
        /// Review the student's latest assessment
        #[arg(long)]
        email: Option<String>,
        /// Review a specific assessment by id
        #[arg(long)]
        assessment: Option<Uuid>,
        #[arg(long)]
        errors_only: bool,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Drive playback by hand instead of the timer
        #[arg(long)]
        interactive: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::AddStudent {
            name,
            email,
            password,
            grade,
            course,
        } => {
            let id = db::add_student(&pool, &name, &email, &password, &grade, &course).await?;
            println!("Student {name} ready with id {id}.");
        }
        Commands::Roster => {
            let students = db::list_students(&pool).await?;
            if students.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            println!("Students:");
            for student in &students {
                let latest = match student.latest_cwpm {
                    Some(cwpm) => format!("{cwpm:.0} CWPM"),
                    None => "no assessments".to_string(),
                };
                println!(
                    "- {} <{}> (grade {}, {}) {}",
                    student.name, student.email, student.grade, student.course, latest
                );
            }
        }
        Commands::Export { out } => {
            let exported = db::export_students_csv(&pool, &out).await?;
            println!("Exported {exported} students to {}.", out.display());
        }
        Commands::Import { json, email, date } => {
            let student = db::find_student(&pool, &email).await?;
            let raw = ingest::load_alignment(&json)?;
            let (cwpm, words) = ingest::normalize(&raw);
            let new = db::NewAssessment {
                student_id: student.id,
                passage: words::passage_text(&words),
                cwpm_score: cwpm,
                words,
                assessment_date: date.unwrap_or_else(|| Utc::now().date_naive()),
            };
            let id = db::create_assessment(&pool, &new).await?;
            println!(
                "Imported assessment {id} for {} ({} words, {:.1} CWPM).",
                student.name,
                new.words.len(),
                new.cwpm_score
            );
        }
        Commands::Record {
            email,
            passage,
            cwpm,
            date,
        } => {
            let student = db::find_student(&pool, &email).await?;
            let new = db::NewAssessment {
                student_id: student.id,
                passage,
                cwpm_score: cwpm,
                words: Vec::new(),
                assessment_date: date.unwrap_or_else(|| Utc::now().date_naive()),
            };
            let id = db::create_assessment(&pool, &new).await?;
            println!("Recorded assessment {id} for {}.", student.name);
        }
        Commands::Chart { out } => {
            let students = db::list_students(&pool).await?;
            let mut per_student = Vec::new();
            for student in &students {
                let samples = db::fetch_performance(&pool, student.id).await?;
                per_student.push((student.id, samples));
            }
            let aligned = timeline::align(&per_student);
            let payload = timeline::chart_payload(&aligned, &students);
            let json = serde_json::to_string_pretty(&payload)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Chart data written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report { email, out } => {
            let student = db::find_student(&pool, &email).await?;
            let history = db::fetch_performance(&pool, student.id).await?;
            let assessments = db::fetch_assessments(&pool, student.id).await?;
            let latest = match assessments.last() {
                Some(latest) => Some(db::fetch_assessment(&pool, latest.id).await?),
                None => None,
            };
            let report = report::build_report(&student, &history, latest.as_ref());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Review {
            email,
            assessment,
            errors_only,
            interval_ms,
            interactive,
        } => {
            let detail = match (assessment, email) {
                (Some(id), _) => db::fetch_assessment(&pool, id).await?,
                (None, Some(email)) => {
                    let student = db::find_student(&pool, &email).await?;
                    let assessments = db::fetch_assessments(&pool, student.id).await?;
                    let latest = assessments
                        .last()
                        .with_context(|| format!("{} has no recorded assessments", student.name))?;
                    println!(
                        "Reviewing {}'s assessment from {}.",
                        student.name, latest.assessment_date
                    );
                    db::fetch_assessment(&pool, latest.id).await?
                }
                (None, None) => unreachable!("clap enforces the target group"),
            };
            println!(
                "Assessment {} dated {}.",
                detail.summary.id, detail.summary.assessment_date
            );
            println!("Passage: {}", detail.summary.passage);
            println!();
            if interactive {
                interactive_review(&detail.words)?;
            } else {
                review(&detail.words, errors_only, interval_ms).await;
            }
        }
    }

    Ok(())
}

async fn review(passage_words: &[Word], errors_only: bool, interval_ms: u64) {
    let mut sequencer = Sequencer::new(passage_words);
    let started = if errors_only {
        sequencer.play_errors()
    } else {
        sequencer.play_all()
    };

    match started {
        Err(StartError::NoErrors) => {
            println!("No errors found in this assessment.");
            return;
        }
        Err(StartError::NothingToPlay) => {
            println!("No word-level detail recorded for this assessment.");
            return;
        }
        Ok(()) => {
            if errors_only {
                println!("Stepping through {} errors:", sequencer.error_count());
            } else {
                println!("Stepping through {} words:", passage_words.len());
            }
        }
    }

    let mut timer = tokio::time::interval(Duration::from_millis(interval_ms.max(50)));
    while sequencer.mode() != PlaybackMode::Stopped {
        timer.tick().await;
        if let Some(index) = sequencer.tick() {
            highlight(passage_words, index);
        }
    }
    println!();
    println!("Playback complete.");
}

/// Manual-clock review: Enter advances an active run one step; the named
/// commands map onto the sequencer's transitions.
fn interactive_review(passage_words: &[Word]) -> anyhow::Result<()> {
    println!("Commands: play, errors, stop, next, back, quit. A blank line advances playback.");
    let mut sequencer = Sequencer::new(passage_words);
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => {
                if sequencer.mode() == PlaybackMode::Stopped {
                    println!("Stopped. Use play, errors, next or back.");
                } else if let Some(index) = sequencer.tick() {
                    highlight(passage_words, index);
                } else {
                    println!("Playback complete.");
                }
            }
            "play" => match sequencer.play_all() {
                Ok(()) => println!("Playing all {} words.", passage_words.len()),
                Err(_) => println!("No word-level detail recorded for this assessment."),
            },
            "errors" => match sequencer.play_errors() {
                Ok(()) => println!("Playing {} errors.", sequencer.error_count()),
                Err(StartError::NoErrors) => println!("No errors found in this assessment."),
                Err(StartError::NothingToPlay) => {
                    println!("No word-level detail recorded for this assessment.")
                }
            },
            "stop" => {
                sequencer.stop();
                println!("Stopped at word {}.", sequencer.current_index() + 1);
            }
            "next" => match sequencer.step_forward() {
                Some(index) => highlight(passage_words, index),
                None => println!("Stop playback before stepping."),
            },
            "back" => match sequencer.step_back() {
                Some(index) => highlight(passage_words, index),
                None => println!("Stop playback before stepping."),
            },
            "quit" | "q" => break,
            other => println!("Unknown command: {other}"),
        }
    }

    Ok(())
}

fn highlight(passage_words: &[Word], index: usize) {
    if let Some(word) = passage_words.get(index) {
        let answer = word.student_answer.as_deref().unwrap_or("--");
        println!(
            "[{:>3}] {:<16} {:<10} heard: {:<16} {:.2}s-{:.2}s",
            index + 1,
            word.text,
            word.outcome.as_str(),
            answer,
            word.start_seconds,
            word.end_seconds
        );
    }
}
