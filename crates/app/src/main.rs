//! Binary glue: loads configuration, opens local storage, runs the
//! initial progress sync for one course, and reports the derived unlock
//! state.

use std::collections::BTreeSet;
use std::fmt;

use campus_core::Clock;
use campus_core::model::{CourseId, VideoId};
use dotenv::dotenv;
use services::{AppServices, ProgressApi};
use tracing::info;

#[derive(Debug)]
enum ArgsError {
    MissingCourseId,
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCourseId => write!(f, "a course id is required"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    db_url: String,
    course_id: CourseId,
    videos: BTreeSet<VideoId>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- <course-id> [--db <sqlite_url>] [--videos <id,id,...>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:campus.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CAMPUS_DB_URL, CAMPUS_API_BASE_URL, CAMPUS_API_TOKEN");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CAMPUS_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://campus.sqlite3".into(), normalize_sqlite_url);
        let mut course_id = None;
        let mut videos = BTreeSet::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--videos" => {
                    let value = require_value(args, "--videos")?;
                    videos = value
                        .split(',')
                        .filter(|id| !id.trim().is_empty())
                        .map(|id| VideoId::new(id.trim()))
                        .collect();
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                value if !value.starts_with("--") && course_id.is_none() => {
                    course_id = Some(CourseId::new(value));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            course_id: course_id.ok_or(ArgsError::MissingCourseId)?,
            videos,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }
    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    format!("sqlite://{path_str}")
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;

    let api = ProgressApi::from_env();
    if !api.enabled() {
        info!("CAMPUS_API_TOKEN not set, running against the local cache only");
    }

    let services =
        AppServices::new_sqlite(&args.db_url, api, Clock::default_clock()).await?;

    let record = services
        .sync()
        .initial_load(&args.course_id, &args.videos)
        .await;
    let total = args.videos.len();
    let state = services.unlock().compute(&args.course_id, total).await;

    info!(
        course = %args.course_id,
        completed = record.completed_count(),
        total,
        overall = record.overall_percent(total),
        "progress resolved"
    );
    info!(
        quiz_unlocked = state.quiz_unlocked,
        certificate_unlocked = state.certificate_unlocked,
        "unlock state"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
