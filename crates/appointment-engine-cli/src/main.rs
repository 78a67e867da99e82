use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use appointment_engine::{
    check_submission, end_slots, start_slots, upcoming, Appointment, AppointmentId,
    ConflictChecker, EngineConfig, InMemoryRepository, Instant, Interval, IntervalPolicy,
    Rejection, Submission, ValidationResult, WallClock,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apptcheck")]
#[command(about = "Check appointment times against business hours and existing bookings", long_about = None)]
struct Cli {
    /// JSON file with engine settings (zones, hours, lengths)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IANA zone defining business hours (overrides APPT_BUSINESS_TZ)
    #[arg(long, global = true)]
    business_tz: Option<String>,

    /// IANA zone wall-clock input is read in (overrides APPT_OPERATOR_TZ / TZ)
    #[arg(long, global = true)]
    operator_tz: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an operator wall-clock interval; exits 1 when it is rejected
    Check {
        /// Start, as YYYY-MM-DDTHH:MM in the operator zone
        #[arg(long)]
        start: String,

        /// End, as YYYY-MM-DDTHH:MM in the operator zone
        #[arg(long)]
        end: String,

        /// Id of the appointment being edited, ignored when looking for overlaps
        #[arg(long)]
        exclude: Option<AppointmentId>,

        /// JSON array of stored appointments, or '-' for stdin
        #[arg(long)]
        store: Option<String>,

        /// Current time as RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
    },

    /// List the time choices for a business day, in the operator zone
    Slots {
        /// Business day as YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// List end-time choices instead of start-time choices
        #[arg(long)]
        ends: bool,
    },

    /// List stored appointments starting close to now
    Upcoming {
        /// JSON array of stored appointments, or '-' for stdin
        #[arg(long)]
        store: Option<String>,

        /// Current time as RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let policy = IntervalPolicy::from_config(&config).context("failed to build policy")?;
    debug!(
        business = %policy.normalizer().business_zone(),
        operator = %policy.normalizer().operator_zone(),
        "zones resolved"
    );

    match cli.command {
        Command::Check {
            start,
            end,
            exclude,
            store,
            now,
        } => {
            let start = WallClock::parse(&start).context("invalid --start")?;
            let end = WallClock::parse(&end).context("invalid --end")?;
            let now = parse_now(now.as_deref())?;
            let repository = load_store(store.as_deref())?;
            let checker = ConflictChecker::new(repository);

            let verdict = check(&policy, &checker, start, end, exclude, now)?;
            let accepted = verdict.is_accepted();
            print_json(&verdict_json(&verdict))?;
            Ok(if accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Slots { date, ends } => {
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                .with_context(|| format!("invalid --date '{date}'"))?;
            let step = Duration::minutes(config.slot_minutes);
            let slots = if ends {
                end_slots(&policy, date, step)
            } else {
                start_slots(&policy, date, step)
            };
            let slots: Vec<String> = slots.iter().map(WallClock::to_string).collect();
            print_json(&json!(slots))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Upcoming { store, now } => {
            let now = parse_now(now.as_deref())?;
            let repository = load_store(store.as_deref())?;
            let window = Duration::minutes(config.upcoming_window_minutes);
            let normalizer = policy.normalizer();

            let found: Vec<Value> = upcoming(repository.iter(), now, window)
                .into_iter()
                .map(|appt| {
                    json!({
                        "id": appt.id,
                        "title": appt.title,
                        "start": normalizer.operator_wall(appt.interval.start()).to_string(),
                        "end": normalizer.operator_wall(appt.interval.end()).to_string(),
                    })
                })
                .collect();
            print_json(&json!(found))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Settings from `--config` or the environment, with zone flags applied last.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => EngineConfig::from_env().context("invalid zone in environment")?,
    };
    if let Some(zone) = &cli.business_tz {
        config.business_zone = zone.trim().to_string();
    }
    if let Some(zone) = &cli.operator_tz {
        config.operator_zone = zone.trim().to_string();
    }
    config.validate().context("invalid zone flag")?;
    Ok(config)
}

fn parse_now(now: Option<&str>) -> Result<Instant> {
    match now {
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid --now '{s}', expected RFC 3339")),
        None => Ok(Utc::now()),
    }
}

fn load_store(source: Option<&str>) -> Result<InMemoryRepository> {
    let json = match source {
        None => return Ok(InMemoryRepository::new()),
        Some("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read store from stdin")?;
            buf
        }
        Some(path) => fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read store {path}"))?,
    };
    let appointments: Vec<Appointment> =
        serde_json::from_str(&json).context("store is not a JSON array of appointments")?;
    debug!(count = appointments.len(), "store loaded");
    InMemoryRepository::from_appointments(appointments).context("invalid store")
}

fn check(
    policy: &IntervalPolicy,
    checker: &ConflictChecker<InMemoryRepository>,
    start: WallClock,
    end: WallClock,
    exclude: Option<AppointmentId>,
    now: Instant,
) -> Result<Submission> {
    let normalizer = policy.normalizer();
    let Ok(candidate) = Interval::new(
        normalizer.operator_instant(start),
        normalizer.operator_instant(end),
    ) else {
        return Ok(Submission::Rejected(Rejection::EmptyInterval));
    };
    check_submission(policy, checker, candidate, exclude, now).context("conflict check failed")
}

fn verdict_json(verdict: &Submission) -> Value {
    match verdict {
        Submission::Accepted(interval) => json!({
            "status": "accepted",
            "start": interval.start().to_rfc3339(),
            "end": interval.end().to_rfc3339(),
        }),
        Submission::Rejected(rejection) => {
            let mut body = json!({
                "status": "rejected",
                "reason": reason_code(rejection),
                "message": rejection.to_string(),
            });
            if let Rejection::Conflict(existing) = rejection {
                body["conflict"] = json!({
                    "id": existing.id,
                    "title": existing.label,
                    "start": existing.interval.start().to_rfc3339(),
                    "end": existing.interval.end().to_rfc3339(),
                });
            }
            body
        }
    }
}

fn reason_code(rejection: &Rejection) -> &'static str {
    match rejection {
        Rejection::MissingFields(_) => "missing_fields",
        Rejection::EmptyInterval => "empty_interval",
        Rejection::Conflict(_) => "conflict",
        Rejection::Policy(ValidationResult::OutsideBusinessHours) => "outside_business_hours",
        Rejection::Policy(ValidationResult::NotInFuture) => "not_in_future",
        Rejection::Policy(ValidationResult::DurationExceeded) => "duration_exceeded",
        Rejection::Policy(ValidationResult::Ok) => "ok",
    }
}

fn print_json(value: &Value) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
