use caseflow_core::*;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "caseflow")]
#[command(about = "Workplace injury case management engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a worker exception (injury, leave, transfer, ...)
    Report {
        /// Worker identifier (employee code)
        #[arg(long)]
        worker: String,

        /// Exception kind (injury, medical_leave, accident, transfer, other)
        #[arg(long)]
        kind: String,

        /// First affected day (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last affected day; open-ended when omitted
        #[arg(long)]
        end: Option<String>,

        /// Free-text reason
        #[arg(long)]
        reason: Option<String>,
    },

    /// Manually deactivate an exception
    Deactivate {
        exception_id: String,
    },

    /// Escalate an exception into a tracked case
    Escalate {
        exception_id: String,

        /// Acting team leader or clinician
        #[arg(long)]
        actor: String,
    },

    /// Apply a case status transition
    Status {
        case_id: String,

        /// Requested status (new, triaged, assessed, in_rehab, return_to_work, closed)
        status: String,

        /// Acting clinician or administrator
        #[arg(long)]
        actor: String,

        /// Duty type for return_to_work (modified, full)
        #[arg(long)]
        duty_type: Option<String>,

        /// Return date for return_to_work (YYYY-MM-DD)
        #[arg(long)]
        return_date: Option<String>,
    },

    /// Manage rehabilitation plans
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Check a proposed schedule range against a worker's exceptions
    Check {
        #[arg(long)]
        worker: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },

    /// Roll up transition WAL events to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Create a rehabilitation plan for a case
    New {
        case_id: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// Comma-separated exercise ids from the catalog
        #[arg(long)]
        exercises: String,
    },

    /// Mark an exercise completed on a plan day
    Done {
        plan_id: String,

        #[arg(long)]
        exercise: String,

        /// Completion day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Render the daily progress grid for a plan
    Show {
        plan_id: String,
    },

    /// Cancel an active plan
    Cancel {
        plan_id: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    caseflow_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Report {
            worker,
            kind,
            start,
            end,
            reason,
        } => cmd_report(&data_dir, worker, &kind, &start, end.as_deref(), reason),
        Commands::Deactivate { exception_id } => cmd_deactivate(&data_dir, &exception_id),
        Commands::Escalate { exception_id, actor } => {
            cmd_escalate(&data_dir, &exception_id, &actor)
        }
        Commands::Status {
            case_id,
            status,
            actor,
            duty_type,
            return_date,
        } => cmd_status(
            &data_dir,
            &case_id,
            &status,
            &actor,
            duty_type.as_deref(),
            return_date.as_deref(),
        ),
        Commands::Plan(plan_command) => match plan_command {
            PlanCommands::New {
                case_id,
                start,
                end,
                exercises,
            } => cmd_plan_new(&data_dir, &case_id, &start, &end, &exercises),
            PlanCommands::Done {
                plan_id,
                exercise,
                date,
            } => cmd_plan_done(&data_dir, &plan_id, &exercise, date.as_deref()),
            PlanCommands::Show { plan_id } => cmd_plan_show(&data_dir, &plan_id, &config),
            PlanCommands::Cancel { plan_id } => cmd_plan_cancel(&data_dir, &plan_id),
        },
        Commands::Check { worker, start, end } => cmd_check(&data_dir, &worker, &start, &end),
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup),
    }
}

fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("store.json")
}

fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("wal").join("transitions.wal")
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).map_err(|e| Error::Other(format!("Invalid id '{}': {}", s, e)))
}

fn parse_kind(s: &str) -> Result<ExceptionType> {
    match s.trim().to_lowercase().as_str() {
        "injury" => Ok(ExceptionType::Injury),
        "medical_leave" => Ok(ExceptionType::MedicalLeave),
        "accident" => Ok(ExceptionType::Accident),
        "transfer" => Ok(ExceptionType::Transfer),
        "other" => Ok(ExceptionType::Other),
        other => Err(Error::Other(format!("Unknown exception kind: {}", other))),
    }
}

fn cmd_report(
    data_dir: &Path,
    worker: String,
    kind: &str,
    start: &str,
    end: Option<&str>,
    reason: Option<String>,
) -> Result<()> {
    let exception_type = parse_kind(kind)?;
    let start_date = calendar::parse_day(start)?;
    let end_date = end.map(calendar::parse_day).transpose()?;
    if let Some(end_date) = end_date {
        if end_date < start_date {
            return Err(Error::InvalidDateRange);
        }
    }

    let exception = Exception {
        id: Uuid::new_v4(),
        worker_id: worker,
        exception_type,
        start_date,
        end_date,
        is_active: true,
        deactivated_at: None,
        reason,
    };
    let exception_id = exception.id;

    let store = CaseStore::update(&store_path(data_dir), |store| {
        // Surface (but do not block on) overlap with an existing exception
        let existing = store.worker_exceptions(&exception.worker_id);
        let probe_end = exception
            .end_date
            .unwrap_or_else(|| calendar::add_days(exception.start_date, 365));
        if let Some(conflict) = find_conflict(&existing, exception.start_date, probe_end) {
            println!(
                "Warning: overlaps existing exception {} ({} from {})",
                conflict.id,
                format_kind(conflict.exception_type),
                calendar::format_day(conflict.start_date)
            );
        }
        store.exceptions.insert(exception.id, exception.clone());
        Ok(())
    })?;

    println!("Recorded exception {}", exception_id);
    println!("  {} exceptions on file", store.exceptions.len());
    Ok(())
}

fn cmd_deactivate(data_dir: &Path, exception_id: &str) -> Result<()> {
    let id = parse_uuid(exception_id)?;
    let now = Utc::now();

    CaseStore::update(&store_path(data_dir), |store| {
        let exception = store
            .exceptions
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("No exception {}", id)))?;
        exception.is_active = false;
        exception.deactivated_at = Some(now);
        Ok(())
    })?;

    println!("Deactivated exception {}", id);
    Ok(())
}

fn cmd_escalate(data_dir: &Path, exception_id: &str, actor: &str) -> Result<()> {
    let id = parse_uuid(exception_id)?;
    let now = Utc::now();

    let mut case_number = String::new();
    let mut case_id = Uuid::nil();
    CaseStore::update(&store_path(data_dir), |store| {
        let exception = store
            .exceptions
            .get(&id)
            .ok_or_else(|| Error::Store(format!("No exception {}", id)))?
            .clone();
        let case = Case::escalate(exception, actor, now);
        case_number = case.number();
        case_id = case.id;

        let mut sink = JsonlSink::new(wal_path(data_dir));
        sink.append(&wal::TransitionEvent {
            case_id: case.id,
            case_number: case_number.clone(),
            worker_id: case.exception.worker_id.clone(),
            status: CaseStatus::New,
            updated_at: now,
            updated_by: actor.to_string(),
        })?;

        store.cases.insert(case.id, case);
        Ok(())
    })?;

    println!("Escalated to case {}", case_id);
    println!("  Case number: {}", case_number);
    Ok(())
}

fn cmd_status(
    data_dir: &Path,
    case_id: &str,
    status: &str,
    actor: &str,
    duty_type: Option<&str>,
    return_date: Option<&str>,
) -> Result<()> {
    let id = parse_uuid(case_id)?;
    let requested: CaseStatus = status.parse()?;
    let request = match (duty_type, return_date) {
        (Some(duty), Some(date)) => TransitionRequest::ReturnToWork {
            duty_type: duty.parse()?,
            return_date: calendar::parse_day(date)?,
        },
        (None, None) => TransitionRequest::Standard,
        _ => return Err(Error::MissingReturnToWorkFields),
    };

    let roster = load_team_roster(&data_dir.join("roster.json"))?;
    let now = Utc::now();

    let mut intents = Vec::new();
    let mut case_number = String::new();
    CaseStore::update(&store_path(data_dir), |store| {
        let case = store
            .cases
            .get(&id)
            .ok_or_else(|| Error::Store(format!("No case {}", id)))?;
        let plans = store.plans_for_case(id);

        let outcome = apply_transition(case, requested, actor, &request, &plans, &roster, now)?;
        case_number = outcome.case.number();
        intents = outcome.intents;

        let mut sink = JsonlSink::new(wal_path(data_dir));
        sink.append(&wal::TransitionEvent {
            case_id: id,
            case_number: case_number.clone(),
            worker_id: outcome.case.exception.worker_id.clone(),
            status: requested,
            updated_at: now,
            updated_by: actor.to_string(),
        })?;

        // Keep the standalone exception record in step with the case copy
        store
            .exceptions
            .insert(outcome.case.exception.id, outcome.case.exception.clone());
        store.cases.insert(id, outcome.case);
        Ok(())
    })?;

    println!("{} is now {}", case_number, requested);
    for intent in &intents {
        println!("  notify {}", describe_recipient(&intent.recipient));
    }
    Ok(())
}

fn cmd_plan_new(
    data_dir: &Path,
    case_id: &str,
    start: &str,
    end: &str,
    exercises: &str,
) -> Result<()> {
    let id = parse_uuid(case_id)?;
    let start_date = calendar::parse_day(start)?;
    let end_date = calendar::parse_day(end)?;

    let catalog = caseflow_core::catalog::get_default_catalog();
    let mut list = Vec::new();
    for (index, exercise_id) in exercises.split(',').map(str::trim).enumerate() {
        if catalog.get(exercise_id).is_none() {
            return Err(Error::Other(format!(
                "Unknown exercise '{}' (not in catalog)",
                exercise_id
            )));
        }
        list.push(Exercise {
            id: exercise_id.to_string(),
            order: (index + 1) as u32,
        });
    }
    if list.is_empty() {
        return Err(Error::Other("Plan needs at least one exercise".into()));
    }

    let mut plan_id = Uuid::nil();
    CaseStore::update(&store_path(data_dir), |store| {
        if !store.cases.contains_key(&id) {
            return Err(Error::Store(format!("No case {}", id)));
        }
        if store.has_active_plan(id) {
            return Err(Error::Store(format!("Case {} already has an active plan", id)));
        }
        let plan = RehabilitationPlan::new(id, start_date, end_date, list.clone())?;
        plan_id = plan.id;
        store.plans.insert(plan.id, plan);
        Ok(())
    })?;

    println!("Created plan {}", plan_id);
    println!(
        "  {} days, {} exercises per day",
        calendar::days_between(start_date, end_date) + 1,
        list.len()
    );
    Ok(())
}

fn cmd_plan_done(
    data_dir: &Path,
    plan_id: &str,
    exercise: &str,
    date: Option<&str>,
) -> Result<()> {
    let id = parse_uuid(plan_id)?;
    let date = match date {
        Some(s) => calendar::parse_day(s)?,
        None => calendar::normalize_to_day(Utc::now()),
    };

    CaseStore::update(&store_path(data_dir), |store| {
        let plan = store
            .plans
            .get(&id)
            .ok_or_else(|| Error::Store(format!("No plan {}", id)))?;
        if !plan.exercises.iter().any(|e| e.id == exercise) {
            return Err(Error::Other(format!(
                "Exercise '{}' is not part of plan {}",
                exercise, id
            )));
        }
        if date < plan.start_date || date > plan.end_date {
            println!(
                "Warning: {} is outside the plan range {}..{}",
                calendar::format_day(date),
                calendar::format_day(plan.start_date),
                calendar::format_day(plan.end_date)
            );
        }
        store.add_completion(Completion {
            plan_id: id,
            exercise_id: exercise.to_string(),
            date,
        });
        Ok(())
    })?;

    println!(
        "Marked {} done on {}",
        exercise,
        calendar::format_day(date)
    );
    Ok(())
}

fn cmd_plan_show(data_dir: &Path, plan_id: &str, config: &Config) -> Result<()> {
    let id = parse_uuid(plan_id)?;
    let store = CaseStore::load(&store_path(data_dir))?;
    let plan = store
        .plans
        .get(&id)
        .ok_or_else(|| Error::Store(format!("No plan {}", id)))?;

    let completions = build_completion_map(&store.completions, id);
    let progress = compute_progress(plan, &completions, Utc::now(), config.rehab.rollover_hour);

    println!(
        "Plan {} ({}..{})",
        id,
        calendar::format_day(plan.start_date),
        calendar::format_day(plan.end_date)
    );
    println!();
    println!("  Day  Date        Status     Done");
    for day in &progress.days {
        let status = match day.status {
            progression::DayStatus::Completed => "completed",
            progression::DayStatus::Current => "current",
            progression::DayStatus::Pending => "pending",
        };
        println!(
            "  {:>3}  {}  {:<9}  {}/{}",
            day.day_number,
            calendar::format_day(day.date),
            status,
            day.completed_count,
            plan.exercises.len()
        );
    }
    println!();
    println!(
        "  Current day: {} of {} | Days completed: {} | Progress: {}%",
        progress.current_day,
        plan.total_days(),
        progress.days_completed,
        progress.progress_percent
    );
    Ok(())
}

fn cmd_plan_cancel(data_dir: &Path, plan_id: &str) -> Result<()> {
    let id = parse_uuid(plan_id)?;

    CaseStore::update(&store_path(data_dir), |store| {
        let plan = store
            .plans
            .get_mut(&id)
            .ok_or_else(|| Error::Store(format!("No plan {}", id)))?;
        plan.status = PlanStatus::Cancelled;
        Ok(())
    })?;

    println!("Cancelled plan {}", id);
    Ok(())
}

fn cmd_check(data_dir: &Path, worker: &str, start: &str, end: &str) -> Result<()> {
    let start_date = calendar::parse_day(start)?;
    let end_date = calendar::parse_day(end)?;
    if end_date < start_date {
        return Err(Error::InvalidDateRange);
    }

    let store = CaseStore::load(&store_path(data_dir))?;
    let exceptions = store.worker_exceptions(worker);

    match find_conflict(&exceptions, start_date, end_date) {
        Some(conflict) => {
            println!(
                "Conflict: exception {} ({}) active in {}..{}",
                conflict.id,
                format_kind(conflict.exception_type),
                calendar::format_day(start_date),
                calendar::format_day(end_date)
            );
        }
        None => {
            println!(
                "No conflict for {} in {}..{}",
                worker,
                calendar::format_day(start_date),
                calendar::format_day(end_date)
            );
        }
    }
    Ok(())
}

fn cmd_rollup(data_dir: &Path, cleanup: bool) -> Result<()> {
    let wal_dir = data_dir.join("wal");
    let wal_path = wal_path(data_dir);
    let csv_path = data_dir.join("transitions.csv");

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = caseflow_core::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("Rolled up {} transition events to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = caseflow_core::csv_rollup::cleanup_processed_wals(&wal_dir)?;
        if cleaned > 0 {
            println!("Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn format_kind(kind: ExceptionType) -> &'static str {
    match kind {
        ExceptionType::Injury => "injury",
        ExceptionType::MedicalLeave => "medical_leave",
        ExceptionType::Accident => "accident",
        ExceptionType::Transfer => "transfer",
        ExceptionType::Other => "other",
    }
}

fn describe_recipient(recipient: &Recipient) -> String {
    match recipient {
        Recipient::Administrator { user } => format!("administrator {}", user),
        Recipient::Supervisor { user } => format!("supervisor {}", user),
        Recipient::TeamLeader { user } => format!("team leader {}", user),
        Recipient::Worker { worker_id } => format!("worker {}", worker_id),
    }
}
