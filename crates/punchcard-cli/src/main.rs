//! `punchcard`: attendance reconciliation for biometric time clocks.
//!
//! # Usage
//!
//! ```
//! punchcard --config punchcard.toml fetch
//! punchcard run
//! punchcard regularize new --employee EMP1 --date 2025-01-05 --in 09:15 --out 18:10
//! ```

mod config;
mod import;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use clap::{Parser, Subcommand, ValueEnum};
use punchcard_core::{
  attendance::AttendanceStatus,
  checkin::DayPunches,
  regularization::{RegularizationRequest, TimeInput, WorkflowAction},
  store::{AttendanceStore, Directory},
  strategy::{FirstLastStrategy, PairedInOutStrategy, WorkingHoursStrategy},
};
use punchcard_engine::{
  Engine, buffer::JsonFileBuffer, http_device::HttpConnector, sync::Jobs,
};
use punchcard_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Schedule;

type AppEngine = Engine<SqliteStore, SqliteStore>;
type AppJobs = Jobs<SqliteStore, SqliteStore, JsonFileBuffer, HttpConnector>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "punchcard", version, about = "Biometric attendance reconciliation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "punchcard.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Poll every device once, then reconcile and submit.
  Fetch,
  /// Reconcile every active employee and submit what is due.
  Mark,
  /// Submit every open record whose window has passed.
  AutoSubmit,
  /// Remove punch buffers from previous days.
  Cleanup,
  /// Run all jobs on their schedule until interrupted.
  Run,
  /// Seed shifts, employees, holidays and leave from a JSON file.
  Import { file: PathBuf },
  /// Create and move regularization requests.
  #[command(subcommand)]
  Regularize(RegularizeCommand),
  /// Working hours for one employee-day under both strategies.
  Hours {
    #[arg(long)]
    employee: String,
    #[arg(long)]
    date:     NaiveDate,
  },
}

#[derive(Subcommand)]
enum RegularizeCommand {
  /// Create a draft request.
  New {
    #[arg(long)]
    employee: String,
    #[arg(long)]
    date:     NaiveDate,
    /// `HH:MM[:SS]`, seconds since midnight, or a full timestamp.
    #[arg(long = "in")]
    in_time:  String,
    #[arg(long = "out")]
    out_time: String,
    #[arg(long)]
    reason:   Option<String>,
    /// Status written on approval.
    #[arg(long, default_value = "Present")]
    status:   String,
  },
  /// Apply a workflow action.
  Act { id: Uuid, action: ActionArg },
  Show { id: Uuid },
  /// Whether a day may be regularized right now.
  Eligibility {
    #[arg(long)]
    employee: String,
    #[arg(long)]
    date:     NaiveDate,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
  SubmitToManager,
  ManagerApprove,
  ManagerReject,
  SubmitToHr,
  HrApprove,
  HrReject,
  Cancel,
}

impl From<ActionArg> for WorkflowAction {
  fn from(a: ActionArg) -> Self {
    match a {
      ActionArg::SubmitToManager => Self::SubmitToManager,
      ActionArg::ManagerApprove => Self::ManagerApprove,
      ActionArg::ManagerReject => Self::ManagerReject,
      ActionArg::SubmitToHr => Self::SubmitToHr,
      ActionArg::HrApprove => Self::HrApprove,
      ActionArg::HrReject => Self::HrReject,
      ActionArg::Cancel => Self::Cancel,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = config::load(&cli.config)?;

  let store_path = config::expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Engine::new(store.clone(), store.clone(), cfg.settings.clone());
  let buffer = JsonFileBuffer::new(config::expand_tilde(&cfg.buffer_dir));
  let connector = HttpConnector::new().context("failed to build HTTP client")?;
  let jobs = Jobs::new(engine, buffer, connector, cfg.devices.clone());

  match cli.command {
    Command::Fetch => print_json(&jobs.fetch_and_upload(now()).await)?,
    Command::Mark => print_json(&jobs.mark_attendance(now()).await?)?,
    Command::AutoSubmit => print_json(&jobs.auto_submit_due(now()).await?)?,
    Command::Cleanup => {
      let removed = jobs.cleanup_old_logs(now().date()).await?;
      println!("removed {removed} old punch buffer(s)");
    }
    Command::Run => run(&jobs, &cfg.schedule).await?,
    Command::Import { file } => {
      let seed = import::read_seed(&file)?;
      let n = import::apply(&store, &seed).await?;
      println!(
        "imported {} shift(s), {} employee(s), {} holiday(s), {} leave application(s)",
        n.shifts, n.employees, n.holidays, n.leaves
      );
    }
    Command::Regularize(cmd) => regularize(jobs.engine(), cmd).await?,
    Command::Hours { employee, date } => hours(jobs.engine(), &employee, date).await?,
  }

  Ok(())
}

fn now() -> NaiveDateTime { chrono::Local::now().naive_local() }

fn print_json(value: &impl Serialize) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

// ─── Scheduler ────────────────────────────────────────────────────────────────

async fn run(jobs: &AppJobs, schedule: &Schedule) -> Result<()> {
  let mut poll = time::interval(schedule.poll());
  let mut submit = time::interval(schedule.submit());
  let mut mark = time::interval(schedule.mark());
  let mut cleanup = time::interval(schedule.cleanup());
  for timer in [&mut poll, &mut submit, &mut mark, &mut cleanup] {
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
  }

  info!(devices = jobs.devices().len(), ?schedule, "scheduler started");
  loop {
    tokio::select! {
      _ = poll.tick() => {
        let report = jobs.fetch_and_upload(now()).await;
        info!(
          ok = report.success.len(),
          errors = report.errors.len(),
          "device poll finished"
        );
      }
      _ = submit.tick() => {
        if let Err(e) = jobs.auto_submit_due(now()).await {
          error!(error = %e, "auto-submit sweep failed");
        }
      }
      _ = mark.tick() => {
        if let Err(e) = jobs.mark_attendance(now()).await {
          error!(error = %e, "mark attendance failed");
        }
      }
      _ = cleanup.tick() => {
        if let Err(e) = jobs.cleanup_old_logs(now().date()).await {
          error!(error = %e, "buffer cleanup failed");
        }
      }
      signal = tokio::signal::ctrl_c() => {
        signal.context("failed to listen for ctrl-c")?;
        info!("shutting down");
        break;
      }
    }
  }
  Ok(())
}

// ─── Regularization ───────────────────────────────────────────────────────────

async fn regularize(engine: &AppEngine, cmd: RegularizeCommand) -> Result<()> {
  match cmd {
    RegularizeCommand::New {
      employee,
      date,
      in_time,
      out_time,
      reason,
      status,
    } => {
      let mut request = RegularizationRequest::new(
        employee,
        date,
        Some(TimeInput::parse(&in_time)?),
        Some(TimeInput::parse(&out_time)?),
      );
      request.reason = reason;
      request.attendance_status = status
        .parse::<AttendanceStatus>()
        .with_context(|| format!("unknown attendance status {status:?}"))?;
      print_json(&engine.create_request(request).await?)
    }
    RegularizeCommand::Act { id, action } => {
      print_json(&engine.transition_request(id, action.into()).await?)
    }
    RegularizeCommand::Show { id } => print_json(&engine.get_request(id).await?),
    RegularizeCommand::Eligibility { employee, date } => print_json(
      &engine
        .regularization_eligibility(&employee, date, now())
        .await?,
    ),
  }
}

// ─── Hours ────────────────────────────────────────────────────────────────────

fn fmt_minutes(d: Option<TimeDelta>) -> String {
  d.map_or_else(|| "-".to_owned(), |d| format!("{}m", d.num_minutes()))
}

async fn hours(engine: &AppEngine, employee_id: &str, date: NaiveDate) -> Result<()> {
  let events = engine.store().checkins_on(employee_id, date).await?;
  let day = DayPunches::new(date, events);

  println!("{employee_id} on {date}: {} punch(es)", day.len());
  let strategies: [&dyn WorkingHoursStrategy; 2] = [&FirstLastStrategy, &PairedInOutStrategy];
  for strategy in strategies {
    println!("  {:<12} {:.2} h", strategy.name(), strategy.working_hours(&day));
  }

  let Some(record) = engine.store().get_attendance(employee_id, date).await? else {
    return Ok(());
  };
  println!(
    "  record       {} ({:.2} h, {:?})",
    record.status, record.working_hours, record.doc_status
  );
  if let Some(name) = &record.shift
    && let Some(shift) = engine.directory().get_shift(name).await?
  {
    let p = shift.punctuality(&record);
    println!(
      "  shift {}: early entry {}, late entry {}, early going {}, late going {}, overtime {}",
      shift.name,
      fmt_minutes(p.early_entry),
      fmt_minutes(p.late_entry),
      fmt_minutes(p.early_going),
      fmt_minutes(p.late_going),
      fmt_minutes(p.overtime),
    );
  }
  Ok(())
}
