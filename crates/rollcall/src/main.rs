//! `rollcall` - CLI for classroom attendance tracking
//!
//! This binary provides the command-line interface for watching, showing,
//! and editing a section's attendance against the remote store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use tokio::sync::mpsc;

use rollcall::board::{AttendanceBoard, BoardSnapshot, ToggleOutcome};
use rollcall::calendar::{month_columns, parse_iso_date};
use rollcall::cli::{Cli, Command, ConfigCommand, LogsCommand, OutputFormat, ShowCommand, ToggleCommand, WatchCommand};
use rollcall::record::resolve_teacher;
use rollcall::remote::{RemoteStore, RestStore};
use rollcall::{init_logging, Config, PollHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Show(cmd) => handle_show(&config, &cmd).await,
        Command::Toggle(cmd) => handle_toggle(&config, &cmd).await,
        Command::Logs(cmd) => handle_logs(&config, &cmd).await,
        Command::Months(cmd) => {
            handle_months(cmd.year.unwrap_or_else(|| Utc::now().year()));
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Resolve an optional ISO date argument, defaulting to today (UTC).
fn resolve_date(arg: Option<&str>) -> anyhow::Result<NaiveDate> {
    match arg {
        Some(raw) => Ok(parse_iso_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Resolve the poll interval, applying the CLI override when present.
///
/// The override is held to the same rule as `refresh.poll_interval_ms`:
/// it must be non-zero.
fn resolve_interval(config: &Config, override_ms: Option<u64>) -> anyhow::Result<Duration> {
    match override_ms {
        Some(0) => anyhow::bail!("--interval-ms must be greater than 0"),
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Ok(config.poll_interval()),
    }
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let date = resolve_date(cmd.date.as_deref())?;
    let interval = resolve_interval(config, cmd.interval_ms)?;

    let store: Arc<dyn RemoteStore> = Arc::new(RestStore::new(&config.backend)?);
    let handle = PollHandle::new();
    let (tx, mut rx) = mpsc::channel(8);

    let task = rollcall::spawn_refresh_loop(
        store,
        config.roster.subjects.clone(),
        config.refresh.toggle_policy,
        date,
        interval,
        handle.clone(),
        tx,
    );

    println!("Watching {} attendance for {date} (Ctrl-C to stop)", config.roster.section);
    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                match snapshot {
                    Some(snapshot) => print_board(&snapshot, OutputFormat::Table),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
                break;
            }
        }
    }
    drop(rx);
    task.await.context("refresh loop panicked")?;
    Ok(())
}

async fn handle_show(config: &Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    let date = resolve_date(cmd.date.as_deref())?;
    let store = RestStore::new(&config.backend)?;
    let mut board = AttendanceBoard::new(
        config.roster.subjects.clone(),
        config.refresh.toggle_policy,
        date,
    );

    anyhow::ensure!(board.refresh(&store).await, "attendance fetch failed for {date}");
    print_board(&board.snapshot(), cmd.format);
    Ok(())
}

async fn handle_toggle(config: &Config, cmd: &ToggleCommand) -> anyhow::Result<()> {
    let date = resolve_date(cmd.date.as_deref())?;
    anyhow::ensure!(
        config.roster.subjects.contains(&cmd.subject),
        "unknown subject: {} (configured: {})",
        cmd.subject,
        config.roster.subjects.join(", ")
    );

    let store = RestStore::new(&config.backend)?;
    let mut board = AttendanceBoard::new(
        config.roster.subjects.clone(),
        config.refresh.toggle_policy,
        date,
    );
    board.refresh(&store).await;

    match board.toggle(&store, &cmd.lrn, &cmd.subject).await {
        ToggleOutcome::Applied(status) => {
            println!("{} is now {status} for {} on {date}", cmd.lrn, cmd.subject);
        }
        ToggleOutcome::RolledBack => {
            println!("Write failed; {}/{} left unchanged", cmd.lrn, cmd.subject);
        }
        ToggleOutcome::NoOp => {
            println!("{}/{} already absent; nothing to do", cmd.lrn, cmd.subject);
        }
    }
    Ok(())
}

async fn handle_logs(config: &Config, cmd: &LogsCommand) -> anyhow::Result<()> {
    let store = RestStore::new(&config.backend)?;
    let logs = store.fetch_logs(cmd.limit).await?;
    let teachers = store.fetch_teachers().await.unwrap_or_default();

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    if logs.is_empty() {
        println!("No activity logs.");
        return Ok(());
    }

    println!(
        "{:<20} {:<18} {:<14} {:<16} {:<20} {}",
        "ACTIVITY", "TEACHER", "STUDENT", "REASON", "COMMENT", "DATE/TIME"
    );
    for entry in &logs {
        println!(
            "{:<20} {:<18} {:<14} {:<16} {:<20} {}",
            entry.activity,
            resolve_teacher(entry.teacher, &teachers),
            entry.student,
            entry.reason,
            entry.comment,
            entry.datetime.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}

fn handle_months(year: i32) {
    let (left, right) = month_columns();
    println!("Months of {year} (month parameter in brackets)");
    for (l, r) in left.iter().zip(right.iter()) {
        println!("  {:<14} [{}]    {:<14} [{}]", l.0, l.1, r.0, r.1);
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Backend]");
                println!("  Base URL:       {}", config.backend.base_url);
                println!("  Schema:         {}", config.backend.schema);
                println!("  Timeout (s):    {}", config.backend.timeout_secs);
                println!();
                println!("[Roster]");
                println!("  Section:        {}", config.roster.section);
                println!("  Subjects:       {}", config.roster.subjects.join(", "));
                println!();
                println!("[Refresh]");
                println!("  Interval (ms):  {}", config.refresh.poll_interval_ms);
                println!("  Toggle policy:  {:?}", config.refresh.toggle_policy);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_board(snapshot: &BoardSnapshot, format: OutputFormat) {
    if format == OutputFormat::Json {
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to render board: {e}"),
        }
        return;
    }

    println!();
    println!("Attendance for {} (refresh #{})", snapshot.date, snapshot.generation);
    if snapshot.rows.is_empty() {
        println!("No attendance records available.");
        return;
    }

    let subjects: Vec<&str> = snapshot.rows[0]
        .statuses
        .iter()
        .map(|(subject, _)| subject.as_str())
        .collect();
    print!("{:<14} {:<24}", "LRN", "NAME");
    for subject in &subjects {
        print!(" {subject:<9}");
    }
    println!();

    for row in &snapshot.rows {
        print!("{:<14} {:<24}", row.lrn, row.name);
        for (_, status) in &row.statuses {
            print!(" {:<9}", status.to_string());
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_date_parses_iso() {
        let date = resolve_date(Some("2024-05-01")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(resolve_date(Some("garbage")).is_err());
    }

    #[test]
    fn test_resolve_interval_defaults_to_config() {
        let config = Config::default();
        let interval = resolve_interval(&config, None).unwrap();
        assert_eq!(interval, config.poll_interval());
    }

    #[test]
    fn test_resolve_interval_applies_override() {
        let config = Config::default();
        let interval = resolve_interval(&config, Some(500)).unwrap();
        assert_eq!(interval, Duration::from_millis(500));
    }

    #[test]
    fn test_resolve_interval_rejects_zero() {
        let config = Config::default();
        let result = resolve_interval(&config, Some(0));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("interval-ms"));
    }
}
