//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure and command handlers for the
//! `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, LogsCommand, MonthsCommand, OutputFormat, ShowCommand, ToggleCommand,
    WatchCommand,
};

/// rollcall - classroom attendance against a hosted backend
///
/// Tracks per-subject attendance for one section. All data lives in the
/// remote store; rollcall keeps an optimistic local view reconciled by a
/// polling refresh loop.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a day's attendance, refreshing continuously
    Watch(WatchCommand),

    /// Show a day's attendance once
    Show(ShowCommand),

    /// Toggle a student's status for a subject
    Toggle(ToggleCommand),

    /// Show activity logs, newest first
    Logs(LogsCommand),

    /// Show the month grid with navigation parameters
    Months(MonthsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
