//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Day to watch, as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Override the configured poll interval in milliseconds
    #[arg(short, long)]
    pub interval_ms: Option<u64>,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Day to show, as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Toggle command arguments.
#[derive(Debug, Args)]
pub struct ToggleCommand {
    /// Student key (LRN)
    pub lrn: String,

    /// Subject code from the configured subject list
    pub subject: String,

    /// Day to edit, as YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,
}

/// Logs command arguments.
#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Maximum number of entries
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Months command arguments.
#[derive(Debug, Args)]
pub struct MonthsCommand {
    /// Year shown alongside the month grid
    #[arg(short, long)]
    pub year: Option<i32>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_watch_command_debug() {
        let cmd = WatchCommand {
            date: Some("2024-05-01".to_string()),
            interval_ms: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("2024-05-01"));
    }

    #[test]
    fn test_toggle_command_debug() {
        let cmd = ToggleCommand {
            lrn: "A1".to_string(),
            subject: "PE".to_string(),
            date: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("A1"));
        assert!(debug_str.contains("PE"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_output_format_clone() {
        let format = OutputFormat::Json;
        let cloned = format;
        assert_eq!(format, cloned);
    }
}
