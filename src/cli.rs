//! CLI argument parsing for queuestat

use crate::config::AnalysisConfig;
use crate::csv_output::CsvTable;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "queuestat")]
#[command(version)]
#[command(
    about = "Concurrency analysis of CI background-task queues",
    long_about = None
)]
pub struct Cli {
    /// Page files or directories of page files (tasks_page_N.json)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Concurrency level at or above which a window is reported (default: 4)
    #[arg(short = 't', long = "threshold", value_name = "N")]
    pub threshold: Option<usize>,

    /// Filter tasks (e.g., -e type=REPORT, -e status=finished, -e project~^acme-)
    #[arg(short = 'e', long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Table emitted by --format csv
    #[arg(long = "csv-table", value_enum, default_value = "intervals")]
    pub csv_table: CsvTable,

    /// Rows shown per categorical breakdown (default: 10)
    #[arg(long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// Include the per-group timeline in JSON output
    #[arg(long = "timeline")]
    pub timeline: bool,

    /// Read defaults from a TOML file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Layer the command-line flags over `base`
    ///
    /// Filters from the command line are appended to those of the file.
    pub fn apply_to(&self, mut base: AnalysisConfig) -> AnalysisConfig {
        if let Some(threshold) = self.threshold {
            base.threshold = threshold;
        }
        if let Some(top) = self.top {
            base.top = top;
        }
        if self.timeline {
            base.include_timeline = true;
        }
        base.filters.extend(self.filters.iter().cloned());
        base
    }
}
