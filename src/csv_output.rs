//! CSV output format for concurrency reports
//!
//! Two tables, selected with `--csv-table`: one row per high-concurrency
//! interval, or one row per concurrency level.

use crate::concurrency::ConcurrencyReport;
use clap::ValueEnum;

/// Which table to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CsvTable {
    /// One row per high-concurrency interval
    #[default]
    Intervals,
    /// One row per concurrency level
    Levels,
}

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput {
    table: CsvTable,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(table: CsvTable) -> Self {
        Self { table }
    }

    /// Generate CSV header row for the selected table
    fn header(&self) -> &'static str {
        match self.table {
            CsvTable::Intervals => "start,end,duration_ms,peak,closed_by",
            CsvTable::Levels => "level,groups,percentage,time_ms,time_percentage",
        }
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Render the complete CSV document
    pub fn render(&self, report: &ConcurrencyReport) -> String {
        let mut output = String::new();
        output.push_str(self.header());
        output.push('\n');

        match self.table {
            CsvTable::Intervals => {
                for interval in &report.high_concurrency_intervals {
                    let fields = [
                        Self::escape_field(&interval.start.to_rfc3339()),
                        Self::escape_field(&interval.end.to_rfc3339()),
                        interval.duration().num_milliseconds().to_string(),
                        interval.peak.to_string(),
                        interval.closed_by.as_str().to_string(),
                    ];
                    output.push_str(&fields.join(","));
                    output.push('\n');
                }
            }
            CsvTable::Levels => {
                for share in report.level_shares() {
                    output.push_str(&format!(
                        "{},{},{:.2},{},{:.2}\n",
                        share.level,
                        share.groups,
                        share.percentage,
                        share.time_ms,
                        share.time_percentage
                    ));
                }
            }
        }

        output
    }
}
