//! JSON output format for analysis reports
//!
//! `--format json` emits a single `queuestat-json-v1` document.

use crate::analysis::AnalysisReport;
use crate::concurrency::ConcurrencyReport;
use crate::summary::{CategoryCount, DurationStats, TaskSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task counts by fate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTaskCounts {
    /// Tasks after filtering
    pub total: usize,
    /// Tasks that contributed events
    pub analyzed: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub filtered_out: usize,
    pub duplicates: usize,
}

/// One concurrency level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLevel {
    pub level: usize,
    /// Event groups evaluated at this level
    pub groups: u64,
    pub percentage: f64,
    pub time_ms: u64,
    pub time_percentage: f64,
}

/// One high-concurrency window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: i64,
    pub peak: usize,
    /// "threshold" or "end_of_data"
    pub closed_by: String,
}

/// Level in effect from `at` until the next entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSnapshot {
    pub at: DateTime<Utc>,
    pub level: usize,
}

/// Sweep results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonConcurrency {
    pub threshold: usize,
    pub event_count: usize,
    pub event_groups: usize,
    pub max_concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency_at: Option<DateTime<Utc>>,
    pub levels: Vec<JsonLevel>,
    pub high_concurrency_intervals: Vec<JsonInterval>,
    pub high_concurrency_ms: i64,
    /// Present only with `--timeline`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<JsonSnapshot>>,
}

/// Row of a categorical breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCategory {
    pub key: String,
    pub count: u64,
    pub percentage: f64,
}

/// Duration distribution in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDurationStats {
    pub count: usize,
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

/// Categorical summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub by_type: Vec<JsonCategory>,
    pub by_status: Vec<JsonCategory>,
    pub by_submitter: Vec<JsonCategory>,
    pub by_branch_type: Vec<JsonCategory>,
    pub by_warning_count: Vec<JsonCategory>,
    pub by_project: Vec<JsonCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<JsonDurationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_wait_ms: Option<JsonDurationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_submitted: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ended: Option<DateTime<Utc>>,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// Crate version that produced the document
    pub version: String,
    /// Format name
    pub format: String,
    pub tasks: JsonTaskCounts,
    pub concurrency: JsonConcurrency,
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Build the document from an analysis report
    pub fn from_report(report: &AnalysisReport, include_timeline: bool) -> Self {
        let ex = &report.exclusions;
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "queuestat-json-v1".to_string(),
            tasks: JsonTaskCounts {
                total: report.summary.total_tasks,
                analyzed: report.concurrency.eligible_tasks,
                pending: ex.pending,
                in_progress: ex.in_progress,
                filtered_out: ex.filtered_out,
                duplicates: ex.duplicates,
            },
            concurrency: convert_concurrency(&report.concurrency, include_timeline),
            summary: convert_summary(&report.summary),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn convert_concurrency(c: &ConcurrencyReport, include_timeline: bool) -> JsonConcurrency {
    let timeline = include_timeline.then(|| {
        c.timeline
            .iter()
            .map(|s| JsonSnapshot {
                at: s.at,
                level: s.level,
            })
            .collect()
    });

    JsonConcurrency {
        threshold: c.threshold,
        event_count: c.event_count,
        event_groups: c.event_groups,
        max_concurrency: c.max_concurrency,
        max_concurrency_at: c.max_concurrency_at,
        levels: c
            .level_shares()
            .into_iter()
            .map(|s| JsonLevel {
                level: s.level,
                groups: s.groups,
                percentage: s.percentage,
                time_ms: s.time_ms,
                time_percentage: s.time_percentage,
            })
            .collect(),
        high_concurrency_intervals: c
            .high_concurrency_intervals
            .iter()
            .map(|i| JsonInterval {
                start: i.start,
                end: i.end,
                duration_ms: i.duration().num_milliseconds(),
                peak: i.peak,
                closed_by: i.closed_by.as_str().to_string(),
            })
            .collect(),
        high_concurrency_ms: c.high_concurrency_time().num_milliseconds(),
        timeline,
    }
}

fn convert_categories(rows: &[CategoryCount]) -> Vec<JsonCategory> {
    rows.iter()
        .map(|r| JsonCategory {
            key: r.key.clone(),
            count: r.count,
            percentage: r.percentage,
        })
        .collect()
}

fn convert_stats(stats: &DurationStats) -> JsonDurationStats {
    JsonDurationStats {
        count: stats.count,
        mean: stats.mean,
        stddev: stats.stddev,
        min: stats.min,
        max: stats.max,
        median: stats.median,
        p90: stats.p90,
        p95: stats.p95,
        p99: stats.p99,
    }
}

fn convert_summary(summary: &TaskSummary) -> JsonSummary {
    JsonSummary {
        by_type: convert_categories(&summary.by_type),
        by_status: convert_categories(&summary.by_status),
        by_submitter: convert_categories(&summary.by_submitter),
        by_branch_type: convert_categories(&summary.by_branch_type),
        by_warning_count: convert_categories(&summary.by_warning_count),
        by_project: convert_categories(&summary.by_project),
        execution_time_ms: summary.execution_time.as_ref().map(convert_stats),
        queue_wait_ms: summary.queue_wait.as_ref().map(convert_stats),
        first_submitted: summary.first_submitted,
        last_ended: summary.last_ended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Exclusions;
    use crate::concurrency::analyze_concurrency;
    use crate::task_record::TaskRecord;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, secs).unwrap()
    }

    fn scenario_a() -> AnalysisReport {
        let records = vec![
            TaskRecord::new("t1".into(), at(0), at(0), 2000),
            TaskRecord::new("t2".into(), at(1), at(1), 1000),
        ];
        AnalysisReport {
            summary: TaskSummary::build(&[], &records),
            exclusions: Exclusions {
                pending: 1,
                ..Exclusions::default()
            },
            concurrency: analyze_concurrency(&records, 2),
        }
    }

    #[test]
    fn test_json_report_creation() {
        let output = JsonReport::from_report(&scenario_a(), false);
        assert_eq!(output.format, "queuestat-json-v1");
        assert_eq!(output.tasks.analyzed, 2);
        assert_eq!(output.tasks.pending, 1);
        assert_eq!(output.concurrency.max_concurrency, 2);
        assert_eq!(output.concurrency.high_concurrency_intervals.len(), 1);
        assert_eq!(output.concurrency.high_concurrency_ms, 1000);
    }

    #[test]
    fn test_json_serialization() {
        let json = JsonReport::from_report(&scenario_a(), false)
            .to_json()
            .unwrap();

        assert!(json.contains("\"format\": \"queuestat-json-v1\""));
        assert!(json.contains("\"max_concurrency_at\": \"2024-01-15T10:00:01Z\""));
        assert!(json.contains("\"closed_by\": \"threshold\""));
        assert!(json.contains("\"duration_ms\": 1000"));
    }

    #[test]
    fn test_timeline_only_when_requested() {
        let without = JsonReport::from_report(&scenario_a(), false);
        assert!(without.concurrency.timeline.is_none());
        assert!(!without.to_json().unwrap().contains("\"timeline\""));

        let with = JsonReport::from_report(&scenario_a(), true);
        let levels: Vec<usize> = with
            .concurrency
            .timeline
            .unwrap()
            .iter()
            .map(|s| s.level)
            .collect();
        assert_eq!(levels, vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_report_omits_peak_time() {
        let report = AnalysisReport {
            summary: TaskSummary::default(),
            exclusions: Exclusions::default(),
            concurrency: ConcurrencyReport::empty(4),
        };
        let json = JsonReport::from_report(&report, false).to_json().unwrap();
        assert!(json.contains("\"max_concurrency\": 0"));
        assert!(!json.contains("max_concurrency_at"));
        assert!(!json.contains("execution_time_ms"));
    }

    #[test]
    fn test_json_parses_back() {
        let json = JsonReport::from_report(&scenario_a(), true)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["concurrency"]["levels"][0]["level"], 0);
        assert_eq!(value["tasks"]["total"], 0);
    }
}
