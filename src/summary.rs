//! Categorical task summaries and duration statistics
//!
//! Counts by type, status, submitter, branch type, warning count and
//! project, plus execution-time and queue-wait distributions computed with
//! Trueno.

use crate::task_record::{RawTask, TaskRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Key used when a task does not carry the grouped attribute
pub const MISSING_KEY: &str = "(none)";

/// One row of a categorical breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub key: String,
    pub count: u64,
    /// Share of all summarized tasks
    pub percentage: f64,
}

/// Distribution of a duration in milliseconds
#[derive(Debug, Clone, PartialEq)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32, // P50
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

/// Summary over a task set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSummary {
    pub total_tasks: usize,
    pub by_type: Vec<CategoryCount>,
    pub by_status: Vec<CategoryCount>,
    pub by_submitter: Vec<CategoryCount>,
    pub by_branch_type: Vec<CategoryCount>,
    pub by_warning_count: Vec<CategoryCount>,
    pub by_project: Vec<CategoryCount>,
    /// Over finished tasks only
    pub execution_time: Option<DurationStats>,
    /// `startedAt - submittedAt` over finished tasks
    pub queue_wait: Option<DurationStats>,
    pub first_submitted: Option<DateTime<Utc>>,
    pub last_ended: Option<DateTime<Utc>>,
}

impl TaskSummary {
    /// Summarize `tasks` (all of them, started or not) and the timings of
    /// the finished `records`
    pub fn build(tasks: &[RawTask], records: &[TaskRecord]) -> Self {
        let total = tasks.len();

        let execution: Vec<f32> = records
            .iter()
            .map(|r| r.execution_time_ms as f32)
            .collect();
        let waits: Vec<f32> = records
            .iter()
            .map(|r| r.queue_wait().num_milliseconds() as f32)
            .collect();

        Self {
            total_tasks: total,
            by_type: count_by(tasks, |t| t.task_type.clone()),
            by_status: count_by(tasks, |t| t.status.clone()),
            by_submitter: count_by(tasks, |t| t.submitter_login.clone()),
            by_branch_type: count_by(tasks, |t| t.branch_type.clone()),
            by_warning_count: count_by(tasks, |t| t.warning_count.map(|w| w.to_string())),
            by_project: count_by(tasks, |t| t.component_key.clone()),
            execution_time: DurationStats::from_millis(&execution),
            queue_wait: DurationStats::from_millis(&waits),
            first_submitted: records.iter().map(|r| r.submitted_at).min(),
            last_ended: records.iter().map(|r| r.ended_at).max(),
        }
    }
}

/// Group by key, sorted by count (descending) then key
fn count_by<F>(tasks: &[RawTask], key: F) -> Vec<CategoryCount>
where
    F: Fn(&RawTask) -> Option<String>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for task in tasks {
        let k = key(task).unwrap_or_else(|| MISSING_KEY.to_string());
        *counts.entry(k).or_default() += 1;
    }

    let total = tasks.len() as f64;
    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(key, count)| CategoryCount {
            key,
            count,
            percentage: if total > 0.0 {
                (count as f64 / total) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

impl DurationStats {
    /// Statistics over millisecond samples; `None` when there are none
    pub fn from_millis(samples: &[f32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let v = trueno::Vector::from_slice(samples);

        let mean = v.mean().unwrap_or(0.0);
        let stddev = v.stddev().unwrap_or(0.0);
        let min = v.min().unwrap_or(0.0);
        let max = v.max().unwrap_or(0.0);

        // Trueno has no percentile function
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(Self {
            count: samples.len(),
            mean,
            stddev,
            min,
            max,
            median: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted_data: &[f32], percentile: f32) -> f32 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0];
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f32;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f32;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}
