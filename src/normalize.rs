//! Task record normalization
//!
//! Turns raw page-file records into `TaskRecord`s with an authoritative,
//! millisecond-resolution end time. The server's `executedAt` field is
//! truncated to whole seconds; deriving the end from `startedAt +
//! executionTimeMs` keeps an End and a Start inside the same second in their
//! real order.
//!
//! Records that never started (no `startedAt`) and records still running (no
//! `executionTimeMs`) are excluded and counted. Anything malformed aborts
//! with a `ValidationError`.

use crate::error::ValidationError;
use crate::task_record::{parse_timestamp, RawTask, TaskId, TaskRecord};
use serde::Deserialize;
use serde_json::Value;

/// Outcome of normalizing a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Started and finished: contributes a Start and an End event
    Ready(TaskRecord),
    /// Queued, never started
    Pending,
    /// Started but no execution time reported yet
    InProgress,
}

/// Normalized record set with exclusion counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTasks {
    pub records: Vec<TaskRecord>,
    pub pending: usize,
    pub in_progress: usize,
}

impl NormalizedTasks {
    /// Records skipped because they never ran to completion
    pub fn excluded(&self) -> usize {
        self.pending + self.in_progress
    }
}

/// Decode one JSON value into a `RawTask`
///
/// A field of the wrong type (e.g. `"executionTimeMs": "fast"`) or a
/// non-object entry is reported as `ValidationError::WrongType`.
pub fn parse_raw_task(index: usize, value: &Value) -> Result<RawTask, ValidationError> {
    RawTask::deserialize(value).map_err(|e| ValidationError::WrongType {
        index,
        id: diagnostic_id(value),
        message: e.to_string(),
    })
}

/// Decode a whole batch, stopping at the first malformed record
pub fn parse_raw_tasks(values: &[Value]) -> Result<Vec<RawTask>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| parse_raw_task(index, value))
        .collect()
}

fn diagnostic_id(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "<unknown>".to_string(),
    }
}

/// Normalize one raw task
///
/// `index` is the record's position in the concatenated input and only
/// appears in error messages.
pub fn normalize_task(index: usize, raw: &RawTask) -> Result<Normalized, ValidationError> {
    let id = raw.display_id();

    let submitted_raw = raw
        .submitted_at
        .as_deref()
        .ok_or_else(|| ValidationError::MissingField {
            index,
            id: id.clone(),
            field: "submittedAt",
        })?;
    let submitted_at = timestamp(index, &id, "submittedAt", submitted_raw)?;

    let execution_time_ms = match raw.execution_time_ms {
        Some(ms) if ms < 0 => {
            return Err(ValidationError::NegativeDuration {
                index,
                id,
                value: ms,
            })
        }
        Some(ms) => Some(ms as u64),
        None => None,
    };

    let Some(started_raw) = raw.started_at.as_deref() else {
        return Ok(Normalized::Pending);
    };
    let started_at = timestamp(index, &id, "startedAt", started_raw)?;

    let Some(execution_time_ms) = execution_time_ms else {
        return Ok(Normalized::InProgress);
    };

    if started_at < submitted_at {
        tracing::warn!(
            "task {} started {}ms before it was submitted",
            id,
            (submitted_at - started_at).num_milliseconds()
        );
    }

    let task_id = raw.id.clone().unwrap_or_else(|| TaskId::Number(index as i64));
    let mut record = TaskRecord::try_new(task_id, submitted_at, started_at, execution_time_ms)
        .ok_or_else(|| ValidationError::DurationOutOfRange {
            index,
            id: id.clone(),
            value: execution_time_ms as i64,
        })?;
    record.task_type = raw.task_type.clone();
    record.status = raw.status.clone();
    record.submitter = raw.submitter_login.clone();
    record.branch_type = raw.branch_type.clone();
    record.warning_count = raw.warning_count;
    record.component_key = raw.component_key.clone();

    Ok(Normalized::Ready(record))
}

fn timestamp(
    index: usize,
    id: &str,
    field: &'static str,
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, ValidationError> {
    parse_timestamp(value).ok_or_else(|| ValidationError::InvalidTimestamp {
        index,
        id: id.to_string(),
        field,
        value: value.to_string(),
    })
}

/// Normalize a batch of raw tasks (abort-on-first-error policy)
pub fn normalize_tasks(raws: &[RawTask]) -> Result<NormalizedTasks, ValidationError> {
    normalize_indexed(raws.iter().enumerate())
}

/// Normalize `(index, task)` pairs, keeping the caller's indices in errors
///
/// Used when the tasks are a filtered subset of the loaded input.
pub fn normalize_indexed<'a, I>(raws: I) -> Result<NormalizedTasks, ValidationError>
where
    I: IntoIterator<Item = (usize, &'a RawTask)>,
{
    let mut out = NormalizedTasks::default();
    let mut seen = 0usize;

    for (index, raw) in raws {
        seen += 1;
        match normalize_task(index, raw)? {
            Normalized::Ready(record) => out.records.push(record),
            Normalized::Pending => out.pending += 1,
            Normalized::InProgress => out.in_progress += 1,
        }
    }

    tracing::debug!(
        "normalized {} tasks: {} ready, {} pending, {} in progress",
        seen,
        out.records.len(),
        out.pending,
        out.in_progress
    );

    Ok(out)
}
