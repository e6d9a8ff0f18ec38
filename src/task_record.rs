//! Task record shapes: page files on disk and the normalized in-memory form
//!
//! Page files are written by the acquisition step, one per API page:
//!
//! ```json
//! {
//!   "tasks": [
//!     {
//!       "id": "AYx1",
//!       "type": "REPORT",
//!       "status": "SUCCESS",
//!       "componentKey": "acme-api",
//!       "submittedAt": "2024-01-15T09:59:58+0000",
//!       "startedAt": "2024-01-15T10:00:00+0000",
//!       "executedAt": "2024-01-15T10:00:02+0000",
//!       "executionTimeMs": 2000
//!     }
//!   ],
//!   "paging": { "pageIndex": 1, "pageSize": 100, "total": 1 }
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque task identifier (the server emits strings, older dumps integers)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Text(String),
    Number(i64),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Text(s) => f.write_str(s),
            TaskId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId::Text(s.to_string())
    }
}

/// Paging block of a page file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    #[serde(default)]
    pub page_index: u64,
    #[serde(default)]
    pub page_size: u64,
    #[serde(default)]
    pub total: u64,
}

/// One page file
///
/// Tasks stay as raw JSON values here: type errors are reported per record
/// by the normalizer, with the record's position and id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    #[serde(default)]
    pub tasks: Vec<serde_json::Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// A task exactly as the server reported it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub submitter_login: Option<String>,
    #[serde(default)]
    pub branch_type: Option<String>,
    #[serde(default)]
    pub warning_count: Option<u64>,
    #[serde(default)]
    pub component_key: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    /// Second-resolution completion time; informational only
    #[serde(default)]
    pub executed_at: Option<String>,
    #[serde(default)]
    pub execution_time_ms: Option<i64>,
}

impl RawTask {
    /// Id rendered for diagnostics
    pub fn display_id(&self) -> String {
        self.id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }
}

/// A task ready for concurrency analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub submitted_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    /// Always `started_at + execution_time_ms`
    pub ended_at: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub task_type: Option<String>,
    pub status: Option<String>,
    pub submitter: Option<String>,
    pub branch_type: Option<String>,
    pub warning_count: Option<u64>,
    pub component_key: Option<String>,
}

impl TaskRecord {
    /// Build a record from its timing; the end is derived from the duration
    ///
    /// # Panics
    ///
    /// If `started_at + execution_time_ms` is not a representable
    /// timestamp. Use [`TaskRecord::try_new`] for untrusted input.
    pub fn new(
        id: TaskId,
        submitted_at: DateTime<Utc>,
        started_at: DateTime<Utc>,
        execution_time_ms: u64,
    ) -> Self {
        match Self::try_new(id, submitted_at, started_at, execution_time_ms) {
            Some(record) => record,
            None => panic!(
                "task ending {}ms after {} is out of range",
                execution_time_ms, started_at
            ),
        }
    }

    /// Like [`TaskRecord::new`], but `None` when the end time overflows
    pub fn try_new(
        id: TaskId,
        submitted_at: DateTime<Utc>,
        started_at: DateTime<Utc>,
        execution_time_ms: u64,
    ) -> Option<Self> {
        let duration = Duration::try_milliseconds(i64::try_from(execution_time_ms).ok()?)?;
        let ended_at = started_at.checked_add_signed(duration)?;

        Some(Self {
            id,
            submitted_at,
            started_at,
            ended_at,
            execution_time_ms,
            task_type: None,
            status: None,
            submitter: None,
            branch_type: None,
            warning_count: None,
            component_key: None,
        })
    }

    /// Time spent waiting in the queue (negative if the source clock skewed)
    pub fn queue_wait(&self) -> Duration {
        self.started_at - self.submitted_at
    }

    pub fn execution_time(&self) -> Duration {
        self.ended_at - self.started_at
    }
}

/// Parse a server timestamp
///
/// Accepts RFC 3339 (`2024-01-15T10:00:00Z`, `+00:00`) and the compact
/// offset form the server emits (`2024-01-15T10:00:00+0000`), both with
/// optional fractional seconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
