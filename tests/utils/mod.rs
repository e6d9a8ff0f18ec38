// Integration Test Utilities
//
// Helpers for writing task page files into temporary directories

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A finished task on 2024-01-15, `start` given as "HH:MM:SS"
pub fn finished(id: &str, start: &str, execution_ms: i64) -> Value {
    json!({
        "id": id,
        "type": "REPORT",
        "status": "SUCCESS",
        "submitterLogin": "alice",
        "branchType": "BRANCH",
        "componentKey": "acme-api",
        "warningCount": 0,
        "submittedAt": format!("2024-01-15T{}+0000", start),
        "startedAt": format!("2024-01-15T{}+0000", start),
        "executedAt": format!("2024-01-15T{}+0000", start),
        "executionTimeMs": execution_ms
    })
}

/// A queued task that never started
pub fn pending(id: &str, submitted: &str) -> Value {
    json!({
        "id": id,
        "type": "REPORT",
        "status": "PENDING",
        "submittedAt": format!("2024-01-15T{}+0000", submitted)
    })
}

/// Write one page file holding `tasks`
pub fn write_page(dir: &Path, page: usize, tasks: &[Value]) -> PathBuf {
    let path = dir.join(format!("tasks_page_{}.json", page));
    let body = json!({
        "tasks": tasks,
        "paging": { "pageIndex": page, "pageSize": 100, "total": tasks.len() }
    });
    fs::write(&path, body.to_string()).unwrap();
    path
}

/// Two overlapping tasks: max 2 at 10:00:01, one window [10:00:01, 10:00:02]
pub fn scenario_a(dir: &Path) -> PathBuf {
    write_page(
        dir,
        1,
        &[finished("t1", "10:00:00", 2000), finished("t2", "10:00:01", 1000)],
    )
}
