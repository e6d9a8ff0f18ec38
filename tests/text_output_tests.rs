//! Integration tests for the default text report

use predicates::prelude::*;

mod utils;
use utils::{finished, pending, scenario_a, write_page};

#[test]
fn test_text_reports_peak_and_window() {
    let dir = tempfile::tempdir().unwrap();
    let page = scenario_a(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("-t").arg("2").arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("=== Concurrency (threshold >= 2) ==="))
        .stdout(predicate::str::contains(
            "Max concurrency:  2 at 2024-01-15 10:00:01.000",
        ))
        .stdout(predicate::str::contains("Intervals with concurrency >= 2: 1"))
        .stdout(predicate::str::contains(
            "2024-01-15 10:00:01.000 -> 2024-01-15 10:00:02.000",
        ));
}

#[test]
fn test_default_threshold_is_four() {
    let dir = tempfile::tempdir().unwrap();
    let page = scenario_a(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("threshold >= 4"))
        .stdout(predicate::str::contains("No intervals with concurrency >= 4."));
}

#[test]
fn test_directory_of_pages() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), 1, &[finished("t1", "10:00:00", 2000)]);
    write_page(dir.path(), 2, &[finished("t2", "10:00:01", 1000)]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("--threshold").arg("2").arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Tasks analyzed:   2"))
        .stdout(predicate::str::contains("Max concurrency:  2"));
}

#[test]
fn test_pending_tasks_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), 1, &[pending("p1", "10:00:00")]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No executed tasks found."))
        .stderr(predicate::str::contains("1 pending"));
}

#[test]
fn test_duplicates_across_pages_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), 1, &[finished("t1", "10:00:00", 2000)]);
    write_page(dir.path(), 2, &[finished("t1", "10:00:00", 2000)]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("-t").arg("2").arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("duplicates: 1"))
        .stdout(predicate::str::contains("Max concurrency:  1"));
}

#[test]
fn test_filter_restricts_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut other = finished("t2", "10:00:01", 1000);
    other["type"] = "ISSUE_SYNC".into();
    let page = write_page(dir.path(), 1, &[finished("t1", "10:00:00", 2000), other]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("-e").arg("type=REPORT").arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("filtered out: 1"))
        .stdout(predicate::str::contains("Max concurrency:  1"));
}

#[test]
fn test_config_file_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let page = scenario_a(dir.path());
    let config = dir.path().join("queuestat.toml");
    std::fs::write(&config, "threshold = 2\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("--config").arg(&config).arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("threshold >= 2"));
}

#[test]
fn test_cli_threshold_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let page = scenario_a(dir.path());
    let config = dir.path().join("queuestat.toml");
    std::fs::write(&config, "threshold = 2\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("queuestat");
    cmd.arg("--config").arg(&config).arg("-t").arg("3").arg(&page);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("threshold >= 3"));
}
