//! Human-readable report rendering

use crate::analysis::AnalysisReport;
use crate::concurrency::{ConcurrencyReport, IntervalClose};
use crate::summary::{CategoryCount, DurationStats, TaskSummary};
use chrono::{DateTime, Duration, Utc};
use std::fmt::{self, Write};

const RULE: &str = "------ ---------- ---------- --------------- ----------";

/// Format a timestamp with millisecond precision
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Format a duration as `1h 02m 03.000s`, `2m 03.500s` or `1.000s`
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.num_milliseconds();
    let sign = if total_ms < 0 { "-" } else { "" };
    let total_ms = total_ms.unsigned_abs();

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if hours > 0 {
        format!("{sign}{hours}h {minutes:02}m {seconds:02}.{millis:03}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m {seconds:02}.{millis:03}s")
    } else {
        format!("{sign}{seconds}.{millis:03}s")
    }
}

/// Full text report, rendered through `Display`
pub struct TextReport<'a> {
    report: &'a AnalysisReport,
    top: usize,
}

impl<'a> TextReport<'a> {
    /// `top` limits the rows of each categorical breakdown
    pub fn new(report: &'a AnalysisReport, top: usize) -> Self {
        Self { report, top }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_concurrency(f, self.report)?;
        writeln!(f)?;
        render_summary(f, &self.report.summary, self.top)
    }
}

/// Render the full report
pub fn render(report: &AnalysisReport, top: usize) -> String {
    TextReport::new(report, top).to_string()
}

fn render_concurrency(out: &mut impl Write, report: &AnalysisReport) -> fmt::Result {
    let c = &report.concurrency;
    let ex = &report.exclusions;

    writeln!(out, "=== Concurrency (threshold >= {}) ===\n", c.threshold)?;
    writeln!(
        out,
        "Tasks analyzed:   {} (pending: {}, in progress: {}, filtered out: {}, duplicates: {})",
        c.eligible_tasks, ex.pending, ex.in_progress, ex.filtered_out, ex.duplicates
    )?;

    if c.is_empty() {
        writeln!(out, "No executed tasks found.")?;
        return Ok(());
    }

    if let Some((first, last)) = c.observed_range() {
        writeln!(
            out,
            "Observed range:   {} -> {} ({})",
            format_time(&first),
            format_time(&last),
            format_duration(last - first)
        )?;
    }
    writeln!(out, "Events:           {} in {} groups", c.event_count, c.event_groups)?;
    match &c.max_concurrency_at {
        Some(at) => {
            writeln!(
                out,
                "Max concurrency:  {} at {}",
                c.max_concurrency,
                format_time(at)
            )?;
        }
        None => {
            writeln!(out, "Max concurrency:  0")?;
        }
    }

    writeln!(out)?;
    render_levels(out, c)?;
    writeln!(out)?;
    render_intervals(out, c)
}

fn render_levels(out: &mut impl Write, c: &ConcurrencyReport) -> fmt::Result {
    writeln!(out, " level     groups   % groups            time     % time")?;
    writeln!(out, "{}", RULE)?;
    for share in c.level_shares() {
        writeln!(
            out,
            "{:>6} {:>10} {:>9.2}% {:>15} {:>9.2}%",
            share.level,
            share.groups,
            share.percentage,
            format_duration(Duration::milliseconds(share.time_ms as i64)),
            share.time_percentage
        )?;
    }
    Ok(())
}

fn render_intervals(out: &mut impl Write, c: &ConcurrencyReport) -> fmt::Result {
    let intervals = &c.high_concurrency_intervals;
    if intervals.is_empty() {
        writeln!(out, "No intervals with concurrency >= {}.", c.threshold)?;
        return Ok(());
    }

    writeln!(
        out,
        "Intervals with concurrency >= {}: {} (total {})",
        c.threshold,
        intervals.len(),
        format_duration(c.high_concurrency_time())
    )?;
    for (i, interval) in intervals.iter().enumerate() {
        write!(
            out,
            "{:>4}. {} -> {}  {:>12}  peak {}",
            i + 1,
            format_time(&interval.start),
            format_time(&interval.end),
            format_duration(interval.duration()),
            interval.peak
        )?;
        if interval.closed_by == IntervalClose::EndOfData {
            write!(out, "  (still open at end of data)")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_summary(out: &mut impl Write, summary: &TaskSummary, top: usize) -> fmt::Result {
    writeln!(out, "=== Tasks ({} total) ===", summary.total_tasks)?;

    for (title, rows) in [
        ("type", &summary.by_type),
        ("status", &summary.by_status),
        ("submitter", &summary.by_submitter),
        ("branch type", &summary.by_branch_type),
        ("warning count", &summary.by_warning_count),
        ("project", &summary.by_project),
    ] {
        render_category(out, title, rows, top)?;
    }

    if let Some(stats) = &summary.execution_time {
        render_duration_stats(out, "Execution time", stats)?;
    }
    if let Some(stats) = &summary.queue_wait {
        render_duration_stats(out, "Queue wait", stats)?;
    }
    Ok(())
}

fn render_category(
    out: &mut impl Write,
    title: &str,
    rows: &[CategoryCount],
    top: usize,
) -> fmt::Result {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nBy {}:", title)?;
    for row in rows.iter().take(top) {
        writeln!(out, "  {:<40} {:>8} {:>7.2}%", row.key, row.count, row.percentage)?;
    }
    if rows.len() > top {
        writeln!(out, "  ... {} more", rows.len() - top)?;
    }
    Ok(())
}

fn render_duration_stats(
    out: &mut impl Write,
    title: &str,
    stats: &DurationStats,
) -> fmt::Result {
    let ms = |v: f32| format_duration(Duration::milliseconds(v.round() as i64));
    writeln!(out, "\n{} ({} tasks):", title, stats.count)?;
    writeln!(out, "  Mean:         {}", ms(stats.mean))?;
    writeln!(out, "  Std Dev:      {}", ms(stats.stddev))?;
    writeln!(out, "  Min:          {}", ms(stats.min))?;
    writeln!(out, "  Max:          {}", ms(stats.max))?;
    writeln!(out, "  Median (P50): {}", ms(stats.median))?;
    writeln!(out, "  P90:          {}", ms(stats.p90))?;
    writeln!(out, "  P95:          {}", ms(stats.p95))?;
    writeln!(out, "  P99:          {}", ms(stats.p99))?;
    Ok(())
}
