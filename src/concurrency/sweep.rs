// Linear sweep over event groups
//
// One pass, one evaluation per timestamp group: peak, histogram, timeline
// and threshold crossings are all derived from the count *after* the whole
// group has been applied.

use super::event::{build_events, group_events};
use crate::task_record::TaskRecord;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Threshold used when the caller does not pick one
pub const DEFAULT_THRESHOLD: usize = 4;

/// Concurrency level valid from `at` until the next snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencySnapshot {
    pub at: DateTime<Utc>,
    pub level: usize,
}

/// How a high-concurrency interval ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalClose {
    /// Concurrency dropped below the threshold at `end`
    ThresholdCrossing,
    /// Data ran out while still at or above the threshold; `end` is the
    /// last observed event time
    EndOfData,
}

impl IntervalClose {
    /// Stable name used in machine-readable output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdCrossing => "threshold",
            Self::EndOfData => "end_of_data",
        }
    }
}

/// Maximal window during which concurrency stayed at or above the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighConcurrencyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Highest level reached inside the window
    pub peak: usize,
    pub closed_by: IntervalClose,
}

impl HighConcurrencyInterval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for HighConcurrencyInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}ms, peak {})",
            self.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.end.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.duration().num_milliseconds(),
            self.peak
        )?;
        if self.closed_by == IntervalClose::EndOfData {
            write!(f, " [end of data]")?;
        }
        Ok(())
    }
}

/// Share of a single concurrency level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelShare {
    pub level: usize,
    /// Number of event groups evaluated at this level
    pub groups: u64,
    /// `groups / event_groups * 100`
    pub percentage: f64,
    /// Wall-clock milliseconds spent at this level
    pub time_ms: u64,
    /// `time_ms / observed span * 100`
    pub time_percentage: f64,
}

/// Result bundle of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyReport {
    pub threshold: usize,
    /// Records that contributed events
    pub eligible_tasks: usize,
    pub event_count: usize,
    /// Distinct event timestamps
    pub event_groups: usize,
    pub max_concurrency: usize,
    /// First group time at which `max_concurrency` was reached
    pub max_concurrency_at: Option<DateTime<Utc>>,
    /// Level -> number of event groups evaluated at that level
    pub level_histogram: BTreeMap<usize, u64>,
    /// Level -> milliseconds between a group at that level and the next group
    pub time_at_level: BTreeMap<usize, u64>,
    pub timeline: Vec<ConcurrencySnapshot>,
    pub high_concurrency_intervals: Vec<HighConcurrencyInterval>,
}

impl ConcurrencyReport {
    /// Zero-valued report for an empty record set
    pub fn empty(threshold: usize) -> Self {
        Self {
            threshold,
            eligible_tasks: 0,
            event_count: 0,
            event_groups: 0,
            max_concurrency: 0,
            max_concurrency_at: None,
            level_histogram: BTreeMap::new(),
            time_at_level: BTreeMap::new(),
            timeline: Vec::new(),
            high_concurrency_intervals: Vec::new(),
        }
    }

    /// True when no task contributed any event
    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }

    /// First and last event time
    pub fn observed_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.timeline.first()?.at, self.timeline.last()?.at))
    }

    /// Total milliseconds between the first and the last event
    pub fn observed_span_ms(&self) -> u64 {
        self.time_at_level.values().sum()
    }

    /// Per-level shares, ascending by level
    ///
    /// Percentages are taken over event groups, not events, so simultaneous
    /// events are never counted twice.
    pub fn level_shares(&self) -> Vec<LevelShare> {
        let span_ms = self.observed_span_ms();

        self.level_histogram
            .iter()
            .map(|(&level, &groups)| {
                let time_ms = self.time_at_level.get(&level).copied().unwrap_or(0);
                LevelShare {
                    level,
                    groups,
                    percentage: percent(groups, self.event_groups as u64),
                    time_ms,
                    time_percentage: percent(time_ms, span_ms),
                }
            })
            .collect()
    }

    /// Total time spent in high-concurrency intervals
    pub fn high_concurrency_time(&self) -> Duration {
        self.high_concurrency_intervals
            .iter()
            .fold(Duration::zero(), |acc, interval| acc + interval.duration())
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Interval still waiting for a downward crossing
struct OpenInterval {
    start: DateTime<Utc>,
    peak: usize,
}

impl OpenInterval {
    fn close(self, end: DateTime<Utc>, closed_by: IntervalClose) -> HighConcurrencyInterval {
        HighConcurrencyInterval {
            start: self.start,
            end,
            peak: self.peak,
            closed_by,
        }
    }
}

/// Sweep the execution intervals of `records`
///
/// Crossing rule: an interval opens at the first group whose level is
/// `>= threshold` and closes at the first later group whose level is
/// `< threshold`. An interval still open after the last group is closed at
/// the last event time and marked `IntervalClose::EndOfData`.
///
/// Never fails: an empty slice yields `ConcurrencyReport::empty`.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use queuestat::concurrency::analyze_concurrency;
/// use queuestat::task_record::TaskRecord;
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
/// let t1 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 1).unwrap();
/// let records = vec![
///     TaskRecord::new("t1".into(), t0, t0, 2000),
///     TaskRecord::new("t2".into(), t1, t1, 1000),
/// ];
///
/// let report = analyze_concurrency(&records, 2);
/// assert_eq!(report.max_concurrency, 2);
/// assert_eq!(report.max_concurrency_at, Some(t1));
/// assert_eq!(report.high_concurrency_intervals.len(), 1);
/// ```
pub fn analyze_concurrency(records: &[TaskRecord], threshold: usize) -> ConcurrencyReport {
    let events = build_events(records);
    let mut report = ConcurrencyReport::empty(threshold);
    report.eligible_tasks = records.len();
    report.event_count = events.len();

    let mut current = 0usize;
    let mut open: Option<OpenInterval> = None;
    let mut previous: Option<ConcurrencySnapshot> = None;

    for group in group_events(&events) {
        current = group.apply(current);
        report.event_groups += 1;

        if let Some(prev) = previous {
            let elapsed = (group.time - prev.at).num_milliseconds().max(0) as u64;
            *report.time_at_level.entry(prev.level).or_default() += elapsed;
        }

        if current > report.max_concurrency {
            report.max_concurrency = current;
            report.max_concurrency_at = Some(group.time);
        }

        *report.level_histogram.entry(current).or_default() += 1;

        match (open.take(), current >= threshold) {
            (None, true) => {
                open = Some(OpenInterval {
                    start: group.time,
                    peak: current,
                })
            }
            (Some(mut interval), true) => {
                interval.peak = interval.peak.max(current);
                open = Some(interval);
            }
            (Some(interval), false) => {
                report
                    .high_concurrency_intervals
                    .push(interval.close(group.time, IntervalClose::ThresholdCrossing));
            }
            (None, false) => {}
        }

        let snapshot = ConcurrencySnapshot {
            at: group.time,
            level: current,
        };
        report.timeline.push(snapshot);
        previous = Some(snapshot);
    }

    if let (Some(interval), Some(last)) = (open, previous) {
        tracing::debug!(
            "high-concurrency interval opened at {} still open at end of data, closing at {}",
            interval.start,
            last.at
        );
        report
            .high_concurrency_intervals
            .push(interval.close(last.at, IntervalClose::EndOfData));
    }

    tracing::debug!(
        "swept {} events in {} groups: max concurrency {} ({} intervals >= {})",
        report.event_count,
        report.event_groups,
        report.max_concurrency,
        report.high_concurrency_intervals.len(),
        threshold
    );

    report
}
