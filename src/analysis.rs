//! End-to-end analysis of a loaded task corpus
//!
//! parse -> filter -> normalize -> summarize -> sweep

use crate::concurrency::{analyze_concurrency, ConcurrencyReport};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::filter::TaskFilter;
use crate::loader::TaskCorpus;
use crate::normalize::{normalize_indexed, parse_raw_tasks};
use crate::summary::TaskSummary;
use crate::task_record::RawTask;

/// Tasks left out of the concurrency sweep, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Queued, never started
    pub pending: usize,
    /// Started, no execution time yet
    pub in_progress: usize,
    /// Rejected by the task filter
    pub filtered_out: usize,
    /// Dropped by the loader as repeated ids
    pub duplicates: usize,
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub summary: TaskSummary,
    pub exclusions: Exclusions,
    pub concurrency: ConcurrencyReport,
}

/// Run the full analysis over a corpus
///
/// Fails on invalid configuration or on the first malformed record. An
/// empty corpus is not a failure: the concurrency report is empty.
pub fn analyze(
    corpus: &TaskCorpus,
    filter: &TaskFilter,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate().map_err(AnalysisError::Config)?;

    let raws = parse_raw_tasks(&corpus.tasks)?;
    let selected: Vec<(usize, &RawTask)> = raws
        .iter()
        .enumerate()
        .filter(|(_, raw)| filter.matches(raw))
        .collect();
    let filtered_out = raws.len() - selected.len();
    if !filter.is_all() {
        tracing::debug!("filter kept {} of {} tasks", selected.len(), raws.len());
    }

    let normalized = normalize_indexed(selected.iter().copied())?;

    let tasks: Vec<RawTask> = selected.iter().map(|(_, raw)| (*raw).clone()).collect();
    let summary = TaskSummary::build(&tasks, &normalized.records);
    let concurrency = analyze_concurrency(&normalized.records, config.threshold);

    Ok(AnalysisReport {
        summary,
        exclusions: Exclusions {
            pending: normalized.pending,
            in_progress: normalized.in_progress,
            filtered_out,
            duplicates: corpus.duplicates,
        },
        concurrency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus(tasks: Vec<serde_json::Value>) -> TaskCorpus {
        TaskCorpus {
            tasks,
            pages: 1,
            ..TaskCorpus::default()
        }
    }

    fn finished(id: &str, task_type: &str, start: &str, ms: i64) -> serde_json::Value {
        json!({
            "id": id,
            "type": task_type,
            "status": "SUCCESS",
            "submittedAt": start,
            "startedAt": start,
            "executionTimeMs": ms
        })
    }

    #[test]
    fn test_full_pipeline() {
        let corpus = corpus(vec![
            finished("a", "REPORT", "2024-01-15T10:00:00+0000", 2000),
            finished("b", "REPORT", "2024-01-15T10:00:01+0000", 1000),
            json!({"id": "c", "status": "PENDING", "submittedAt": "2024-01-15T10:00:00+0000"}),
        ]);
        let config = AnalysisConfig {
            threshold: 2,
            ..AnalysisConfig::default()
        };

        let report = analyze(&corpus, &TaskFilter::all(), &config).unwrap();

        assert_eq!(report.summary.total_tasks, 3);
        assert_eq!(report.exclusions.pending, 1);
        assert_eq!(report.concurrency.max_concurrency, 2);
        assert_eq!(report.concurrency.high_concurrency_intervals.len(), 1);
    }

    #[test]
    fn test_filter_applies_before_sweep() {
        let corpus = corpus(vec![
            finished("a", "REPORT", "2024-01-15T10:00:00+0000", 2000),
            finished("b", "ISSUE_SYNC", "2024-01-15T10:00:01+0000", 1000),
        ]);
        let filter = TaskFilter::from_expr("type=REPORT").unwrap();

        let report = analyze(&corpus, &filter, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.exclusions.filtered_out, 1);
        assert_eq!(report.summary.total_tasks, 1);
        assert_eq!(report.concurrency.max_concurrency, 1);
    }

    #[test]
    fn test_malformed_record_aborts() {
        let corpus = corpus(vec![
            finished("a", "REPORT", "2024-01-15T10:00:00+0000", 2000),
            finished("b", "REPORT", "2024-01-15T10:00:01+0000", -1),
        ]);

        let err = analyze(&corpus, &TaskFilter::all(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[test]
    fn test_filtered_out_record_is_not_validated() {
        let corpus = corpus(vec![
            finished("a", "REPORT", "2024-01-15T10:00:00+0000", 2000),
            finished("b", "ISSUE_SYNC", "2024-01-15T10:00:01+0000", -1),
        ]);
        let filter = TaskFilter::from_expr("type=REPORT").unwrap();

        let report = analyze(&corpus, &filter, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.concurrency.eligible_tasks, 1);
    }

    #[test]
    fn test_empty_corpus_is_not_an_error() {
        let report = analyze(
            &TaskCorpus::default(),
            &TaskFilter::all(),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert!(report.concurrency.is_empty());
        assert_eq!(report.summary.total_tasks, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            top: 0,
            ..AnalysisConfig::default()
        };
        let err = analyze(&TaskCorpus::default(), &TaskFilter::all(), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
