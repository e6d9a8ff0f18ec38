//! Page file loading
//!
//! The acquisition step writes one JSON document per API page
//! (`tasks_page_1.json`, `tasks_page_2.json`, ...). This module reads them
//! back from files or directories, concatenates their `tasks` arrays and
//! drops records whose id was already seen (overlapping pages).

use crate::task_record::TaskPage;
use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw task values assembled from one or more page files
#[derive(Debug, Clone, Default)]
pub struct TaskCorpus {
    /// De-duplicated task objects, in page order
    pub tasks: Vec<Value>,
    /// Number of page files read
    pub pages: usize,
    /// Records dropped because their id was already seen
    pub duplicates: usize,
    /// Largest `paging.total` announced by any page
    pub reported_total: Option<u64>,
}

impl TaskCorpus {
    /// Concatenate pages, keeping the first occurrence of each id
    ///
    /// Records without a string or numeric `id` (absent or `null`) are
    /// always kept.
    pub fn from_pages(pages: Vec<TaskPage>) -> Self {
        let mut corpus = Self {
            pages: pages.len(),
            ..Self::default()
        };
        let mut seen: HashSet<String> = HashSet::new();

        for page in pages {
            if let Some(paging) = page.paging.as_ref().filter(|p| p.total > 0) {
                corpus.reported_total = Some(corpus.reported_total.unwrap_or(0).max(paging.total));
            }

            for task in page.tasks {
                if let Some(id) = task.get("id").filter(|v| v.is_string() || v.is_number()) {
                    if !seen.insert(id.to_string()) {
                        tracing::debug!("dropping duplicate task {}", id);
                        corpus.duplicates += 1;
                        continue;
                    }
                }
                corpus.tasks.push(task);
            }
        }

        if let Some(total) = corpus.reported_total {
            if total != corpus.tasks.len() as u64 {
                tracing::warn!(
                    "paging reports {} tasks but {} unique tasks were loaded",
                    total,
                    corpus.tasks.len()
                );
            }
        }

        corpus
    }
}

/// Read a single page file
pub fn load_page_file<P: AsRef<Path>>(path: P) -> Result<TaskPage> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse page file {}", path.display()))
}

/// Expand files and directories into the ordered list of page files
///
/// Directory entries ending in `.json` are ordered by the last number in
/// their file name (`page_2` before `page_10`), then by name.
pub fn collect_page_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let number = Regex::new(r"(\d+)").context("Failed to compile page number pattern")?;
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        let mut entries = Vec::new();
        for entry in
            fs::read_dir(path).with_context(|| format!("Failed to list {}", path.display()))?
        {
            let entry =
                entry.with_context(|| format!("Failed to read entry in {}", path.display()))?;
            let file = entry.path();
            if file.is_file() && file.extension().is_some_and(|ext| ext == "json") {
                entries.push(file);
            }
        }

        entries.sort_by_cached_key(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let page = number
                .find_iter(&name)
                .last()
                .and_then(|m| m.as_str().parse::<u64>().ok());
            (page, name)
        });

        tracing::debug!("found {} page files in {}", entries.len(), path.display());
        files.extend(entries);
    }

    Ok(files)
}

/// Load every page file reachable from `paths`
pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<TaskCorpus> {
    let files = collect_page_files(paths)?;
    let pages = files
        .iter()
        .map(load_page_file)
        .collect::<Result<Vec<_>>>()?;

    let corpus = TaskCorpus::from_pages(pages);
    tracing::debug!(
        "loaded {} tasks from {} pages ({} duplicates dropped)",
        corpus.tasks.len(),
        corpus.pages,
        corpus.duplicates
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_record::Paging;
    use serde_json::json;

    fn page(ids: &[&str], total: u64) -> TaskPage {
        TaskPage {
            tasks: ids.iter().map(|id| json!({ "id": id })).collect(),
            paging: Some(Paging {
                page_index: 1,
                page_size: 100,
                total,
            }),
        }
    }

    #[test]
    fn test_pages_concatenated_in_order() {
        let corpus = TaskCorpus::from_pages(vec![page(&["a", "b"], 3), page(&["c"], 3)]);
        assert_eq!(corpus.pages, 2);
        assert_eq!(corpus.tasks.len(), 3);
        assert_eq!(corpus.tasks[2]["id"], "c");
        assert_eq!(corpus.reported_total, Some(3));
    }

    #[test]
    fn test_duplicates_dropped_first_wins() {
        let mut first = page(&["a"], 2);
        first.tasks[0]["status"] = json!("SUCCESS");
        let mut second = page(&["a", "b"], 2);
        second.tasks[0]["status"] = json!("FAILED");

        let corpus = TaskCorpus::from_pages(vec![first, second]);
        assert_eq!(corpus.tasks.len(), 2);
        assert_eq!(corpus.duplicates, 1);
        assert_eq!(corpus.tasks[0]["status"], "SUCCESS");
    }

    #[test]
    fn test_records_without_id_kept() {
        let corpus = TaskCorpus::from_pages(vec![TaskPage {
            tasks: vec![json!({"status": "PENDING"}), json!({"status": "PENDING"})],
            paging: None,
        }]);
        assert_eq!(corpus.tasks.len(), 2);
        assert_eq!(corpus.reported_total, None);
    }

    #[test]
    fn test_null_ids_kept() {
        let corpus = TaskCorpus::from_pages(vec![TaskPage {
            tasks: vec![
                json!({"id": null, "status": "SUCCESS"}),
                json!({"id": null, "status": "SUCCESS"}),
            ],
            paging: None,
        }]);
        assert_eq!(corpus.tasks.len(), 2);
        assert_eq!(corpus.duplicates, 0);
    }

    #[test]
    fn test_string_and_numeric_ids_distinct() {
        let corpus = TaskCorpus::from_pages(vec![TaskPage {
            tasks: vec![json!({"id": "1"}), json!({"id": 1})],
            paging: None,
        }]);
        assert_eq!(corpus.duplicates, 0);
    }

    #[test]
    fn test_directory_pages_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, id) in [
            ("tasks_page_10.json", "j"),
            ("tasks_page_2.json", "b"),
            ("tasks_page_1.json", "a"),
        ] {
            let body = json!({ "tasks": [{ "id": id }], "paging": { "total": 3 } });
            fs::write(dir.path().join(name), body.to_string()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let corpus = load_paths(&[dir.path()]).unwrap();
        let ids: Vec<_> = corpus.tasks.iter().map(|t| t["id"].clone()).collect();
        assert_eq!(ids, vec![json!("a"), json!("b"), json!("j")]);
    }

    #[test]
    fn test_directory_listing_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("archive.json")).unwrap();
        let body = json!({ "tasks": [{ "id": "a" }] });
        fs::write(dir.path().join("tasks_page_1.json"), body.to_string()).unwrap();

        let files = collect_page_files(&[dir.path()]).unwrap();
        assert_eq!(files, vec![dir.path().join("tasks_page_1.json")]);
    }

    #[test]
    fn test_invalid_page_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_paths(&[&path]).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_paths(&["/nonexistent/page.json"]).is_err());
    }
}
