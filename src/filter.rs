//! Task filtering for -e expressions
//!
//! Supports:
//! - Exact values: -e type=REPORT,ISSUE_SYNC
//! - Status classes: -e status=finished, -e status=active
//! - Regex match: -e project~^acme-
//!
//! Several expressions are ANDed; values inside one expression are ORed.

use crate::task_record::RawTask;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashSet;

/// Task attribute a filter expression tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Type,
    Status,
    Submitter,
    Branch,
    Project,
}

impl FilterField {
    fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "type" => Ok(Self::Type),
            "status" => Ok(Self::Status),
            "submitter" => Ok(Self::Submitter),
            "branch" => Ok(Self::Branch),
            "project" | "component" => Ok(Self::Project),
            other => bail!(
                "Unknown filter field: {}. Expected one of: type, status, submitter, branch, project",
                other
            ),
        }
    }

    fn value<'a>(&self, task: &'a RawTask) -> Option<&'a str> {
        match self {
            Self::Type => task.task_type.as_deref(),
            Self::Status => task.status.as_deref(),
            Self::Submitter => task.submitter_login.as_deref(),
            Self::Branch => task.branch_type.as_deref(),
            Self::Project => task.component_key.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    OneOf(HashSet<String>),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
struct Clause {
    field: FilterField,
    matcher: Matcher,
}

impl Clause {
    fn matches(&self, task: &RawTask) -> bool {
        let Some(value) = self.field.value(task) else {
            return false;
        };
        match &self.matcher {
            Matcher::OneOf(set) => set.contains(value),
            Matcher::Pattern(re) => re.is_match(value),
        }
    }
}

/// Filter that determines which tasks are analyzed
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    clauses: Vec<Clause>,
}

impl TaskFilter {
    /// Create a filter that includes all tasks
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from several expressions (ANDed)
    pub fn from_exprs<S: AsRef<str>>(exprs: &[S]) -> Result<Self> {
        let mut filter = Self::all();
        for expr in exprs {
            filter.clauses.push(Self::parse_clause(expr.as_ref())?);
        }
        Ok(filter)
    }

    /// Parse a single expression like "type=REPORT" or "project~^acme-"
    pub fn from_expr(expr: &str) -> Result<Self> {
        Self::from_exprs(&[expr])
    }

    fn parse_clause(expr: &str) -> Result<Clause> {
        // The first operator splits field from value; later ones belong to the value
        let Some(split) = expr.find(['=', '~']) else {
            bail!(
                "Invalid filter expression: {}. Expected format: FIELD=V1,V2 or FIELD~REGEX",
                expr
            );
        };
        let field = FilterField::parse(&expr[..split])?;
        let value = &expr[split + 1..];

        let matcher = if expr[split..].starts_with('=') {
            Matcher::OneOf(Self::expand_values(field, value))
        } else {
            let regex = Regex::new(value.trim())
                .with_context(|| format!("Invalid regex in filter expression: {}", expr))?;
            Matcher::Pattern(regex)
        };

        Ok(Clause { field, matcher })
    }

    fn expand_values(field: FilterField, list: &str) -> HashSet<String> {
        let mut values = HashSet::new();

        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match (field, part) {
                (FilterField::Status, "finished") => {
                    values.extend(["SUCCESS", "FAILED", "CANCELED"].iter().map(|s| s.to_string()));
                }
                (FilterField::Status, "active") => {
                    values.extend(["PENDING", "IN_PROGRESS"].iter().map(|s| s.to_string()));
                }
                _ => {
                    values.insert(part.to_string());
                }
            }
        }

        values
    }

    /// True when no expression was given
    pub fn is_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check if a task passes every expression
    pub fn matches(&self, task: &RawTask) -> bool {
        self.clauses.iter().all(|clause| clause.matches(task))
    }
}
