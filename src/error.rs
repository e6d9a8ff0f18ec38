//! Error types for task normalization and analysis
//!
//! Malformed records abort the run; nothing is skipped silently.

use thiserror::Error;

/// A task record that cannot be turned into a `TaskRecord`
///
/// Every variant carries the position of the record in the concatenated
/// input and its id (or `<unknown>`) so the operator can find it in the
/// page files.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task #{index} ({id}): malformed record: {message}")]
    WrongType {
        index: usize,
        id: String,
        message: String,
    },

    #[error("task #{index} ({id}): missing required field `{field}`")]
    MissingField {
        index: usize,
        id: String,
        field: &'static str,
    },

    #[error("task #{index} ({id}): negative executionTimeMs {value}")]
    NegativeDuration { index: usize, id: String, value: i64 },

    #[error("task #{index} ({id}): executionTimeMs {value} ends outside the representable time range")]
    DurationOutOfRange { index: usize, id: String, value: i64 },

    #[error("task #{index} ({id}): field `{field}` is not a valid timestamp: {value:?}")]
    InvalidTimestamp {
        index: usize,
        id: String,
        field: &'static str,
        value: String,
    },
}

impl ValidationError {
    /// Position of the offending record in the input
    pub fn index(&self) -> usize {
        match self {
            Self::WrongType { index, .. }
            | Self::MissingField { index, .. }
            | Self::NegativeDuration { index, .. }
            | Self::DurationOutOfRange { index, .. }
            | Self::InvalidTimestamp { index, .. } => *index,
        }
    }
}

/// Errors for a complete analysis run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message_names_record() {
        let err = ValidationError::NegativeDuration {
            index: 7,
            id: "AYx1".to_string(),
            value: -5,
        };
        let msg = err.to_string();
        assert!(msg.contains("#7"));
        assert!(msg.contains("AYx1"));
        assert!(msg.contains("-5"));
    }

    #[test]
    fn test_validation_error_index() {
        let err = ValidationError::MissingField {
            index: 3,
            id: "<unknown>".to_string(),
            field: "submittedAt",
        };
        assert_eq!(err.index(), 3);
    }

    #[test]
    fn test_analysis_error_wraps_validation_transparently() {
        let inner = ValidationError::InvalidTimestamp {
            index: 0,
            id: "t1".to_string(),
            field: "startedAt",
            value: "yesterday".to_string(),
        };
        let expected = inner.to_string();
        let err: AnalysisError = inner.into();
        assert_eq!(err.to_string(), expected);
    }
}
