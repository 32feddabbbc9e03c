//! Fatal scheduler errors.
//!
//! Only caller contract violations abort a run. Events that cannot be placed
//! are reported as `Failed` assignments, never as errors.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that abort a scheduling run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The snapshot is malformed.
    #[error("Invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The run was cancelled at a wave checkpoint.
    #[error("Run cancelled after {completed_waves} completed wave(s)")]
    Cancelled { completed_waves: usize },
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_display() {
        let err = SchedulerError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate event ID: A"),
            ValidationError::new(
                ValidationErrorKind::InvalidDateRange,
                "Event 'B' is due before it starts",
            ),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid input: Duplicate event ID: A; Event 'B' is due before it starts"
        );

        let cancelled = SchedulerError::Cancelled { completed_waves: 2 };
        assert_eq!(cancelled.to_string(), "Run cancelled after 2 completed wave(s)");
    }
}
