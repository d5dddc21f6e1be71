//! Error types.
//!
//! Every failure is a configuration or input failure surfaced before any
//! simulated time elapses. Once a run starts it always drains.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while configuring or starting a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The discipline identifier is not one of the five known disciplines.
    #[error("invalid policy: {0:?} (expected fcfs, sjf, srtn, hrrn or rr:<quantum>)")]
    InvalidPolicy(String),

    /// A workload or engine parameter is out of range.
    #[error("invalid workload parameter `{name}`: {reason}")]
    InvalidWorkloadParameter {
        /// Parameter name as it appears in the configuration.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A caller-supplied task list failed structural validation.
    #[error("invalid task set: {}", summarize(.0))]
    InvalidTaskSet(Vec<ValidationError>),
}

impl SimError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidWorkloadParameter {
            name,
            reason: reason.into(),
        }
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_parameter_message() {
        let err = SimError::parameter("quantum", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid workload parameter `quantum`: must be positive, got 0"
        );
    }

    #[test]
    fn test_task_set_message_joins_problems() {
        let err = SimError::InvalidTaskSet(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate task ID: 1"),
            ValidationError::new(
                ValidationErrorKind::NonPositiveServiceTime,
                "Task 2 has service time 0",
            ),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid task set: Duplicate task ID: 1; Task 2 has service time 0"
        );
    }
}
