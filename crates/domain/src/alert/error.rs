use thiserror::Error;

use super::status::AlertStatus;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("illegal transition from '{from}' to '{to}'")]
    IllegalTransition { from: AlertStatus, to: AlertStatus },

    #[error("invalid severity: {0} (expected low|medium|high|critical or 1-10)")]
    InvalidSeverity(String),

    #[error("invalid alert id: {0}")]
    InvalidId(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("no alert IDs provided")]
    EmptyBatch,

    #[error("too many alert IDs: {count} exceeds the batch cap of {max}")]
    TooManyIds { count: usize, max: usize },

    #[error("no valid alert IDs in batch")]
    NoValidIds,

    /// Covers both a truly absent alert and one owned by another
    /// caller — the message must not reveal which.
    #[error("alert not found")]
    NotFound,

    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("query exceeded the {secs}s deadline; narrow the window and retry")]
    Timeout { secs: u64 },

    #[error("alert store write failed: {0}")]
    StoreFailed(String),

    #[error("alert store query failed: {0}")]
    QueryFailed(String),
}

impl AlertError {
    /// Whether this error is a client-side validation failure
    /// (never retried automatically, surfaced as a 4xx).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus(_)
                | Self::IllegalTransition { .. }
                | Self::InvalidSeverity(_)
                | Self::InvalidId(_)
                | Self::MissingField(_)
                | Self::EmptyBatch
                | Self::TooManyIds { .. }
                | Self::NoValidIds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_classification() {
        assert!(AlertError::EmptyBatch.is_validation());
        assert!(AlertError::TooManyIds { count: 101, max: 100 }.is_validation());
        assert!(
            AlertError::IllegalTransition {
                from: AlertStatus::Resolved,
                to: AlertStatus::Read,
            }
            .is_validation()
        );
        assert!(!AlertError::NotFound.is_validation());
        assert!(!AlertError::Timeout { secs: 30 }.is_validation());
        assert!(!AlertError::StoreFailed("disk full".into()).is_validation());
    }

    #[test]
    fn not_found_message_does_not_leak_ownership() {
        let msg = AlertError::NotFound.to_string();
        assert_eq!(msg, "alert not found");
    }

    #[test]
    fn timeout_message_suggests_narrowing() {
        let msg = AlertError::Timeout { secs: 30 }.to_string();
        assert!(msg.contains("narrow the window"));
    }
}
