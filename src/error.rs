//! Error types for report generation.

use thiserror::Error;

/// Failure from the backing data store.
///
/// The in-memory store never produces one, but the reports propagate it
/// unchanged so other store implementations can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("data store failure: {0}")]
pub struct StoreError(pub String);

/// Errors surfaced while generating a report.
///
/// Missing or malformed link-checker records are data-integrity conditions
/// from the upstream worker; they are reported with the resource and key
/// they concern instead of being papered over with zeros.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    /// No report is registered under the requested name.
    #[error("unknown report: {0}")]
    UnknownReport(String),

    /// A resource flagged broken has no record for a key the report needs.
    #[error("missing report data: resource {resource_id} has no {key} task status")]
    MissingTaskStatus {
        /// Resource the record should exist for.
        resource_id: String,
        /// Task-status key that was looked up.
        key: &'static str,
    },

    /// A task-status value could not be interpreted.
    #[error("malformed report data: resource {resource_id} has {key} value {value:?}")]
    MalformedTaskStatus {
        /// Resource the record belongs to.
        resource_id: String,
        /// Task-status key that was looked up.
        key: &'static str,
        /// The value as stored.
        value: String,
    },

    /// The data store failed; passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_resource() {
        let err = ReportError::MissingTaskStatus {
            resource_id: "res-9".to_string(),
            key: "openness_score_reason",
        };
        let msg = err.to_string();
        assert!(msg.contains("res-9"));
        assert!(msg.contains("openness_score_reason"));

        let err = ReportError::MalformedTaskStatus {
            resource_id: "res-9".to_string(),
            key: "error_code",
            value: "not-a-number".to_string(),
        };
        assert!(err.to_string().contains("not-a-number"));
    }

    #[test]
    fn test_store_error_passes_through() {
        let err: ReportError = StoreError("connection reset".to_string()).into();
        assert_eq!(err.to_string(), "data store failure: connection reset");
    }
}
