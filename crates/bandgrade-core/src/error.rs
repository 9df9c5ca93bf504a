//! Submission ingestion error types.
//!
//! The parsing and grading core never errors past its own boundary; the only
//! typed failures are on the ingestion edge, where raw submission payloads
//! enter the system.

use thiserror::Error;

/// Errors that can occur when decoding a submitted answer payload.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The payload was not valid JSON.
    #[error("submission is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload was valid JSON but not an object.
    #[error("submission must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A sectioned payload named a section that does not exist.
    #[error("unknown section '{0}' in sectioned submission")]
    UnknownSection(String),
}

impl SubmissionError {
    /// Returns `true` if the payload itself is unusable (as opposed to
    /// merely referencing an unknown section, which callers may tolerate).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SubmissionError::InvalidJson(_) | SubmissionError::NotAnObject(_)
        )
    }
}
