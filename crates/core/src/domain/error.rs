// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid slug '{0}': must be lowercase letters, digits and hyphens")]
    InvalidSlug(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown candidate stage: {0}")]
    UnknownStage(String),

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),

    #[error("Invalid assessment: {0}")]
    InvalidAssessment(String),

    #[error("Invalid response to {question_id}: {reason}")]
    InvalidResponse { question_id: String, reason: String },

    #[error("Broken timeline for {candidate_id}: {reason}")]
    BrokenTimeline { candidate_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
