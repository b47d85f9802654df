// Domain Layer - Pure business logic and entities

pub mod assessment;
pub mod candidate;
pub mod error;
pub mod job;
pub mod response;
pub mod timeline;

// Re-exports
pub use assessment::{
    is_visible, Assessment, AssessmentId, Condition, ConditionValue, Question, QuestionType,
    Section, Validation,
};
pub use candidate::{Candidate, CandidateId, CandidatePatch, NewCandidate, Stage};
pub use error::DomainError;
pub use job::{slugify, validate_slug, Job, JobId, JobPatch, JobStatus, NewJob};
pub use response::{AssessmentResponse, FileRef, ResponseValue, Responses};
pub use timeline::{stage_at, verify_chain, TimelineEvent};
