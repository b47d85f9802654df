// Application Layer - Engines and the access façade

pub mod assessment;
pub mod facade;
pub mod jobs;
pub mod optimistic;
pub mod query;
pub mod reorder;
pub mod seed;
pub mod stage;

// Re-exports
pub use assessment::{AssessmentDraft, AssessmentEngine, Submission, Upserted};
pub use facade::{ApiRequest, ApiResponse, ReorderBody, ReorderOutcome, TalentApi};
pub use jobs::JobEngine;
pub use optimistic::{move_candidate_stage, move_job_in_page, OptimisticView};
pub use query::{CandidateQuery, JobQuery, JobSort, Page};
pub use reorder::{is_dense, plan_reorder, ReorderEngine, ReorderPlan};
pub use seed::{seed_database, SeedConfig, SeedReport};
pub use stage::StageEngine;
