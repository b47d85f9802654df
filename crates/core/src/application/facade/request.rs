// Request-shaped boundary: verb + resource path + query string + JSON body

use crate::application::assessment::{AssessmentDraft, Submission};
use crate::application::query::{
    CandidateQuery, JobQuery, JobSort, DEFAULT_CANDIDATE_PAGE_SIZE, DEFAULT_JOB_PAGE_SIZE,
};
use crate::domain::{CandidatePatch, JobPatch, JobStatus, NewCandidate, NewJob, Stage};
use crate::error::{AppError, Result};
use crate::port::{Operation, Verb};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `PATCH jobs/{id}/reorder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderBody {
    /// Caller's view of the current order; the stored order wins on mismatch
    #[serde(default)]
    pub from_order: Option<i64>,
    pub to_order: i64,
}

/// Every call the façade accepts
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    ListJobs(JobQuery),
    CreateJob(NewJob),
    UpdateJob { id: String, patch: JobPatch },
    ReorderJob { id: String, body: ReorderBody },
    ListCandidates(CandidateQuery),
    CreateCandidate(NewCandidate),
    UpdateCandidate { id: String, patch: CandidatePatch },
    CandidateTimeline { id: String },
    GetAssessment { job_id: String },
    PutAssessment { job_id: String, draft: AssessmentDraft },
    SubmitAssessment { job_id: String, submission: Submission },
    ListResponses { job_id: String },
}

/// Verb and route template of every call, shared by fault planning and logging
pub mod routes {
    use crate::port::{Operation, Verb};

    pub const LIST_JOBS: Operation = Operation::new(Verb::Get, "jobs");
    pub const CREATE_JOB: Operation = Operation::new(Verb::Post, "jobs");
    pub const UPDATE_JOB: Operation = Operation::new(Verb::Patch, "jobs/{id}");
    pub const REORDER_JOB: Operation = Operation::new(Verb::Patch, "jobs/{id}/reorder");
    pub const LIST_CANDIDATES: Operation = Operation::new(Verb::Get, "candidates");
    pub const CREATE_CANDIDATE: Operation = Operation::new(Verb::Post, "candidates");
    pub const UPDATE_CANDIDATE: Operation = Operation::new(Verb::Patch, "candidates/{id}");
    pub const CANDIDATE_TIMELINE: Operation =
        Operation::new(Verb::Get, "candidates/{id}/timeline");
    pub const GET_ASSESSMENT: Operation = Operation::new(Verb::Get, "assessments/{jobId}");
    pub const PUT_ASSESSMENT: Operation = Operation::new(Verb::Put, "assessments/{jobId}");
    pub const SUBMIT_ASSESSMENT: Operation =
        Operation::new(Verb::Post, "assessments/{jobId}/submit");
    pub const LIST_RESPONSES: Operation =
        Operation::new(Verb::Get, "assessments/{jobId}/responses");
}

impl ApiRequest {
    pub fn operation(&self) -> Operation {
        match self {
            ApiRequest::ListJobs(_) => routes::LIST_JOBS,
            ApiRequest::CreateJob(_) => routes::CREATE_JOB,
            ApiRequest::UpdateJob { .. } => routes::UPDATE_JOB,
            ApiRequest::ReorderJob { .. } => routes::REORDER_JOB,
            ApiRequest::ListCandidates(_) => routes::LIST_CANDIDATES,
            ApiRequest::CreateCandidate(_) => routes::CREATE_CANDIDATE,
            ApiRequest::UpdateCandidate { .. } => routes::UPDATE_CANDIDATE,
            ApiRequest::CandidateTimeline { .. } => routes::CANDIDATE_TIMELINE,
            ApiRequest::GetAssessment { .. } => routes::GET_ASSESSMENT,
            ApiRequest::PutAssessment { .. } => routes::PUT_ASSESSMENT,
            ApiRequest::SubmitAssessment { .. } => routes::SUBMIT_ASSESSMENT,
            ApiRequest::ListResponses { .. } => routes::LIST_RESPONSES,
        }
    }

    /// Parse a raw request. `path` may carry a leading `/` or `/api/` prefix.
    pub fn route(verb: Verb, path: &str, query: &str, body: Option<Value>) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        let trimmed = trimmed.strip_prefix("api/").unwrap_or(trimmed);
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        let request = match (verb, segments.as_slice()) {
            (Verb::Get, ["jobs"]) => ApiRequest::ListJobs(parse_job_query(query)?),
            (Verb::Post, ["jobs"]) => ApiRequest::CreateJob(parse_body(body)?),
            (Verb::Patch, ["jobs", id]) => ApiRequest::UpdateJob {
                id: id.to_string(),
                patch: parse_body(body)?,
            },
            (Verb::Patch, ["jobs", id, "reorder"]) => ApiRequest::ReorderJob {
                id: id.to_string(),
                body: parse_body(body)?,
            },
            (Verb::Get, ["candidates"]) => {
                ApiRequest::ListCandidates(parse_candidate_query(query)?)
            }
            (Verb::Post, ["candidates"]) => ApiRequest::CreateCandidate(parse_body(body)?),
            (Verb::Patch, ["candidates", id]) => ApiRequest::UpdateCandidate {
                id: id.to_string(),
                patch: parse_body(body)?,
            },
            (Verb::Get, ["candidates", id, "timeline"]) => ApiRequest::CandidateTimeline {
                id: id.to_string(),
            },
            (Verb::Get, ["assessments", job_id]) => ApiRequest::GetAssessment {
                job_id: job_id.to_string(),
            },
            (Verb::Put, ["assessments", job_id]) => ApiRequest::PutAssessment {
                job_id: job_id.to_string(),
                draft: parse_body(body)?,
            },
            (Verb::Post, ["assessments", job_id, "submit"]) => ApiRequest::SubmitAssessment {
                job_id: job_id.to_string(),
                submission: parse_body(body)?,
            },
            (Verb::Get, ["assessments", job_id, "responses"]) => ApiRequest::ListResponses {
                job_id: job_id.to_string(),
            },
            _ => {
                return Err(AppError::Validation(format!(
                    "no route for {} /{}",
                    verb, trimmed
                )))
            }
        };
        Ok(request)
    }
}

/// Response of [`TalentApi::dispatch`](super::TalentApi::dispatch)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: impl Serialize) -> Result<Self> {
        Self::with_status(200, body)
    }

    pub fn created(body: impl Serialize) -> Result<Self> {
        Self::with_status(201, body)
    }

    fn with_status(status: u16, body: impl Serialize) -> Result<Self> {
        Ok(Self {
            status,
            body: serde_json::to_value(body)?,
        })
    }

    /// Error body `{ "error": ..., "kind": ... }` with the matching status
    pub fn from_error(error: &AppError) -> Self {
        Self {
            status: error.status(),
            body: json!({
                "error": error.to_string(),
                "kind": format!("{:?}", error.kind()),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn parse_body<T: DeserializeOwned>(body: Option<Value>) -> Result<T> {
    let body = body.ok_or_else(|| AppError::Validation("request body is required".to_string()))?;
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("malformed body: {}", e)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobParams {
    search: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateParams {
    search: Option<String>,
    stage: Option<String>,
    job_id: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

fn parse_params<T: DeserializeOwned>(query: &str) -> Result<T> {
    serde_urlencoded::from_str(query.trim_start_matches('?'))
        .map_err(|e| AppError::Validation(format!("malformed query string: {}", e)))
}

// Empty parameters count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_job_query(query: &str) -> Result<JobQuery> {
    let params: JobParams = parse_params(query)?;
    Ok(JobQuery {
        search: present(params.search),
        status: present(params.status)
            .map(|s| s.parse::<JobStatus>())
            .transpose()?,
        sort: present(params.sort)
            .map(|s| s.parse::<JobSort>())
            .transpose()?
            .unwrap_or_default(),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(DEFAULT_JOB_PAGE_SIZE),
    })
}

pub fn parse_candidate_query(query: &str) -> Result<CandidateQuery> {
    let params: CandidateParams = parse_params(query)?;
    Ok(CandidateQuery {
        search: present(params.search),
        stage: present(params.stage).map(|s| s.parse::<Stage>()).transpose()?,
        job_id: present(params.job_id),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(DEFAULT_CANDIDATE_PAGE_SIZE),
    })
}
