// Access Façade
//
// Every call: plan faults, sleep the planned latency, fail before dispatch if the
// plan says so, then run the engine under the writer lock. Engines never yield to
// another request mid-operation.

pub mod request;

pub use request::{routes, ApiRequest, ApiResponse, ReorderBody};

use crate::application::assessment::{AssessmentDraft, AssessmentEngine, Submission, Upserted};
use crate::application::jobs::JobEngine;
use crate::application::query::{query_candidates, query_jobs, CandidateQuery, JobQuery, Page};
use crate::application::reorder::ReorderEngine;
use crate::application::stage::StageEngine;
use crate::domain::{
    Assessment, AssessmentResponse, Candidate, CandidatePatch, Job, JobPatch, NewCandidate,
    NewJob, TimelineEvent,
};
use crate::error::{AppError, Result};
use crate::port::{table, EntityStore, FaultPolicy, IdProvider, IndexQuery, Operation, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Result of `PATCH jobs/{id}/reorder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    pub success: bool,
}

pub struct TalentApi {
    store: Arc<dyn EntityStore>,
    faults: Arc<dyn FaultPolicy>,
    jobs: JobEngine,
    reorder: ReorderEngine,
    stages: StageEngine,
    assessments: AssessmentEngine,
    writer: Mutex<()>,
}

impl TalentApi {
    pub fn new(
        store: Arc<dyn EntityStore>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
        faults: Arc<dyn FaultPolicy>,
    ) -> Self {
        Self {
            jobs: JobEngine::new(store.clone(), ids.clone(), clock.clone()),
            reorder: ReorderEngine::new(store.clone()),
            stages: StageEngine::new(store.clone(), ids.clone(), clock.clone()),
            assessments: AssessmentEngine::new(store.clone(), ids, clock),
            store,
            faults,
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    // Latency, then the injected coin flip, then exclusive access. Nothing is
    // mutated before this returns Ok.
    async fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, ()>> {
        let plan = self.faults.plan(&operation);
        debug!(
            verb = %operation.verb,
            resource = operation.resource,
            delay_ms = plan.delay.as_millis() as u64,
            "Request"
        );
        if !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }
        if plan.fail {
            warn!(verb = %operation.verb, resource = operation.resource, "Injected failure");
            return Err(AppError::Transient(format!(
                "simulated network error on {}",
                operation
            )));
        }
        Ok(self.writer.lock().await)
    }

    pub async fn list_jobs(&self, query: &JobQuery) -> Result<Page<Job>> {
        let _guard = self.enter(routes::LIST_JOBS).await?;
        let jobs = table::<Job>(self.store.as_ref()).all().await?;
        query_jobs(jobs, query)
    }

    pub async fn create_job(&self, req: NewJob) -> Result<Job> {
        let _guard = self.enter(routes::CREATE_JOB).await?;
        self.jobs.create(req).await
    }

    pub async fn update_job(&self, id: &str, patch: JobPatch) -> Result<Job> {
        let _guard = self.enter(routes::UPDATE_JOB).await?;
        self.jobs.update(id, patch).await
    }

    pub async fn reorder_job(&self, id: &str, body: ReorderBody) -> Result<ReorderOutcome> {
        let _guard = self.enter(routes::REORDER_JOB).await?;
        self.reorder.reorder(id, body.from_order, body.to_order).await?;
        Ok(ReorderOutcome { success: true })
    }

    /// Candidates newest first. A stage filter is served from the stage index.
    pub async fn list_candidates(&self, query: &CandidateQuery) -> Result<Page<Candidate>> {
        let _guard = self.enter(routes::LIST_CANDIDATES).await?;
        let candidates = table::<Candidate>(self.store.as_ref());
        let snapshot = match query.stage {
            Some(stage) => candidates.lookup(&IndexQuery::eq(stage.as_str())).await?,
            None => candidates.all().await?,
        };
        query_candidates(snapshot, query)
    }

    pub async fn create_candidate(&self, req: NewCandidate) -> Result<Candidate> {
        let _guard = self.enter(routes::CREATE_CANDIDATE).await?;
        self.stages.create_candidate(req).await
    }

    pub async fn update_candidate(&self, id: &str, patch: CandidatePatch) -> Result<Candidate> {
        let _guard = self.enter(routes::UPDATE_CANDIDATE).await?;
        self.stages.update_candidate(id, patch).await
    }

    pub async fn candidate_timeline(&self, id: &str) -> Result<Vec<TimelineEvent>> {
        let _guard = self.enter(routes::CANDIDATE_TIMELINE).await?;
        self.stages.timeline(id).await
    }

    pub async fn get_assessment(&self, job_id: &str) -> Result<Option<Assessment>> {
        let _guard = self.enter(routes::GET_ASSESSMENT).await?;
        self.assessments.get_by_job(job_id).await
    }

    pub async fn put_assessment(&self, job_id: &str, draft: AssessmentDraft) -> Result<Upserted> {
        let _guard = self.enter(routes::PUT_ASSESSMENT).await?;
        self.assessments.upsert_by_job(job_id, draft).await
    }

    pub async fn submit_assessment(
        &self,
        job_id: &str,
        submission: Submission,
    ) -> Result<AssessmentResponse> {
        let _guard = self.enter(routes::SUBMIT_ASSESSMENT).await?;
        self.assessments.submit(job_id, submission).await
    }

    pub async fn assessment_responses(&self, job_id: &str) -> Result<Vec<AssessmentResponse>> {
        let _guard = self.enter(routes::LIST_RESPONSES).await?;
        self.assessments.responses(job_id).await
    }

    /// Execute a routed request; creations answer 201.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(route = %request.operation(), "Dispatching");
        match request {
            ApiRequest::ListJobs(query) => ApiResponse::ok(self.list_jobs(&query).await?),
            ApiRequest::CreateJob(req) => ApiResponse::created(self.create_job(req).await?),
            ApiRequest::UpdateJob { id, patch } => {
                ApiResponse::ok(self.update_job(&id, patch).await?)
            }
            ApiRequest::ReorderJob { id, body } => {
                ApiResponse::ok(self.reorder_job(&id, body).await?)
            }
            ApiRequest::ListCandidates(query) => {
                ApiResponse::ok(self.list_candidates(&query).await?)
            }
            ApiRequest::CreateCandidate(req) => {
                ApiResponse::created(self.create_candidate(req).await?)
            }
            ApiRequest::UpdateCandidate { id, patch } => {
                ApiResponse::ok(self.update_candidate(&id, patch).await?)
            }
            ApiRequest::CandidateTimeline { id } => {
                ApiResponse::ok(self.candidate_timeline(&id).await?)
            }
            ApiRequest::GetAssessment { job_id } => {
                ApiResponse::ok(self.get_assessment(&job_id).await?)
            }
            ApiRequest::PutAssessment { job_id, draft } => {
                let upserted = self.put_assessment(&job_id, draft).await?;
                if upserted.created {
                    ApiResponse::created(upserted.assessment)
                } else {
                    ApiResponse::ok(upserted.assessment)
                }
            }
            ApiRequest::SubmitAssessment { job_id, submission } => {
                ApiResponse::created(self.submit_assessment(&job_id, submission).await?)
            }
            ApiRequest::ListResponses { job_id } => {
                ApiResponse::ok(self.assessment_responses(&job_id).await?)
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch), with errors rendered as error responses.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => ApiResponse::from_error(&e),
        }
    }
}
