// Assessment Engine
//
// One assessment document per job (upsert by jobId) and append-only submissions.

use crate::domain::assessment::validate_sections;
use crate::domain::response::validate_responses;
use crate::domain::{
    Assessment, AssessmentResponse, Candidate, DomainError, Responses, Section,
};
use crate::error::{AppError, Result};
use crate::port::id_provider::prefixed;
use crate::port::{table, EntityStore, IdProvider, IndexQuery, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Body of `PUT assessments/{jobId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDraft {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Body of `POST assessments/{jobId}/submit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Submission {
    pub assessment_id: String,
    pub candidate_id: String,
    #[serde(default)]
    pub responses: Responses,
}

/// Result of an upsert; `created` is false when an existing document was merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub assessment: Assessment,
    pub created: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentFields<'a> {
    title: &'a str,
    sections: &'a [Section],
    updated_at: i64,
}

pub struct AssessmentEngine {
    store: Arc<dyn EntityStore>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl AssessmentEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// The job's assessment, or `None` when none was built yet.
    pub async fn get_by_job(&self, job_id: &str) -> Result<Option<Assessment>> {
        let found = table::<Assessment>(self.store.as_ref())
            .lookup(&IndexQuery::eq(job_id))
            .await?;
        Ok(found.into_iter().next())
    }

    pub async fn upsert_by_job(&self, job_id: &str, draft: AssessmentDraft) -> Result<Upserted> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(DomainError::MissingField("title").into());
        }
        validate_sections(&draft.sections)?;

        let assessments = table::<Assessment>(self.store.as_ref());
        let now = self.clock.now_millis();

        if let Some(existing) = self.get_by_job(job_id).await? {
            let fields = AssessmentFields {
                title,
                sections: &draft.sections,
                updated_at: now,
            };
            let assessment = assessments.update(&existing.id, &fields).await?;
            info!(assessment_id = %assessment.id, job_id = %job_id, "Assessment updated");
            return Ok(Upserted {
                assessment,
                created: false,
            });
        }

        let assessment = Assessment {
            id: prefixed(self.ids.as_ref(), "assessment"),
            job_id: job_id.to_string(),
            title: title.to_string(),
            sections: draft.sections,
            created_at: now,
            updated_at: now,
        };
        assessments.add(&assessment).await?;
        info!(assessment_id = %assessment.id, job_id = %job_id, "Assessment created");
        Ok(Upserted {
            assessment,
            created: true,
        })
    }

    /// Validate and store a submission against the job's current assessment.
    pub async fn submit(&self, job_id: &str, submission: Submission) -> Result<AssessmentResponse> {
        let assessment = self
            .get_by_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("assessment for job {}", job_id)))?;
        if assessment.id != submission.assessment_id {
            return Err(AppError::Validation(format!(
                "assessment {} does not belong to job {}",
                submission.assessment_id, job_id
            )));
        }
        table::<Candidate>(self.store.as_ref())
            .get_required(&submission.candidate_id)
            .await?;
        validate_responses(&assessment, &submission.responses)?;

        let response = AssessmentResponse {
            id: prefixed(self.ids.as_ref(), "response"),
            assessment_id: assessment.id,
            candidate_id: submission.candidate_id,
            responses: submission.responses,
            submitted_at: self.clock.now_millis(),
        };
        table::<AssessmentResponse>(self.store.as_ref())
            .add(&response)
            .await?;

        info!(
            response_id = %response.id,
            assessment_id = %response.assessment_id,
            candidate_id = %response.candidate_id,
            "Assessment submitted"
        );
        Ok(response)
    }

    /// Submissions for the job's assessment, oldest first.
    pub async fn responses(&self, job_id: &str) -> Result<Vec<AssessmentResponse>> {
        let Some(assessment) = self.get_by_job(job_id).await? else {
            return Ok(Vec::new());
        };
        table::<AssessmentResponse>(self.store.as_ref())
            .lookup(&IndexQuery::eq(assessment.id.as_str()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionValue, NewCandidate, Question, QuestionType, ResponseValue};
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::time_provider::mocks::ManualClock;
    use crate::port::MemoryEntityStore;
    use crate::ErrorKind;

    struct Fixture {
        engine: AssessmentEngine,
        store: Arc<MemoryEntityStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryEntityStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let engine = AssessmentEngine::new(
            store.clone(),
            Arc::new(SequentialIdProvider::new()),
            clock.clone(),
        );
        Fixture {
            engine,
            store,
            clock,
        }
    }

    fn draft(title: &str) -> AssessmentDraft {
        AssessmentDraft {
            title: title.into(),
            sections: vec![Section {
                id: "s1".into(),
                title: "Basics".into(),
                description: None,
                questions: vec![
                    Question::new("q1", QuestionType::SingleChoice, "Relocate?")
                        .required()
                        .with_options(["Yes", "No"]),
                    Question::new("q2", QuestionType::ShortText, "Where to?")
                        .required()
                        .shown_when("q1", ConditionValue::One("Yes".into())),
                ],
            }],
        }
    }

    async fn candidate(store: &MemoryEntityStore) -> Candidate {
        let candidate = Candidate::create(
            "candidate-1",
            0,
            NewCandidate {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                job_id: "job-1".into(),
                ..Default::default()
            },
        )
        .unwrap();
        table::<Candidate>(store).add(&candidate).await.unwrap();
        candidate
    }

    #[tokio::test]
    async fn test_missing_assessment_is_none() {
        let f = fixture();
        assert!(f.engine.get_by_job("job-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let f = fixture();
        let first = f.engine.upsert_by_job("job-1", draft("v1")).await.unwrap();
        assert!(first.created);
        assert_eq!(first.assessment.created_at, first.assessment.updated_at);

        f.clock.advance(500);
        let second = f.engine.upsert_by_job("job-1", draft("v2")).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.assessment.id, first.assessment.id);
        assert_eq!(second.assessment.title, "v2");
        assert_eq!(second.assessment.created_at, 1_000);
        assert_eq!(second.assessment.updated_at, 1_500);

        assert_eq!(table::<Assessment>(f.store.as_ref()).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_broken_tree() {
        let f = fixture();
        let mut bad = draft("v1");
        bad.sections[0].questions.reverse();
        let err = f.engine.upsert_by_job("job-1", bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_submit_validates_visible_required_answers() {
        let f = fixture();
        let candidate = candidate(&f.store).await;
        let assessment = f.engine.upsert_by_job("job-1", draft("v1")).await.unwrap().assessment;

        let mut responses = Responses::new();
        responses.insert("q1".into(), ResponseValue::Text("Yes".into()));
        let submission = Submission {
            assessment_id: assessment.id.clone(),
            candidate_id: candidate.id.clone(),
            responses,
        };
        let err = f.engine.submit("job-1", submission.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut fixed = submission;
        fixed
            .responses
            .insert("q2".into(), ResponseValue::Text("Lisbon".into()));
        let stored = f.engine.submit("job-1", fixed).await.unwrap();
        assert_eq!(stored.assessment_id, assessment.id);
        assert_eq!(f.engine.responses("job-1").await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn test_submit_checks_references() {
        let f = fixture();
        let candidate = candidate(&f.store).await;
        let submission = Submission {
            assessment_id: "assessment-9".into(),
            candidate_id: candidate.id.clone(),
            responses: Responses::new(),
        };
        let err = f.engine.submit("job-1", submission.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.engine.upsert_by_job("job-1", draft("v1")).await.unwrap();
        let err = f.engine.submit("job-1", submission).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
