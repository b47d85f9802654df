// Job creation and partial updates

use crate::domain::{Job, JobPatch, NewJob};
use crate::error::{AppError, Result};
use crate::port::id_provider::prefixed;
use crate::port::{table, EntityStore, IdProvider, TimeProvider};
use std::sync::Arc;
use tracing::info;

pub struct JobEngine {
    store: Arc<dyn EntityStore>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl JobEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// Create a job at the end of the order space (order = current job count).
    pub async fn create(&self, req: NewJob) -> Result<Job> {
        let jobs = table::<Job>(self.store.as_ref());
        let existing = jobs.all().await?;

        let job = Job::create(
            prefixed(self.ids.as_ref(), "job"),
            existing.len() as i64,
            self.clock.now_millis(),
            req,
        )?;
        ensure_unique_slug(&existing, &job.slug, None)?;

        jobs.add(&job).await?;
        info!(job_id = %job.id, order = job.order, slug = %job.slug, "Job created");
        Ok(job)
    }

    /// Merge a partial update. `order` is not patchable here.
    pub async fn update(&self, id: &str, mut patch: JobPatch) -> Result<Job> {
        patch.normalize()?;
        let jobs = table::<Job>(self.store.as_ref());

        if let Some(slug) = &patch.slug {
            ensure_unique_slug(&jobs.all().await?, slug, Some(id))?;
        }

        let job = jobs.update(id, &patch).await?;
        info!(job_id = %id, status = %job.status, "Job updated");
        Ok(job)
    }
}

fn ensure_unique_slug(jobs: &[Job], slug: &str, except: Option<&str>) -> Result<()> {
    let taken = jobs
        .iter()
        .any(|job| job.slug == slug && Some(job.id.as_str()) != except);
    if taken {
        return Err(AppError::DuplicateKey(format!("slug {}", slug)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::time_provider::mocks::ManualClock;
    use crate::port::MemoryEntityStore;
    use crate::ErrorKind;

    fn engine() -> JobEngine {
        JobEngine::new(
            Arc::new(MemoryEntityStore::new()),
            Arc::new(SequentialIdProvider::new()),
            Arc::new(ManualClock::new(1_000)),
        )
    }

    #[tokio::test]
    async fn test_create_appends_to_order_space() {
        let engine = engine();
        let a = engine.create(NewJob::titled("Job A")).await.unwrap();
        let b = engine.create(NewJob::titled("Job B")).await.unwrap();

        assert_eq!((a.id.as_str(), a.order), ("job-1", 0));
        assert_eq!((b.id.as_str(), b.order), ("job-2", 1));
        assert_eq!(b.created_at, 1_000);
    }

    #[tokio::test]
    async fn test_slug_collision_is_duplicate_key() {
        let engine = engine();
        engine.create(NewJob::titled("Backend Developer")).await.unwrap();

        let err = engine
            .create(NewJob::titled("Backend  Developer"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        let other = engine.create(NewJob::titled("QA")).await.unwrap();
        let patch = JobPatch {
            slug: Some("backend-developer".into()),
            ..Default::default()
        };
        let err = engine.update(&other.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let engine = engine();
        let job = engine.create(NewJob::titled("Designer")).await.unwrap();

        let mut patch = JobPatch::status(JobStatus::Archived);
        patch.tags = Some(vec!["Remote".into(), "Remote".into()]);
        let updated = engine.update(&job.id, patch).await.unwrap();

        assert_eq!(updated.title, "Designer");
        assert_eq!(updated.status, JobStatus::Archived);
        assert_eq!(updated.tags, vec!["Remote"]);
        assert_eq!(updated.order, 0);
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let err = engine()
            .update("job-404", JobPatch::status(JobStatus::Active))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
