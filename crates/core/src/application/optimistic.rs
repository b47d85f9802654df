// Caller-side optimistic updates
//
// The view shows the expected end state while a façade call is in flight and
// returns to the exact prior snapshot when the call fails.

use crate::application::reorder::plan_reorder;
use crate::domain::{Candidate, Job, Stage};
use crate::error::Result;
use std::future::Future;
use tracing::warn;

/// A locally cached view kept in step with the façade
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticView<V> {
    current: V,
}

impl<V: Clone> OptimisticView<V> {
    pub fn new(initial: V) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> &V {
        &self.current
    }

    pub fn into_inner(self) -> V {
        self.current
    }

    /// Replace the view with a fresh server read.
    pub fn refresh(&mut self, value: V) {
        self.current = value;
    }

    /// Apply `expect` immediately, then await `call`. On error the snapshot taken
    /// before `expect` is restored and the error is handed back unchanged.
    ///
    /// `call` must not have started yet; futures do nothing until awaited.
    pub async fn apply<T, F>(&mut self, expect: impl FnOnce(&mut V), call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.apply_and_reconcile(expect, call, |_, _| {}).await
    }

    /// Like [`apply`](Self::apply), and on success lets `reconcile` fold the
    /// server's answer into the view.
    pub async fn apply_and_reconcile<T, F>(
        &mut self,
        expect: impl FnOnce(&mut V),
        call: F,
        reconcile: impl FnOnce(&mut V, &T),
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let snapshot = self.current.clone();
        expect(&mut self.current);

        match call.await {
            Ok(value) => {
                reconcile(&mut self.current, &value);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Rolling back optimistic update");
                self.current = snapshot;
                Err(e)
            }
        }
    }
}

/// Expected effect of a reorder on a list of jobs sorted by order.
/// Returns false when the job is not part of the list.
pub fn move_job_in_page(jobs: &mut Vec<Job>, job_id: &str, to_order: i64) -> bool {
    let Some(moved) = jobs.iter().find(|job| job.id == job_id).cloned() else {
        return false;
    };
    for change in plan_reorder(&moved, to_order, jobs).changes {
        if let Some(job) = jobs.iter_mut().find(|job| job.id == change.job_id) {
            job.order = change.to;
        }
    }
    jobs.sort_by_key(|job| job.order);
    true
}

/// Expected effect of dropping a candidate card into another kanban column.
pub fn move_candidate_stage(candidates: &mut [Candidate], candidate_id: &str, stage: Stage) -> bool {
    match candidates.iter_mut().find(|c| c.id == candidate_id) {
        Some(candidate) => {
            candidate.stage = stage;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewCandidate, NewJob};
    use crate::error::AppError;

    fn jobs() -> Vec<Job> {
        (0..4)
            .map(|i| Job::create(format!("job-{}", i), i, 0, NewJob::titled(format!("J{}", i))).unwrap())
            .collect()
    }

    fn candidates() -> Vec<Candidate> {
        vec![Candidate::create(
            "candidate-1",
            0,
            NewCandidate {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                job_id: "job-1".into(),
                ..Default::default()
            },
        )
        .unwrap()]
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot_exactly() {
        let mut view = OptimisticView::new(candidates());
        let before = view.get().clone();

        let result: Result<()> = view
            .apply(
                |list| {
                    move_candidate_stage(list, "candidate-1", Stage::Offer);
                },
                async { Err(AppError::Transient("simulated".into())) },
            )
            .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(view.get(), &before);
    }

    #[tokio::test]
    async fn test_success_keeps_expected_state() {
        let mut view = OptimisticView::new(jobs());
        view.apply(
            |list| {
                move_job_in_page(list, "job-3", 0);
            },
            async { Ok(()) },
        )
        .await
        .unwrap();

        let ids: Vec<&str> = view.get().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-3", "job-0", "job-1", "job-2"]);
        let orders: Vec<i64> = view.get().iter().map(|j| j.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reconcile_folds_server_value() {
        let mut view = OptimisticView::new(candidates());
        let mut server = candidates()[0].clone();
        server.stage = Stage::Tech;
        server.notes = Some("from server".into());

        view.apply_and_reconcile(
            |list| {
                move_candidate_stage(list, "candidate-1", Stage::Tech);
            },
            async { Ok(server) },
            |list, saved: &Candidate| list[0] = saved.clone(),
        )
        .await
        .unwrap();
        assert_eq!(view.get()[0].notes.as_deref(), Some("from server"));
    }

    #[test]
    fn test_local_projections_ignore_unknown_ids() {
        let mut list = jobs();
        assert!(!move_job_in_page(&mut list, "job-9", 0));
        let mut people = candidates();
        assert!(!move_candidate_stage(&mut people, "candidate-9", Stage::Hired));
    }
}
