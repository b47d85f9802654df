// Reorder Engine ("shift the gap")
//
// Moving a job from `from` to `to` shifts only the jobs strictly between the gap
// and the target, so the order space stays exactly 0..N-1.

use crate::domain::{Job, JobId};
use crate::error::{AppError, Result};
use crate::port::{table, EntityStore, IndexQuery, WriteBatch};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One job's order change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub job_id: JobId,
    pub from: i64,
    pub to: i64,
}

/// Every order change a move needs; the moved job comes last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    pub job_id: JobId,
    pub from_order: i64,
    pub to_order: i64,
    pub changes: Vec<OrderChange>,
}

impl ReorderPlan {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Ids of every job whose order changes
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|change| change.job_id.as_str())
    }

    pub fn to_batch(&self) -> Result<WriteBatch> {
        let mut batch = WriteBatch::new();
        for change in &self.changes {
            batch.update::<Job>(&change.job_id, &json!({ "order": change.to }))?;
        }
        Ok(batch)
    }
}

/// Inclusive order range of the jobs that shift, `None` for a no-op move.
pub fn affected_range(from: i64, to: i64) -> Option<(i64, i64)> {
    match from.cmp(&to) {
        std::cmp::Ordering::Less => Some((from + 1, to)),
        std::cmp::Ordering::Greater => Some((to, from - 1)),
        std::cmp::Ordering::Equal => None,
    }
}

/// Plan the move of `moved` to `to_order`.
///
/// `neighbours` may contain any jobs; only those inside the affected range shift
/// (down by one when moving later, up by one when moving earlier).
pub fn plan_reorder(moved: &Job, to_order: i64, neighbours: &[Job]) -> ReorderPlan {
    let from_order = moved.order;
    let mut changes = Vec::new();

    if let Some((lo, hi)) = affected_range(from_order, to_order) {
        let delta = if to_order > from_order { -1 } else { 1 };
        changes.extend(
            neighbours
                .iter()
                .filter(|job| job.id != moved.id && (lo..=hi).contains(&job.order))
                .map(|job| OrderChange {
                    job_id: job.id.clone(),
                    from: job.order,
                    to: job.order + delta,
                }),
        );
        changes.push(OrderChange {
            job_id: moved.id.clone(),
            from: from_order,
            to: to_order,
        });
    }

    ReorderPlan {
        job_id: moved.id.clone(),
        from_order,
        to_order,
        changes,
    }
}

/// True when `orders` is exactly `{0..N-1}` without duplicates.
pub fn is_dense(orders: impl IntoIterator<Item = i64>) -> bool {
    let mut count = 0usize;
    let mut seen = BTreeSet::new();
    for order in orders {
        count += 1;
        if order < 0 || !seen.insert(order) {
            return false;
        }
    }
    seen.last().map_or(true, |max| *max as usize + 1 == count)
}

pub struct ReorderEngine {
    store: Arc<dyn EntityStore>,
}

impl ReorderEngine {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Move a job to `to_order` as one atomic batch.
    ///
    /// The stored order is authoritative; a stale `from_hint` from the caller is
    /// logged and ignored. Out-of-range targets are rejected.
    pub async fn reorder(
        &self,
        job_id: &str,
        from_hint: Option<i64>,
        to_order: i64,
    ) -> Result<ReorderPlan> {
        let jobs = table::<Job>(self.store.as_ref());
        let moved = jobs.get_required(job_id).await?;
        let total = jobs.count().await? as i64;

        if to_order < 0 || to_order >= total {
            return Err(AppError::Validation(format!(
                "toOrder {} is outside 0..{}",
                to_order,
                total - 1
            )));
        }
        if let Some(hint) = from_hint {
            if hint != moved.order {
                warn!(
                    job_id = %job_id,
                    from_order = hint,
                    stored_order = moved.order,
                    "Stale fromOrder, using stored order"
                );
            }
        }

        let neighbours = match affected_range(moved.order, to_order) {
            Some((lo, hi)) => jobs.lookup(&IndexQuery::between(lo, hi)).await?,
            None => Vec::new(),
        };
        let plan = plan_reorder(&moved, to_order, &neighbours);

        if !plan.is_noop() {
            self.store.commit(plan.to_batch()?).await?;
            info!(
                job_id = %job_id,
                from_order = plan.from_order,
                to_order = plan.to_order,
                shifted = plan.changes.len() - 1,
                "Job reordered"
            );
        }
        Ok(plan)
    }
}
