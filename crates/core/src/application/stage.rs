// Stage Transition Engine
//
// The only writer of timeline history. Every stage change is committed together
// with its timeline event, so the candidate's stage always equals the `toStage`
// of its latest event.

use crate::domain::{Candidate, CandidatePatch, NewCandidate, Stage, TimelineEvent};
use crate::error::Result;
use crate::port::id_provider::prefixed;
use crate::port::{table, EntityStore, IdProvider, IndexQuery, TimeProvider, WriteBatch};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// `(from, to)` when applying `patch` changes the candidate's stage.
pub fn planned_transition(current: &Candidate, patch: &CandidatePatch) -> Option<(Stage, Stage)> {
    match patch.stage {
        Some(next) if next != current.stage => Some((current.stage, next)),
        _ => None,
    }
}

pub struct StageEngine {
    store: Arc<dyn EntityStore>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl StageEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// Create a candidate together with its creation event.
    pub async fn create_candidate(&self, req: NewCandidate) -> Result<Candidate> {
        let now = self.clock.now_millis();
        let candidate = Candidate::create(prefixed(self.ids.as_ref(), "candidate"), now, req)?;
        let event = TimelineEvent::creation(
            prefixed(self.ids.as_ref(), "timeline"),
            &candidate.id,
            candidate.stage,
            now,
        );

        let mut batch = WriteBatch::new();
        batch.add(&candidate)?.add(&event)?;
        self.store.commit(batch).await?;

        info!(candidate_id = %candidate.id, to_stage = %candidate.stage, "Candidate created");
        Ok(candidate)
    }

    /// Merge a partial update; a changed stage appends one timeline event.
    ///
    /// Setting the current stage again is a no-op for the timeline.
    pub async fn update_candidate(&self, id: &str, mut patch: CandidatePatch) -> Result<Candidate> {
        patch.normalize()?;
        let candidates = table::<Candidate>(self.store.as_ref());
        let current = candidates.get_required(id).await?;

        let mut batch = WriteBatch::new();
        let transition = planned_transition(&current, &patch);
        if let Some((from, to)) = transition {
            let event = TimelineEvent::transition(
                prefixed(self.ids.as_ref(), "timeline"),
                id,
                from,
                to,
                self.clock.now_millis(),
                patch.note.clone(),
            );
            batch.add(&event)?;
        }

        let has_fields = !matches!(serde_json::to_value(&patch)?, Value::Object(ref m) if m.is_empty());
        if has_fields {
            batch.update::<Candidate>(id, &patch)?;
        }

        if batch.is_empty() {
            debug!(candidate_id = %id, "Empty candidate update");
            return Ok(current);
        }
        self.store.commit(batch).await?;

        match transition {
            Some((from, to)) => info!(
                candidate_id = %id,
                from_stage = %from,
                to_stage = %to,
                "Candidate stage changed"
            ),
            None => info!(candidate_id = %id, "Candidate updated"),
        }
        candidates.get_required(id).await
    }

    pub async fn change_stage(&self, id: &str, stage: Stage, note: Option<String>) -> Result<Candidate> {
        let mut patch = CandidatePatch::stage(stage);
        patch.note = note;
        self.update_candidate(id, patch).await
    }

    /// Events ascending by timestamp (ties in insertion order). Unknown ids yield an empty list.
    pub async fn timeline(&self, candidate_id: &str) -> Result<Vec<TimelineEvent>> {
        let mut events = table::<TimelineEvent>(self.store.as_ref())
            .lookup(&IndexQuery::eq(candidate_id))
            .await?;
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }
}
