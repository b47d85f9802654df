// Candidate Timeline (append-only stage history)

use crate::domain::candidate::{CandidateId, Stage};
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// One recorded stage transition.
///
/// `from_stage` is `None` only for the creation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub candidate_id: CandidateId,
    pub from_stage: Option<Stage>,
    pub to_stage: Stage,
    pub timestamp: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEvent {
    pub fn creation(
        id: impl Into<String>,
        candidate_id: impl Into<String>,
        stage: Stage,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            candidate_id: candidate_id.into(),
            from_stage: None,
            to_stage: stage,
            timestamp,
            note: None,
        }
    }

    pub fn transition(
        id: impl Into<String>,
        candidate_id: impl Into<String>,
        from: Stage,
        to: Stage,
        timestamp: i64,
        note: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            candidate_id: candidate_id.into(),
            from_stage: Some(from),
            to_stage: to,
            timestamp,
            note,
        }
    }

    pub fn is_creation(&self) -> bool {
        self.from_stage.is_none()
    }
}

/// Check the chain invariant over a candidate's events (ascending by timestamp):
/// event 0 is the creation event and every later event starts where the previous ended.
pub fn verify_chain(events: &[TimelineEvent]) -> Result<()> {
    let Some(first) = events.first() else {
        return Ok(());
    };
    let broken = |reason: String| DomainError::BrokenTimeline {
        candidate_id: first.candidate_id.clone(),
        reason,
    };

    if !first.is_creation() {
        return Err(broken("first event is not a creation event".to_string()));
    }
    for pair in events.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.timestamp < prev.timestamp {
            return Err(broken(format!("event {} precedes {}", next.id, prev.id)));
        }
        if next.from_stage != Some(prev.to_stage) {
            return Err(broken(format!(
                "event {} starts at {:?} but previous ended at {}",
                next.id, next.from_stage, prev.to_stage
            )));
        }
    }
    Ok(())
}

/// Reconstruct the stage a candidate was in at `instant` (`None` before creation).
pub fn stage_at(events: &[TimelineEvent], instant: i64) -> Option<Stage> {
    events
        .iter()
        .take_while(|event| event.timestamp <= instant)
        .last()
        .map(|event| event.to_stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<TimelineEvent> {
        vec![
            TimelineEvent::creation("t1", "c1", Stage::Applied, 100),
            TimelineEvent::transition("t2", "c1", Stage::Applied, Stage::Screen, 200, None),
            TimelineEvent::transition("t3", "c1", Stage::Screen, Stage::Rejected, 300, None),
        ]
    }

    #[test]
    fn test_verify_chain_accepts_linked_history() {
        assert!(verify_chain(&history()).is_ok());
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_verify_chain_detects_gap() {
        let mut events = history();
        events[2].from_stage = Some(Stage::Tech);
        assert!(matches!(
            verify_chain(&events),
            Err(DomainError::BrokenTimeline { .. })
        ));
    }

    #[test]
    fn test_verify_chain_requires_creation_first() {
        let events = history()[1..].to_vec();
        assert!(verify_chain(&events).is_err());
    }

    #[test]
    fn test_stage_at_reconstructs_history() {
        let events = history();
        assert_eq!(stage_at(&events, 50), None);
        assert_eq!(stage_at(&events, 100), Some(Stage::Applied));
        assert_eq!(stage_at(&events, 250), Some(Stage::Screen));
        assert_eq!(stage_at(&events, 10_000), Some(Stage::Rejected));
    }

    #[test]
    fn test_creation_event_serializes_null_from_stage() {
        let value = serde_json::to_value(TimelineEvent::creation("t1", "c1", Stage::Applied, 1))
            .unwrap();
        assert!(value["fromStage"].is_null());
        assert_eq!(value["toStage"], "applied");
    }
}
