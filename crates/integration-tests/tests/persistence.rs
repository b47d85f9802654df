//! Durability of the SQLite store across reopen

use std::path::PathBuf;
use std::sync::Arc;
use talentflow_core::application::{ReorderBody, TalentApi};
use talentflow_core::domain::{CandidatePatch, NewCandidate, NewJob, Stage};
use talentflow_core::port::{NoFaults, SystemTimeProvider, UuidProvider};
use talentflow_infra_sqlite::SqliteEntityStore;

fn temp_db(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("talentflow_{}_{}.db", name, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    path
}

async fn open(path: &PathBuf) -> TalentApi {
    let url = format!("sqlite://{}", path.display());
    let store = SqliteEntityStore::open(&url).await.unwrap();
    TalentApi::new(
        Arc::new(store),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        Arc::new(NoFaults),
    )
}

#[tokio::test]
async fn test_state_survives_restart() {
    let path = temp_db("restart");

    let (job_ids, candidate_id) = {
        let api = open(&path).await;
        let a = api.create_job(NewJob::titled("Alpha")).await.unwrap();
        let b = api.create_job(NewJob::titled("Beta")).await.unwrap();
        api.reorder_job(
            &b.id,
            ReorderBody {
                from_order: Some(1),
                to_order: 0,
            },
        )
        .await
        .unwrap();
        let candidate = api
            .create_candidate(NewCandidate {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                job_id: a.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        api.update_candidate(&candidate.id, CandidatePatch::stage(Stage::Tech))
            .await
            .unwrap();
        ((a.id, b.id), candidate.id)
    };

    let api = open(&path).await;
    let jobs = api.list_jobs(&Default::default()).await.unwrap().data;
    let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec![job_ids.1.as_str(), job_ids.0.as_str()]);

    let timeline = api.candidate_timeline(&candidate_id).await.unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[1].to_stage, Stage::Tech);

    let _ = std::fs::remove_file(&path);
}
