//! Shared harness: the same scenarios run against both store adapters.

#![allow(dead_code)]

use std::sync::Arc;
use talentflow_core::application::TalentApi;
use talentflow_core::domain::{Job, NewJob};
use talentflow_core::port::id_provider::mocks::SequentialIdProvider;
use talentflow_core::port::time_provider::mocks::ManualClock;
use talentflow_core::port::{table, EntityStore, FaultPolicy, MemoryEntityStore, NoFaults};
use talentflow_infra_sqlite::SqliteEntityStore;

pub const T0: i64 = 1_700_000_000_000;

/// One fresh, empty store of each kind, labelled for assertion messages.
pub async fn stores() -> Vec<(&'static str, Arc<dyn EntityStore>)> {
    let sqlite = SqliteEntityStore::open("sqlite::memory:").await.unwrap();
    vec![
        ("memory", Arc::new(MemoryEntityStore::new())),
        ("sqlite", Arc::new(sqlite)),
    ]
}

pub fn api(store: Arc<dyn EntityStore>) -> TalentApi {
    api_with_faults(store, Arc::new(NoFaults))
}

/// Deterministic ids and a clock that ticks one second per read.
pub fn api_with_faults(store: Arc<dyn EntityStore>, faults: Arc<dyn FaultPolicy>) -> TalentApi {
    TalentApi::new(
        store,
        Arc::new(SequentialIdProvider::new()),
        Arc::new(ManualClock::stepping(T0, 1_000)),
        faults,
    )
}

pub async fn create_jobs(api: &TalentApi, count: usize) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(count);
    for i in 0..count {
        jobs.push(api.create_job(NewJob::titled(format!("Job {}", i))).await.unwrap());
    }
    jobs
}

/// Job ids sorted by their stored order.
pub async fn ids_by_order(store: &dyn EntityStore) -> Vec<String> {
    let mut jobs = table::<Job>(store).all().await.unwrap();
    jobs.sort_by_key(|job| job.order);
    jobs.into_iter().map(|job| job.id).collect()
}

pub async fn orders(store: &dyn EntityStore) -> Vec<i64> {
    table::<Job>(store)
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|job| job.order)
        .collect()
}
