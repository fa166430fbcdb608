use super::*;
use crate::adapter::StateAdapter;
use crate::memory::InMemoryStateAdapter;
use crate::params::CreateJobParams;
use jc_core::{FakeClock, ScheduleOptions, WorkerId};

fn greet_params() -> CreateJobParams {
    CreateJobParams::chain_head("greet", serde_json::json!({"name": "World"}))
}

#[tokio::test]
async fn create_job_assigns_chain_head_identity() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let result = adapter.create_job(None, greet_params()).await.unwrap();
    assert!(!result.deduplicated);
    assert!(result.job.is_chain_head());
    assert_eq!(result.job.chain_index, 0);
}

#[tokio::test]
async fn acquire_job_sets_running_and_increments_attempt() {
    let clock = FakeClock::new();
    let adapter = InMemoryStateAdapter::with_clock(clock);
    adapter.create_job(None, greet_params()).await.unwrap();

    let worker = WorkerId::new();
    let acquired = adapter.acquire_job(None, &["greet".to_string()], worker, 30_000).await.unwrap();
    let job = acquired.job.expect("one eligible job");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.leased_by, Some(worker));
    assert_eq!(job.attempt, 1);
    assert!(!acquired.has_more);
}

#[tokio::test]
async fn acquire_job_ignores_jobs_scheduled_in_the_future() {
    let clock = FakeClock::new();
    let adapter = InMemoryStateAdapter::with_clock(clock);
    let mut params = greet_params();
    params.schedule = ScheduleOptions::after(60_000);
    adapter.create_job(None, params).await.unwrap();

    let acquired = adapter.acquire_job(None, &["greet".to_string()], WorkerId::new(), 30_000).await.unwrap();
    assert!(acquired.job.is_none());
}

#[tokio::test]
async fn renew_job_lease_rejects_wrong_worker() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    adapter.create_job(None, greet_params()).await.unwrap();
    let owner = WorkerId::new();
    let acquired = adapter.acquire_job(None, &["greet".to_string()], owner, 30_000).await.unwrap();
    let job_id = acquired.job.unwrap().id;

    let intruder = WorkerId::new();
    let err = adapter.renew_job_lease(None, job_id, intruder, 30_000).await.unwrap_err();
    assert!(matches!(err, ContractError::JobTakenByAnotherWorker { .. }));
}

#[tokio::test]
async fn complete_job_is_write_once() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    adapter.create_job(None, greet_params()).await.unwrap();
    let owner = WorkerId::new();
    let acquired = adapter.acquire_job(None, &["greet".to_string()], owner, 30_000).await.unwrap();
    let job_id = acquired.job.unwrap().id;

    adapter.complete_job(None, job_id, serde_json::json!({"greeting": "Hello, World!"}), Some(owner)).await.unwrap();
    let err = adapter.complete_job(None, job_id, serde_json::Value::Null, Some(owner)).await.unwrap_err();
    assert!(matches!(err, ContractError::JobAlreadyCompleted { .. }));
}

#[tokio::test]
async fn remove_expired_job_lease_reaps_and_returns_to_pending() {
    let clock = FakeClock::new();
    let adapter = InMemoryStateAdapter::with_clock(clock.clone());
    adapter.create_job(None, greet_params()).await.unwrap();
    let owner = WorkerId::new();
    adapter.acquire_job(None, &["greet".to_string()], owner, 1_000).await.unwrap();

    clock.advance(std::time::Duration::from_secs(2));
    let reaped = adapter.remove_expired_job_lease(None, &["greet".to_string()], &[]).await.unwrap();
    let job = reaped.expect("lease expired");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.leased_by, None);
}

#[tokio::test]
async fn dedup_returns_existing_chain_head_within_window() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let mut params = greet_params();
    params.deduplication = Some(jc_core::DeduplicationOptions::new("k1"));
    let first = adapter.create_job(None, params.clone()).await.unwrap();
    let second = adapter.create_job(None, params).await.unwrap();

    assert!(!first.deduplicated);
    assert!(second.deduplicated);
    assert_eq!(first.job.id, second.job.id);
}
