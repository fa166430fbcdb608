use super::*;
use crate::adapter::StateAdapter;
use crate::memory::InMemoryStateAdapter;
use crate::params::CreateJobParams;
use jc_core::{FakeClock, WorkerId};

#[tokio::test]
async fn add_job_blockers_marks_job_blocked_while_chain_incomplete() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let target = adapter
        .create_job(None, CreateJobParams::chain_head("process-with-blockers", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    let blocker = adapter
        .create_job(None, CreateJobParams::chain_head("fetch-user", serde_json::Value::Null))
        .await
        .unwrap()
        .job;

    let result = adapter.add_job_blockers(None, target.id, vec![blocker.chain_id], vec![None]).await.unwrap();
    assert_eq!(result.job.status, JobStatus::Blocked);
    assert_eq!(result.incomplete_blocker_chain_ids, vec![blocker.chain_id]);
}

#[tokio::test]
async fn schedule_blocked_jobs_unblocks_once_all_blockers_clear() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let target = adapter
        .create_job(None, CreateJobParams::chain_head("process-with-blockers", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    let blocker_a =
        adapter.create_job(None, CreateJobParams::chain_head("fetch-user", serde_json::Value::Null)).await.unwrap().job;
    let blocker_b = adapter
        .create_job(None, CreateJobParams::chain_head("fetch-permissions", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    adapter
        .add_job_blockers(None, target.id, vec![blocker_a.chain_id, blocker_b.chain_id], vec![None, None])
        .await
        .unwrap();

    let worker = WorkerId::new();
    adapter.acquire_job(None, &["fetch-user".to_string()], worker, 30_000).await.unwrap();
    adapter.complete_job(None, blocker_a.id, serde_json::Value::Null, Some(worker)).await.unwrap();

    // Completing only one of two blockers must not unblock the target yet.
    let unblocked_a = adapter.schedule_blocked_jobs(None, blocker_a.chain_id).await.unwrap();
    assert!(unblocked_a.is_empty());
    let still_blocked = adapter.get_job_for_update(None, target.id).await.unwrap();
    assert_eq!(still_blocked.status, JobStatus::Blocked);

    adapter.acquire_job(None, &["fetch-permissions".to_string()], worker, 30_000).await.unwrap();
    adapter.complete_job(None, blocker_b.id, serde_json::Value::Null, Some(worker)).await.unwrap();

    let unblocked_b = adapter.schedule_blocked_jobs(None, blocker_b.chain_id).await.unwrap();
    assert_eq!(unblocked_b.len(), 1);
    assert_eq!(unblocked_b[0].job.id, target.id);
    let now_pending = adapter.get_job_for_update(None, target.id).await.unwrap();
    assert_eq!(now_pending.status, JobStatus::Pending);
}

#[tokio::test]
async fn unblocking_order_is_deterministic_by_job_id() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let blocker = adapter
        .create_job(None, CreateJobParams::chain_head("fetch-user", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    let a = adapter
        .create_job(None, CreateJobParams::chain_head("process-with-blockers", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    let b = adapter
        .create_job(None, CreateJobParams::chain_head("process-with-blockers", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    adapter.add_job_blockers(None, a.id, vec![blocker.chain_id], vec![None]).await.unwrap();
    adapter.add_job_blockers(None, b.id, vec![blocker.chain_id], vec![None]).await.unwrap();

    // Complete the blocker by acquiring then completing as the acquiring worker.
    let worker = WorkerId::new();
    adapter.acquire_job(None, &["fetch-user".to_string()], worker, 30_000).await.unwrap();
    adapter.complete_job(None, blocker.id, serde_json::Value::Null, Some(worker)).await.unwrap();

    let unblocked = adapter.schedule_blocked_jobs(None, blocker.chain_id).await.unwrap();
    let ids: Vec<_> = unblocked.iter().map(|u| u.job.id.as_str().to_string()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(unblocked.len(), 2);
}

#[tokio::test]
async fn get_external_blockers_reports_dependents_outside_the_deleted_set() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let blocker = adapter
        .create_job(None, CreateJobParams::chain_head("fetch-user", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    let dependent = adapter
        .create_job(None, CreateJobParams::chain_head("process-with-blockers", serde_json::Value::Null))
        .await
        .unwrap()
        .job;
    adapter.add_job_blockers(None, dependent.id, vec![blocker.chain_id], vec![None]).await.unwrap();

    let external = adapter.get_external_blockers(None, &[blocker.chain_id]).await.unwrap();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].job_id, dependent.id);
}
