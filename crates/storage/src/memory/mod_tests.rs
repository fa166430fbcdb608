use super::*;
use crate::params::CreateJobParams;
use jc_core::{FakeClock, JobStatus};

#[tokio::test]
async fn successful_transaction_commits_to_the_shared_state() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    adapter
        .run_in_transaction(|tx| async move {
            jobs::create_job(&mut *tx.scratch.lock().await, 1_000_000, CreateJobParams::chain_head("greet", serde_json::Value::Null));
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(adapter.snapshot().await.job_count(), 1);
}

#[tokio::test]
async fn failed_transaction_leaves_committed_state_untouched() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let err: Result<(), ContractError> = adapter
        .run_in_transaction(|tx| async move {
            jobs::create_job(&mut *tx.scratch.lock().await, 1_000_000, CreateJobParams::chain_head("greet", serde_json::Value::Null));
            Err(ContractError::Transient("downstream write failed".into()))
        })
        .await;

    assert!(err.is_err());
    assert_eq!(adapter.snapshot().await.job_count(), 0);
}

#[tokio::test]
async fn operations_inside_a_transaction_see_each_others_writes() {
    let adapter = InMemoryStateAdapter::with_clock(FakeClock::new());
    let fetched_status = adapter
        .run_in_transaction(|tx| async move {
            let created = {
                let mut state = tx.scratch.lock().await;
                jobs::create_job(&mut state, 1_000_000, CreateJobParams::chain_head("greet", serde_json::Value::Null)).job
            };
            let fetched = jobs::get_job_for_update(&*tx.scratch.lock().await, created.id)?;
            Ok::<_, ContractError>(fetched.status)
        })
        .await
        .unwrap();

    assert_eq!(fetched_status, JobStatus::Pending);
    assert_eq!(adapter.snapshot().await.job_count(), 1);
}
