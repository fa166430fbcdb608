use super::*;
use jc_core::{ChainId, JobId};

#[tokio::test]
async fn job_chain_completed_wakes_every_listener() {
    let adapter = InProcessNotifyAdapter::new();
    let chain_id = ChainId::new();
    let mut a = adapter.listen_job_chain_completed(chain_id).await;
    let mut b = adapter.listen_job_chain_completed(chain_id).await;

    adapter.notify_job_chain_completed(chain_id).await.unwrap();

    assert_eq!(a.recv().await, Some(()));
    assert_eq!(b.recv().await, Some(()));
}

#[tokio::test]
async fn job_ownership_lost_is_scoped_to_its_job_id() {
    let adapter = InProcessNotifyAdapter::new();
    let target = JobId::new();
    let other = JobId::new();
    let mut listener = adapter.listen_job_ownership_lost(target).await;

    adapter.notify_job_ownership_lost(other).await.unwrap();
    adapter.notify_job_ownership_lost(target).await.unwrap();

    assert_eq!(listener.recv().await, Some(()));
}

#[tokio::test]
async fn job_scheduled_delivers_to_exactly_one_listener() {
    let adapter = InProcessNotifyAdapter::new();
    let mut a = adapter.listen_job_scheduled("greet").await;
    let mut b = adapter.listen_job_scheduled("greet").await;

    adapter.notify_job_scheduled("greet", 1).await.unwrap();

    let a_got = tokio::time::timeout(std::time::Duration::from_millis(50), a.recv()).await.ok().flatten();
    let b_got = tokio::time::timeout(std::time::Duration::from_millis(50), b.recv()).await.ok().flatten();
    assert_eq!([a_got.is_some(), b_got.is_some()].iter().filter(|v| **v).count(), 1);
}

#[tokio::test]
async fn publishing_with_no_listeners_is_a_harmless_no_op() {
    let adapter = InProcessNotifyAdapter::new();
    adapter.notify_job_scheduled("greet", 1).await.unwrap();
    adapter.notify_job_chain_completed(ChainId::new()).await.unwrap();
    adapter.notify_job_ownership_lost(JobId::new()).await.unwrap();
}

#[tokio::test]
async fn disposing_a_subscription_removes_it_from_the_registry() {
    let adapter = InProcessNotifyAdapter::new();
    let chain_id = ChainId::new();
    let listener = adapter.listen_job_chain_completed(chain_id).await;
    listener.dispose();

    assert!(adapter.registry.lock().chain_completed.get(&chain_id).is_none());
}
