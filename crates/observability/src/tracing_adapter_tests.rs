use super::*;
use jc_core::JobId;

#[tokio::test]
async fn record_event_does_not_panic_for_every_variant() {
    let adapter = TracingObservabilityAdapter::new();
    let job_id = JobId::new();
    adapter.record_event(LifecycleEvent::JobCompleted { job_id }).await;
    adapter.record_event(LifecycleEvent::JobAttemptFailed { job_id, error: "boom".into() }).await;
    adapter.record_duration(DurationMetric::Attempt, "greet", 12).await;
    adapter.record_idle("greet", 5).await;
}

#[test]
fn event_names_match_spec_vocabulary() {
    let job_id = JobId::new();
    assert_eq!(LifecycleEvent::JobCompleted { job_id }.name(), "job_completed");
    assert_eq!(LifecycleEvent::JobReaped { job_id }.name(), "job_reaped");
    assert_eq!(DurationMetric::Chain.name(), "chain_duration_ms");
}
