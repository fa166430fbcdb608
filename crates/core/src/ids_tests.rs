use super::*;

#[test]
fn job_id_round_trips_through_string() {
    let id = JobId::new();
    assert!(id.as_str().starts_with("job-"));
    let parsed = JobId::from_string(id.as_str());
    assert_eq!(id, parsed);
}

#[test]
fn chain_id_is_job_id() {
    let head = JobId::new();
    let chain_id: ChainId = head;
    assert_eq!(head, chain_id);
}

#[test]
fn worker_id_prefix() {
    let id = WorkerId::new();
    assert!(id.as_str().starts_with("wkr-"));
}

#[test]
fn distinct_ids_are_not_equal() {
    assert_ne!(JobId::new(), JobId::new());
}
