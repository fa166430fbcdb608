use super::*;

#[test]
fn chain_head_has_id_equal_to_chain_id() {
    let id = JobId::new();
    let job = Job::builder().id(id).chain_id(id).root_chain_id(id).build();
    assert!(job.is_chain_head());
    assert!(job.is_root_chain());
}

#[test]
fn continuation_is_not_a_chain_head() {
    let head_id = JobId::new();
    let job = Job::builder()
        .id(JobId::new())
        .chain_id(head_id)
        .root_chain_id(head_id)
        .chain_index(1)
        .build();
    assert!(!job.is_chain_head());
}

#[test]
fn legal_status_transitions() {
    use JobStatus::*;
    assert!(Blocked.can_transition_to(Pending));
    assert!(Pending.can_transition_to(Running));
    assert!(Running.can_transition_to(Pending));
    assert!(Running.can_transition_to(Completed));
}

#[test]
fn illegal_status_transitions() {
    use JobStatus::*;
    assert!(!Completed.can_transition_to(Pending));
    assert!(!Completed.can_transition_to(Running));
    assert!(!Pending.can_transition_to(Blocked));
    assert!(!Blocked.can_transition_to(Running));
    assert!(!Blocked.can_transition_to(Completed));
}

#[test]
fn chain_status_mirrors_current_job_status() {
    let head = Job::builder().status(JobStatus::Completed).build();
    let current = head.clone();
    let chain = JobChain::new(head, current, Vec::new());
    assert_eq!(chain.status, ChainStatus::Completed);
}

#[test]
fn job_new_assigns_chain_and_root_chain_to_self_when_absent() {
    let id = JobId::new();
    let config = JobConfig::builder("greet", "greet").build();
    let job = Job::new(config, id, 1_000);
    assert_eq!(job.chain_id, id);
    assert_eq!(job.root_chain_id, id);
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn job_new_continuation_keeps_supplied_chain_and_root() {
    let head_id = JobId::new();
    let root_id = JobId::new();
    let config = JobConfig::builder("order:process", "order:validate")
        .chain_id(head_id)
        .root_chain_id(root_id)
        .chain_index(1)
        .origin_id(head_id)
        .build();
    let job = Job::new(config, JobId::new(), 2_000);
    assert_eq!(job.chain_id, head_id);
    assert_eq!(job.root_chain_id, root_id);
    assert_eq!(job.chain_index, 1);
    assert_eq!(job.origin_id, Some(head_id));
}
