// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle event names and duration metrics named in spec §6.

use jc_core::{ChainId, JobId, WorkerId};

/// One occurrence of a named lifecycle event. Variant names match spec
/// §6's list verbatim so a log search for `job_attempt_lease_expired`
/// finds exactly the call site that fires it.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    JobChainCreated { chain_id: ChainId, type_name: String },
    JobCreated { job_id: JobId, chain_id: ChainId, type_name: String },
    JobBlocked { job_id: JobId, blocked_by_chain_id: ChainId },
    JobUnblocked { job_id: JobId },
    JobAttemptStarted { job_id: JobId, worker_id: WorkerId, attempt: u32 },
    JobAttemptFailed { job_id: JobId, error: String },
    JobAttemptTakenByAnotherWorker { job_id: JobId },
    JobAttemptAlreadyCompleted { job_id: JobId },
    JobAttemptLeaseExpired { job_id: JobId },
    JobAttemptLeaseRenewed { job_id: JobId },
    JobCompleted { job_id: JobId },
    JobChainCompleted { chain_id: ChainId },
    JobReaped { job_id: JobId },
    NotifyContextAbsence { type_name: String },
    WorkerStarted { worker_id: WorkerId },
    WorkerStopping { worker_id: WorkerId },
    WorkerStopped { worker_id: WorkerId },
    WorkerError { worker_id: WorkerId, error: String },
}

impl LifecycleEvent {
    /// The bare event name, for backends that key metrics/logs by string
    /// (e.g. a counter per event name) rather than matching on the enum.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::JobChainCreated { .. } => "job_chain_created",
            LifecycleEvent::JobCreated { .. } => "job_created",
            LifecycleEvent::JobBlocked { .. } => "job_blocked",
            LifecycleEvent::JobUnblocked { .. } => "job_unblocked",
            LifecycleEvent::JobAttemptStarted { .. } => "job_attempt_started",
            LifecycleEvent::JobAttemptFailed { .. } => "job_attempt_failed",
            LifecycleEvent::JobAttemptTakenByAnotherWorker { .. } => "job_attempt_taken_by_another_worker",
            LifecycleEvent::JobAttemptAlreadyCompleted { .. } => "job_attempt_already_completed",
            LifecycleEvent::JobAttemptLeaseExpired { .. } => "job_attempt_lease_expired",
            LifecycleEvent::JobAttemptLeaseRenewed { .. } => "job_attempt_lease_renewed",
            LifecycleEvent::JobCompleted { .. } => "job_completed",
            LifecycleEvent::JobChainCompleted { .. } => "job_chain_completed",
            LifecycleEvent::JobReaped { .. } => "job_reaped",
            LifecycleEvent::NotifyContextAbsence { .. } => "notify_context_absence",
            LifecycleEvent::WorkerStarted { .. } => "worker_started",
            LifecycleEvent::WorkerStopping { .. } => "worker_stopping",
            LifecycleEvent::WorkerStopped { .. } => "worker_stopped",
            LifecycleEvent::WorkerError { .. } => "worker_error",
        }
    }
}

/// The three duration histograms named in spec §6 ("attempt/job/chain
/// durations"), each recorded per job type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationMetric {
    Attempt,
    Job,
    Chain,
}

impl DurationMetric {
    pub fn name(&self) -> &'static str {
        match self {
            DurationMetric::Attempt => "job_attempt_duration_ms",
            DurationMetric::Job => "job_duration_ms",
            DurationMetric::Chain => "chain_duration_ms",
        }
    }
}
