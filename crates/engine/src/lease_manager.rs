// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background lease-renewal driver for one in-flight attempt (spec §4.4
//! step 3: "while the handler runs, periodically call `renewJobLease`").
//! Races against the handler in [`crate::attempt::AttemptRuntime::run`]
//! via `tokio::select!`; whichever finishes first decides the attempt's
//! fate.

use std::sync::Arc;
use std::time::Duration;

use jc_core::{ContractError, JobId, WorkerId};
use jc_observability::{LifecycleEvent, ObservabilityAdapter};
use jc_storage::StateAdapter;
use tokio_util::sync::CancellationToken;

use crate::attempt::CancelReason;
use crate::config::LeaseConfig;

pub struct LeaseManager<S, O> {
    state: Arc<S>,
    observability: Arc<O>,
    job_id: JobId,
    worker_id: WorkerId,
    lease: LeaseConfig,
}

impl<S: StateAdapter, O: ObservabilityAdapter> LeaseManager<S, O> {
    pub fn new(state: Arc<S>, observability: Arc<O>, job_id: JobId, worker_id: WorkerId, lease: LeaseConfig) -> Self {
        Self { state, observability, job_id, worker_id, lease }
    }

    /// Renews the lease every `renew_interval_ms` until either a renewal
    /// fails definitively (the job was reaped, taken by another worker,
    /// or already completed) or `cancellation` fires because the handler
    /// finished first or the worker is stopping.
    pub async fn run(&self, cancellation: CancellationToken) -> CancelReason {
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return CancelReason::WorkerStopping,
                _ = tokio::time::sleep(Duration::from_millis(self.lease.renew_interval_ms)) => {}
            }

            match self.state.renew_job_lease(None, self.job_id, self.worker_id, self.lease.lease_ms).await {
                Ok(_) => {
                    self.observability.record_event(LifecycleEvent::JobAttemptLeaseRenewed { job_id: self.job_id }).await;
                    continue;
                }
                Err(ContractError::JobTakenByAnotherWorker { .. }) => return CancelReason::OwnershipLost,
                Err(ContractError::JobNotFound(_)) => return CancelReason::LeaseExpired,
                Err(ContractError::JobAlreadyCompleted { .. }) => return CancelReason::AlreadyCompleted,
                Err(_) => {
                    // Transient adapter failure: the retry wrapper around
                    // the adapter already absorbed what it could: treat
                    // a failure that reaches here as lease loss rather
                    // than spinning forever on a dead backend.
                    return CancelReason::LeaseExpired;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc_observability::FakeObservabilityAdapter;
    use jc_storage::memory::InMemoryStateAdapter;
    use jc_storage::params::CreateJobParams;
    use std::sync::Arc;

    #[tokio::test]
    async fn stops_on_cancellation_before_any_renewal_failure() {
        let state = Arc::new(InMemoryStateAdapter::new());
        let created = state.create_job(None, CreateJobParams::chain_head("greet", serde_json::Value::Null)).await.unwrap();
        let worker_id = WorkerId::new();
        state.acquire_job(None, &["greet".to_string()], worker_id, 30_000).await.unwrap();

        let observability = Arc::new(FakeObservabilityAdapter::new());
        let manager = LeaseManager::new(state.clone(), observability, created.job.id, worker_id, LeaseConfig::new(30_000, 20));
        let cancellation = CancellationToken::new();
        let cancel_handle = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cancel_handle.cancel();
        });

        let reason = manager.run(cancellation).await;
        assert_eq!(reason, CancelReason::WorkerStopping);
    }

    #[tokio::test]
    async fn detects_ownership_loss_from_another_worker() {
        let state = Arc::new(InMemoryStateAdapter::new());
        let created = state.create_job(None, CreateJobParams::chain_head("greet", serde_json::Value::Null)).await.unwrap();
        let worker_id = WorkerId::new();
        let other_worker = WorkerId::new();
        state.acquire_job(None, &["greet".to_string()], worker_id, 1).await.unwrap();
        // Let the short lease above expire, then have another worker reap it.
        tokio::time::sleep(Duration::from_millis(5)).await;
        state.remove_expired_job_lease(None, &["greet".to_string()], &[]).await.unwrap();
        state.acquire_job(None, &["greet".to_string()], other_worker, 30_000).await.unwrap();

        let observability = Arc::new(FakeObservabilityAdapter::new());
        let manager = LeaseManager::new(state.clone(), observability, created.job.id, worker_id, LeaseConfig::new(30_000, 1));
        let reason = manager.run(CancellationToken::new()).await;
        assert_eq!(reason, CancelReason::OwnershipLost);
    }
}
