// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing`-backed `ObservabilityAdapter`. One `tracing::info!`/`warn!`
//! per lifecycle event, with structured fields — the way the rest of this
//! workspace logs adapter calls, rather than a bespoke metrics format.

use crate::event::{DurationMetric, LifecycleEvent};
use crate::port::ObservabilityAdapter;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityAdapter;

impl TracingObservabilityAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObservabilityAdapter for TracingObservabilityAdapter {
    async fn record_event(&self, event: LifecycleEvent) {
        let name = event.name();
        match &event {
            LifecycleEvent::JobChainCreated { chain_id, type_name } => {
                tracing::info!(event = name, %chain_id, %type_name, "job chain created");
            }
            LifecycleEvent::JobCreated { job_id, chain_id, type_name } => {
                tracing::info!(event = name, %job_id, %chain_id, %type_name, "job created");
            }
            LifecycleEvent::JobBlocked { job_id, blocked_by_chain_id } => {
                tracing::info!(event = name, %job_id, %blocked_by_chain_id, "job blocked");
            }
            LifecycleEvent::JobUnblocked { job_id } => {
                tracing::info!(event = name, %job_id, "job unblocked");
            }
            LifecycleEvent::JobAttemptStarted { job_id, worker_id, attempt } => {
                tracing::info!(event = name, %job_id, %worker_id, attempt, "job attempt started");
            }
            LifecycleEvent::JobAttemptFailed { job_id, error } => {
                tracing::warn!(event = name, %job_id, %error, "job attempt failed");
            }
            LifecycleEvent::JobAttemptTakenByAnotherWorker { job_id } => {
                tracing::warn!(event = name, %job_id, "job attempt taken by another worker");
            }
            LifecycleEvent::JobAttemptAlreadyCompleted { job_id } => {
                tracing::warn!(event = name, %job_id, "job attempt already completed");
            }
            LifecycleEvent::JobAttemptLeaseExpired { job_id } => {
                tracing::warn!(event = name, %job_id, "job attempt lease expired");
            }
            LifecycleEvent::JobAttemptLeaseRenewed { job_id } => {
                tracing::debug!(event = name, %job_id, "job attempt lease renewed");
            }
            LifecycleEvent::JobCompleted { job_id } => {
                tracing::info!(event = name, %job_id, "job completed");
            }
            LifecycleEvent::JobChainCompleted { chain_id } => {
                tracing::info!(event = name, %chain_id, "job chain completed");
            }
            LifecycleEvent::JobReaped { job_id } => {
                tracing::warn!(event = name, %job_id, "job reaped");
            }
            LifecycleEvent::NotifyContextAbsence { type_name } => {
                tracing::warn!(event = name, %type_name, "notification enqueued with no active notify context");
            }
            LifecycleEvent::WorkerStarted { worker_id } => {
                tracing::info!(event = name, %worker_id, "worker started");
            }
            LifecycleEvent::WorkerStopping { worker_id } => {
                tracing::info!(event = name, %worker_id, "worker stopping");
            }
            LifecycleEvent::WorkerStopped { worker_id } => {
                tracing::info!(event = name, %worker_id, "worker stopped");
            }
            LifecycleEvent::WorkerError { worker_id, error } => {
                tracing::error!(event = name, %worker_id, %error, "worker error");
            }
        }
    }

    async fn record_duration(&self, metric: DurationMetric, type_name: &str, millis: u64) {
        tracing::debug!(metric = metric.name(), %type_name, millis, "duration recorded");
    }

    async fn record_idle(&self, type_name: &str, millis: u64) {
        tracing::debug!(metric = "job_idle_ms", %type_name, millis, "idle duration recorded");
    }
}

#[cfg(test)]
#[path = "tracing_adapter_tests.rs"]
mod tests;
