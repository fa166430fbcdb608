// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry wrapper for transient adapter errors (spec §7.2).
//!
//! Wraps any [`StateAdapter`] and retries a call with exponential backoff
//! when the inner adapter reports [`ContractError::Transient`]. The four
//! named contract errors are never retried — they are permanent outcomes,
//! not transport hiccups. Retry is bypassed entirely when the caller
//! supplies a `tx` context: the caller owns that transaction's envelope
//! and is responsible for its own retry/rollback policy.

use crate::adapter::{StateAdapter, TxContext};
use crate::params::{AcquireResult, AddJobBlockersResult, CreateJobParams, CreateJobResult, UnblockedJob};
use async_trait::async_trait;
use jc_core::{ChainId, ContractError, Job, JobBlocker, JobId, ScheduleOptions, WorkerId};
use std::future::Future;
use std::time::Duration;

/// Exponential backoff tuning. Defaults match spec §7.2: 3 attempts,
/// starting at 1s, multiplying by 5 per retry, capped at 10s.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 5.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

pub struct RetryingStateAdapter<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: StateAdapter> RetryingStateAdapter<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn with_retry<T, F, Fut>(&self, tx: Option<&TxContext>, op: F) -> Result<T, ContractError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ContractError>>,
    {
        if tx.is_some() {
            return op().await;
        }
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(ContractError::Transient(detail)) if attempt + 1 < self.config.max_attempts => {
                    tracing::warn!(attempt, %detail, "transient storage error, retrying");
                    tokio::time::sleep(self.config.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<S: StateAdapter> StateAdapter for RetryingStateAdapter<S> {
    async fn run_in_transaction<F, Fut, T>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(TxContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send,
        T: Send + 'static,
        Self: Sized,
    {
        self.inner.run_in_transaction(f).await
    }

    async fn create_job(
        &self,
        tx: Option<&TxContext>,
        params: CreateJobParams,
    ) -> Result<CreateJobResult, ContractError> {
        self.with_retry(tx, || self.inner.create_job(tx, params.clone())).await
    }

    async fn add_job_blockers(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        blocked_by_chain_ids: Vec<ChainId>,
        blocker_trace_contexts: Vec<Option<serde_json::Value>>,
    ) -> Result<AddJobBlockersResult, ContractError> {
        self.with_retry(tx, || {
            self.inner.add_job_blockers(tx, job_id, blocked_by_chain_ids.clone(), blocker_trace_contexts.clone())
        })
        .await
    }

    async fn schedule_blocked_jobs(
        &self,
        tx: Option<&TxContext>,
        blocked_by_chain_id: ChainId,
    ) -> Result<Vec<UnblockedJob>, ContractError> {
        self.with_retry(tx, || self.inner.schedule_blocked_jobs(tx, blocked_by_chain_id)).await
    }

    async fn acquire_job(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        worker_id: WorkerId,
        default_lease_ms: u64,
    ) -> Result<AcquireResult, ContractError> {
        self.with_retry(tx, || self.inner.acquire_job(tx, type_names, worker_id, default_lease_ms)).await
    }

    async fn renew_job_lease(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        worker_id: WorkerId,
        lease_duration_ms: u64,
    ) -> Result<Job, ContractError> {
        self.with_retry(tx, || self.inner.renew_job_lease(tx, job_id, worker_id, lease_duration_ms)).await
    }

    async fn reschedule_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        schedule: ScheduleOptions,
        error: String,
    ) -> Result<Job, ContractError> {
        self.with_retry(tx, || self.inner.reschedule_job(tx, job_id, schedule, error.clone())).await
    }

    async fn complete_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        output: serde_json::Value,
        worker_id: Option<WorkerId>,
    ) -> Result<Job, ContractError> {
        self.with_retry(tx, || self.inner.complete_job(tx, job_id, output.clone(), worker_id)).await
    }

    async fn remove_expired_job_lease(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        ignored_job_ids: &[JobId],
    ) -> Result<Option<Job>, ContractError> {
        self.with_retry(tx, || self.inner.remove_expired_job_lease(tx, type_names, ignored_job_ids)).await
    }

    async fn get_job_for_update(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Job, ContractError> {
        self.with_retry(tx, || self.inner.get_job_for_update(tx, job_id)).await
    }

    async fn get_current_job_for_update(
        &self,
        tx: Option<&TxContext>,
        chain_id: ChainId,
    ) -> Result<Job, ContractError> {
        self.with_retry(tx, || self.inner.get_current_job_for_update(tx, chain_id)).await
    }

    async fn list_job_blockers(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Vec<JobBlocker>, ContractError> {
        self.with_retry(tx, || self.inner.list_job_blockers(tx, job_id)).await
    }

    async fn get_external_blockers(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<Vec<JobBlocker>, ContractError> {
        self.with_retry(tx, || self.inner.get_external_blockers(tx, root_chain_ids)).await
    }

    async fn delete_jobs_by_root_chain_ids(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<u64, ContractError> {
        self.with_retry(tx, || self.inner.delete_jobs_by_root_chain_ids(tx, root_chain_ids)).await
    }

    async fn get_next_job_available_in_ms(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
    ) -> Result<Option<u64>, ContractError> {
        self.with_retry(tx, || self.inner.get_next_job_available_in_ms(tx, type_names)).await
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
