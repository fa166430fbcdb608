// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference in-memory `StateAdapter` backend.
//!
//! Holds one [`MaterializedState`] guarded by a `tokio::sync::Mutex` (not
//! `parking_lot`: `run_in_transaction`'s callback is async and must hold
//! its scratch copy across `.await` points). No filesystem, no network —
//! this backend exists to make the engine's semantics testable, not to be
//! a production store.

mod blockers;
mod jobs;

use crate::adapter::{StateAdapter, TxContext};
use crate::params::{AcquireResult, AddJobBlockersResult, CreateJobParams, CreateJobResult, UnblockedJob};
use async_trait::async_trait;
use jc_core::{ChainId, Clock, ContractError, Job, JobBlocker, JobId, ScheduleOptions, SystemClock, WorkerId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// All persisted rows: jobs keyed by id, and blocker rows keyed by the
/// blocked job's id (spec §3 "JobBlocker").
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub(crate) jobs: HashMap<JobId, Job>,
    pub(crate) blockers: HashMap<JobId, Vec<JobBlocker>>,
}

impl MaterializedState {
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

pub struct InMemoryStateAdapter<C: Clock = SystemClock> {
    clock: C,
    state: Arc<AsyncMutex<MaterializedState>>,
}

impl InMemoryStateAdapter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryStateAdapter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStateAdapter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, state: Arc::new(AsyncMutex::new(MaterializedState::default())) }
    }

    /// Snapshot of the current committed state, for assertions in tests.
    pub async fn snapshot(&self) -> MaterializedState {
        self.state.lock().await.clone()
    }

    async fn with_state<R>(&self, tx: Option<&TxContext>, f: impl FnOnce(&mut MaterializedState) -> R) -> R {
        match tx {
            Some(tx) => f(&mut tx.scratch.lock().await),
            None => f(&mut self.state.lock().await),
        }
    }
}

#[async_trait]
impl<C: Clock> StateAdapter for InMemoryStateAdapter<C> {
    async fn run_in_transaction<F, Fut, T>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(TxContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send,
        T: Send + 'static,
        Self: Sized,
    {
        let snapshot = self.state.lock().await.clone();
        let scratch = Arc::new(AsyncMutex::new(snapshot));
        let tx = TxContext { scratch: scratch.clone() };
        let result = f(tx).await;
        if result.is_ok() {
            let committed = scratch.lock().await.clone();
            *self.state.lock().await = committed;
        }
        result
    }

    async fn create_job(
        &self,
        tx: Option<&TxContext>,
        params: CreateJobParams,
    ) -> Result<CreateJobResult, ContractError> {
        let now_ms = self.clock.epoch_ms();
        Ok(self.with_state(tx, |state| jobs::create_job(state, now_ms, params)).await)
    }

    async fn add_job_blockers(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        blocked_by_chain_ids: Vec<ChainId>,
        blocker_trace_contexts: Vec<Option<serde_json::Value>>,
    ) -> Result<AddJobBlockersResult, ContractError> {
        self.with_state(tx, |state| {
            blockers::add_job_blockers(state, job_id, blocked_by_chain_ids, blocker_trace_contexts)
        })
        .await
    }

    async fn schedule_blocked_jobs(
        &self,
        tx: Option<&TxContext>,
        blocked_by_chain_id: ChainId,
    ) -> Result<Vec<UnblockedJob>, ContractError> {
        Ok(self.with_state(tx, |state| blockers::schedule_blocked_jobs(state, blocked_by_chain_id)).await)
    }

    async fn acquire_job(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        worker_id: WorkerId,
        default_lease_ms: u64,
    ) -> Result<AcquireResult, ContractError> {
        let now_ms = self.clock.epoch_ms();
        Ok(self
            .with_state(tx, |state| jobs::acquire_job(state, now_ms, type_names, worker_id, default_lease_ms))
            .await)
    }

    async fn renew_job_lease(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        worker_id: WorkerId,
        lease_duration_ms: u64,
    ) -> Result<Job, ContractError> {
        let now_ms = self.clock.epoch_ms();
        self.with_state(tx, |state| jobs::renew_job_lease(state, now_ms, job_id, worker_id, lease_duration_ms)).await
    }

    async fn reschedule_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        schedule: ScheduleOptions,
        error: String,
    ) -> Result<Job, ContractError> {
        let now_ms = self.clock.epoch_ms();
        self.with_state(tx, |state| jobs::reschedule_job(state, now_ms, job_id, schedule, error)).await
    }

    async fn complete_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        output: serde_json::Value,
        worker_id: Option<WorkerId>,
    ) -> Result<Job, ContractError> {
        let now_ms = self.clock.epoch_ms();
        self.with_state(tx, |state| jobs::complete_job(state, now_ms, job_id, output, worker_id)).await
    }

    async fn remove_expired_job_lease(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        ignored_job_ids: &[JobId],
    ) -> Result<Option<Job>, ContractError> {
        let now_ms = self.clock.epoch_ms();
        Ok(self
            .with_state(tx, |state| jobs::remove_expired_job_lease(state, now_ms, type_names, ignored_job_ids))
            .await)
    }

    async fn get_job_for_update(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Job, ContractError> {
        self.with_state(tx, |state| jobs::get_job_for_update(state, job_id)).await
    }

    async fn get_current_job_for_update(
        &self,
        tx: Option<&TxContext>,
        chain_id: ChainId,
    ) -> Result<Job, ContractError> {
        self.with_state(tx, |state| jobs::get_current_job_for_update(state, chain_id)).await
    }

    async fn list_job_blockers(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Vec<JobBlocker>, ContractError> {
        Ok(self.with_state(tx, |state| blockers::list_job_blockers(state, job_id)).await)
    }

    async fn get_external_blockers(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<Vec<JobBlocker>, ContractError> {
        Ok(self.with_state(tx, |state| blockers::get_external_blockers(state, root_chain_ids)).await)
    }

    async fn delete_jobs_by_root_chain_ids(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<u64, ContractError> {
        Ok(self.with_state(tx, |state| blockers::delete_jobs_by_root_chain_ids(state, root_chain_ids)).await)
    }

    async fn get_next_job_available_in_ms(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
    ) -> Result<Option<u64>, ContractError> {
        let now_ms = self.clock.epoch_ms();
        Ok(self.with_state(tx, |state| jobs::get_next_job_available_in_ms(state, now_ms, type_names)).await)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
