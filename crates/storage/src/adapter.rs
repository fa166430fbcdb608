// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StateAdapter` port (spec §4.1): all persistence, atomic state
//! transitions, and locking reads behind one narrow trait. Backends
//! (in-memory here, SQL/document elsewhere) realize it; the retry
//! wrapper in [`crate::retry`] composes with any of them.

use crate::memory::MaterializedState;
use crate::params::{AcquireResult, AddJobBlockersResult, CreateJobParams, CreateJobResult, UnblockedJob};
use async_trait::async_trait;
use jc_core::{ChainId, ContractError, Job, JobBlocker, JobId, ScheduleOptions, WorkerId};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Transaction token shared by every operation invoked within one
/// `run_in_transaction` call. Clonable and `'static` so it can be moved
/// into the caller's closure without borrowing from the adapter.
///
/// Backed by a private scratch copy of the state: `run_in_transaction`
/// clones the committed state into this scratch, runs the callback
/// against it, and swaps it back into the adapter only if the callback
/// returns `Ok`. This gives the in-memory reference backend
/// commit/rollback semantics without a real WAL; it is not
/// serializable under concurrent transactions (last commit wins), which
/// is an acceptable simplification for a reference backend — real
/// backends use their database's MVCC instead.
#[derive(Clone)]
pub struct TxContext {
    pub(crate) scratch: Arc<AsyncMutex<MaterializedState>>,
}

#[async_trait]
pub trait StateAdapter: Send + Sync + 'static {
    /// Opens a transaction, runs `f` with a context token, commits on
    /// `Ok`, rolls back on `Err`. `Self: Sized` keeps this generic method
    /// out of the vtable so the rest of the trait stays object-safe.
    async fn run_in_transaction<F, Fut, T>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(TxContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send,
        T: Send + 'static,
        Self: Sized;

    async fn create_job(
        &self,
        tx: Option<&TxContext>,
        params: CreateJobParams,
    ) -> Result<CreateJobResult, ContractError>;

    async fn add_job_blockers(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        blocked_by_chain_ids: Vec<ChainId>,
        blocker_trace_contexts: Vec<Option<serde_json::Value>>,
    ) -> Result<AddJobBlockersResult, ContractError>;

    async fn schedule_blocked_jobs(
        &self,
        tx: Option<&TxContext>,
        blocked_by_chain_id: ChainId,
    ) -> Result<Vec<UnblockedJob>, ContractError>;

    async fn acquire_job(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        worker_id: WorkerId,
        default_lease_ms: u64,
    ) -> Result<AcquireResult, ContractError>;

    async fn renew_job_lease(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        worker_id: WorkerId,
        lease_duration_ms: u64,
    ) -> Result<Job, ContractError>;

    async fn reschedule_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        schedule: ScheduleOptions,
        error: String,
    ) -> Result<Job, ContractError>;

    async fn complete_job(
        &self,
        tx: Option<&TxContext>,
        job_id: JobId,
        output: serde_json::Value,
        worker_id: Option<WorkerId>,
    ) -> Result<Job, ContractError>;

    async fn remove_expired_job_lease(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
        ignored_job_ids: &[JobId],
    ) -> Result<Option<Job>, ContractError>;

    async fn get_job_for_update(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Job, ContractError>;

    async fn get_current_job_for_update(
        &self,
        tx: Option<&TxContext>,
        chain_id: ChainId,
    ) -> Result<Job, ContractError>;

    /// Current unsatisfied blocker rows for one job (SPEC_FULL.md §C read
    /// model support — not named directly in spec §4.1 but a natural
    /// complement to `add_job_blockers`/`get_external_blockers`).
    async fn list_job_blockers(&self, tx: Option<&TxContext>, job_id: JobId) -> Result<Vec<JobBlocker>, ContractError>;

    async fn get_external_blockers(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<Vec<JobBlocker>, ContractError>;

    async fn delete_jobs_by_root_chain_ids(
        &self,
        tx: Option<&TxContext>,
        root_chain_ids: &[ChainId],
    ) -> Result<u64, ContractError>;

    async fn get_next_job_available_in_ms(
        &self,
        tx: Option<&TxContext>,
        type_names: &[String],
    ) -> Result<Option<u64>, ContractError>;
}
