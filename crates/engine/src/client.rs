// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user-facing surface (spec §4.6): starting chains, reading them
//! back, workerless completion, deletion, and waiting for completion.
//! Everything here is a thin facade over [`crate::helper::Helper`] plus
//! the bookkeeping spec §4.6 assigns to the client layer specifically
//! (dedup-aware start, the delete-chains safety check, the
//! wait-for-completion poll/notify race).

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jc_core::{ChainId, ContractError, Job, JobChain, JobTypeRegistry};
use jc_notify::NotifyAdapter;
use jc_observability::ObservabilityAdapter;
use jc_storage::{StateAdapter, TxContext};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::WaitConfig;
use crate::helper::{Helper, JobCreationParams};
use crate::notify_context;
use crate::types::{ContinueWithRequest, CreateJobRequest};

/// Result of [`Client::start_job_chain`]/[`Client::start_job_chain_in`]:
/// the chain head, and whether an existing row satisfied the request's
/// deduplication key instead of a new chain being created (spec §4.1
/// `createJob`, testable property 6).
#[derive(Debug, Clone)]
pub struct StartedJobChain {
    pub job: Job,
    pub deduplicated: bool,
}

/// What a [`Client::complete_job_chain`] callback decided for the job it
/// was handed (spec §4.6 "workerless completion").
pub enum WorkerlessOutcome {
    /// This is the chain's leaf; finalize with this output.
    Complete(Value),
    /// Append a continuation instead of finishing the chain here.
    ContinueWith(ContinueWithRequest),
}

/// User-facing operations over a job-chain engine (spec §4.6). Cheaply
/// cloned: every field is an `Arc` or `Copy` config.
pub struct Client<S, N, O, R> {
    state: Arc<S>,
    notify: Arc<N>,
    helper: Helper<S, O, R>,
    wait: WaitConfig,
}

impl<S, N, O, R> Clone for Client<S, N, O, R> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone(), notify: self.notify.clone(), helper: self.helper.clone(), wait: self.wait }
    }
}

impl<S, N, O, R> Client<S, N, O, R>
where
    S: StateAdapter,
    N: NotifyAdapter,
    O: ObservabilityAdapter,
    R: JobTypeRegistry,
{
    pub fn new(state: Arc<S>, notify: Arc<N>, observability: Arc<O>, registry: Arc<R>) -> Self {
        Self::from_parts(state.clone(), notify, Helper::new(state, observability, registry), WaitConfig::default())
    }

    pub(crate) fn from_parts(state: Arc<S>, notify: Arc<N>, helper: Helper<S, O, R>, wait: WaitConfig) -> Self {
        Self { state, notify, helper, wait }
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Runs `f` inside a deferred-notification scope (spec §4.5, §4.6
    /// `withNotify`): every notification intent produced by `start_job_chain`,
    /// a worker completing a job, etc. while `f` runs is buffered and only
    /// published once `f` resolves `Ok`. Application code should wrap its
    /// own transaction (which itself calls `start_job_chain_in`) in this so
    /// a chain's first wake-up never races the transaction that created it.
    pub async fn with_notify<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        notify_context::with_notify(self.notify.as_ref(), f).await
    }

    /// Starts a new chain head in its own transaction (spec §4.6
    /// `startJobChain`). Per spec, this should be called from within (or
    /// wrapping) [`Client::with_notify`] for an immediate wake-up; called
    /// bare, the job is still created durably, but the wake-up is deferred
    /// to the next worker poll and a `notify_context_absence` observability
    /// event is recorded.
    pub async fn start_job_chain(&self, request: CreateJobRequest) -> Result<StartedJobChain, ContractError> {
        let (job, deduplicated) = self.helper.create_job(None, JobCreationParams::chain_head(request)).await?;
        Ok(StartedJobChain { job, deduplicated })
    }

    /// Starts a new chain head inside a caller-supplied transaction (spec
    /// §4.6's "enqueue inside a transaction" usage: the chain head becomes
    /// atomic with whatever application state the caller is writing in the
    /// same `tx`).
    pub async fn start_job_chain_in(&self, tx: &TxContext, request: CreateJobRequest) -> Result<StartedJobChain, ContractError> {
        let (job, deduplicated) = self.helper.create_job(Some(tx), JobCreationParams::chain_head(request)).await?;
        Ok(StartedJobChain { job, deduplicated })
    }

    /// Assembles the read-model view of a chain (SPEC_FULL.md §C): head +
    /// current job, derived [`jc_core::ChainStatus`], and the current job's
    /// outstanding blockers.
    pub async fn get_job_chain(&self, chain_id: ChainId) -> Result<JobChain, ContractError> {
        let head = self.state.get_job_for_update(None, chain_id).await?;
        let current = self.state.get_current_job_for_update(None, chain_id).await?;
        let blockers = self.state.list_job_blockers(None, current.id).await?;
        Ok(JobChain::new(head, current, blockers))
    }

    /// Finalizes a chain's current job outside of any worker (spec §4.6
    /// "workerless completion"). Locks the current job, runs `decide` with
    /// it, and finalizes as if by a worker with `workerId=null`. If the job
    /// was `running` under some worker, that worker is kicked out via a
    /// buffered `job-ownership-lost` notification once this transaction
    /// commits.
    pub async fn complete_job_chain<F, Fut>(&self, chain_id: ChainId, decide: F) -> Result<Job, ContractError>
    where
        F: FnOnce(Job) -> Fut + Send + 'static,
        Fut: Future<Output = WorkerlessOutcome> + Send,
    {
        let helper = self.helper.clone();
        let notify = self.notify.clone();
        let state = self.state.clone();

        notify_context::with_notify(notify.as_ref(), move || {
            let helper = helper.clone();
            let state = state.clone();
            async move {
                state
                    .clone()
                    .run_in_transaction(move |tx| async move {
                        let current = state.get_current_job_for_update(Some(&tx), chain_id).await?;
                        if current.status == jc_core::JobStatus::Completed {
                            return Err(ContractError::JobAlreadyCompleted { job_id: current.id });
                        }
                        let was_running = current.status == jc_core::JobStatus::Running;
                        let job_id = current.id;

                        match decide(current).await {
                            WorkerlessOutcome::Complete(output) => {
                                if was_running {
                                    notify_context::notify_job_ownership_lost(job_id);
                                }
                                helper.finish_job(&tx, job_id, None, true, output).await
                            }
                            WorkerlessOutcome::ContinueWith(request) => {
                                let current = helper.refetch_job_for_update(&tx, job_id, None).await?;
                                helper.continue_with(&tx, &current, request).await?;
                                if was_running {
                                    notify_context::notify_job_ownership_lost(job_id);
                                }
                                helper.finish_job(&tx, job_id, None, false, Value::Null).await
                            }
                        }
                    })
                    .await
            }
        })
        .await
    }

    /// Deletes every job belonging to `root_chain_ids` (spec §4.6
    /// `deleteJobChains`). Every id must itself be a root chain head; the
    /// operation refuses (without deleting anything) if any job outside
    /// the requested set is blocked on a job inside it.
    pub async fn delete_job_chains(&self, root_chain_ids: &[ChainId]) -> Result<u64, ContractError> {
        for &chain_id in root_chain_ids {
            let head = self.state.get_job_for_update(None, chain_id).await?;
            if !head.is_chain_head() || !head.is_root_chain() {
                return Err(ContractError::NotARootChain { chain_id });
            }
        }

        let external = self.state.get_external_blockers(None, root_chain_ids).await?;
        if !external.is_empty() {
            let mut external_root_chain_ids = HashSet::new();
            for blocker in &external {
                let job = self.state.get_job_for_update(None, blocker.job_id).await?;
                external_root_chain_ids.insert(job.root_chain_id);
            }
            return Err(ContractError::DeleteWouldOrphanExternalBlockers {
                external_root_chain_ids: external_root_chain_ids.into_iter().collect(),
            });
        }

        self.state.delete_jobs_by_root_chain_ids(None, root_chain_ids).await
    }

    /// Waits until `chain_id`'s chain completes (spec §4.6
    /// `waitForJobChainCompletion`): (a) an immediate synchronous check,
    /// (b) a `job-chain-completed` subscription, (c) a poll loop racing the
    /// notification against a jittered `poll_interval_ms` sleep, until the
    /// chain completes, `cancellation` fires, or `timeout_ms` elapses.
    pub async fn wait_for_job_chain_completion(
        &self,
        chain_id: ChainId,
        timeout_ms: u64,
        cancellation: Option<CancellationToken>,
    ) -> Result<Job, ContractError> {
        let current = self.state.get_current_job_for_update(None, chain_id).await?;
        if current.status == jc_core::JobStatus::Completed {
            return Ok(current);
        }

        let mut subscription = self.notify.listen_job_chain_completed(chain_id).await;
        let poll_interval = Duration::from_millis(self.wait.poll_interval_ms);
        let cancellation = cancellation.unwrap_or_default();

        let deadline = tokio::time::sleep(Duration::from_millis(timeout_ms));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    return Err(ContractError::WaitForJobChainCompletionTimeout { chain_id, timeout_ms });
                }
                _ = cancellation.cancelled() => {
                    return Err(ContractError::WaitForJobChainCompletionTimeout { chain_id, timeout_ms });
                }
                _ = subscription.recv() => {}
                _ = tokio::time::sleep(crate::config::jitter(poll_interval.as_millis() as u64)) => {}
            }

            let current = self.state.get_current_job_for_update(None, chain_id).await?;
            if current.status == jc_core::JobStatus::Completed {
                return Ok(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc_core::{NominalRegistry, TypeDeclaration};
    use jc_notify::FakeNotifyAdapter;
    use jc_observability::FakeObservabilityAdapter;
    use jc_storage::memory::InMemoryStateAdapter;

    fn test_client() -> Client<InMemoryStateAdapter, FakeNotifyAdapter, FakeObservabilityAdapter, NominalRegistry> {
        let state = Arc::new(InMemoryStateAdapter::new());
        let notify = Arc::new(FakeNotifyAdapter::new());
        let observability = Arc::new(FakeObservabilityAdapter::new());
        let registry = Arc::new(NominalRegistry::new());
        registry.register("greet", TypeDeclaration { is_entry_point: true, ..Default::default() });
        Client::new(state, notify, observability, registry)
    }

    #[tokio::test]
    async fn start_job_chain_creates_a_fresh_chain_head() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::json!({"name": "World"}))).await.unwrap();
        assert!(!started.deduplicated);
        assert!(started.job.is_chain_head());
    }

    #[tokio::test]
    async fn get_job_chain_reports_pending_status_for_a_fresh_head() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();
        let chain = client.get_job_chain(started.job.chain_id).await.unwrap();
        assert_eq!(chain.status, jc_core::ChainStatus::Pending);
        assert!(chain.blockers.is_empty());
    }

    #[tokio::test]
    async fn complete_job_chain_finalizes_a_pending_job_without_a_worker() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();

        let completed = client
            .complete_job_chain(started.job.chain_id, |_job| async { WorkerlessOutcome::Complete(serde_json::json!({"ok": true})) })
            .await
            .unwrap();

        assert_eq!(completed.status, jc_core::JobStatus::Completed);
        assert_eq!(completed.completed_by, None);
    }

    #[tokio::test]
    async fn delete_job_chains_rejects_a_non_root_chain_id() {
        let client = test_client();
        let not_a_chain = jc_core::JobId::new();
        let err = client.delete_job_chains(&[not_a_chain]).await.unwrap_err();
        assert!(matches!(err, ContractError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn delete_job_chains_removes_every_job_in_the_chain() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();
        let deleted = client.delete_job_chains(&[started.job.chain_id]).await.unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn wait_for_job_chain_completion_returns_immediately_when_already_done() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();
        client.complete_job_chain(started.job.chain_id, |_job| async { WorkerlessOutcome::Complete(Value::Null) }).await.unwrap();

        let job = client.wait_for_job_chain_completion(started.job.chain_id, 1_000, None).await.unwrap();
        assert_eq!(job.status, jc_core::JobStatus::Completed);
    }

    #[tokio::test]
    async fn wait_for_job_chain_completion_times_out_on_a_chain_that_never_finishes() {
        let client = test_client();
        let started = client.start_job_chain(CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();

        let err = client.wait_for_job_chain_completion(started.job.chain_id, 20, None).await.unwrap_err();
        assert!(matches!(err, ContractError::WaitForJobChainCompletionTimeout { .. }));
    }
}
