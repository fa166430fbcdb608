// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state-machine helper (spec §4.3): the shared core behind
//! `Client::start_job_chain`, `AttemptRuntime::complete`/`continue_with`,
//! and the worker loop's error path. Pure state-adapter/registry
//! orchestration — no lease acquisition, no notification transport
//! (buffered through [`crate::notify_context`] instead, flushed by the
//! caller's [`crate::notify_context::with_notify`] scope).

use std::future::Future;
use std::sync::Arc;

use jc_core::{ChainId, ContractError, DeduplicationOptions, Job, JobId, JobStatus, ScheduleOptions, WorkerId};
use jc_observability::{DurationMetric, LifecycleEvent, ObservabilityAdapter};
use jc_storage::{CreateJobParams, StateAdapter, TxContext};
use serde_json::Value;

use crate::config::HandlerRetryConfig;
use crate::notify_context;
use crate::types::{BlockerRef, ContinueWithRequest, CreateJobRequest};

/// Internal, fully-resolved parameters for one `create_job` call — the
/// union of what a chain head ([`CreateJobRequest`]) and a continuation
/// ([`ContinueWithRequest`]) need, after the caller has filled in chain
/// context (`chain_id`, `chain_index`, `origin_id`, `root_chain_id`).
#[derive(Clone)]
pub(crate) struct JobCreationParams {
    pub is_chain_head: bool,
    pub type_name: String,
    pub chain_type_name: String,
    pub chain_id: Option<ChainId>,
    pub chain_index: u64,
    pub origin_id: Option<JobId>,
    pub root_chain_id: Option<ChainId>,
    pub input: Value,
    pub blockers: Vec<BlockerRef>,
    pub deduplication: Option<DeduplicationOptions>,
    pub schedule: ScheduleOptions,
    pub trace_context: Option<Value>,
}

impl JobCreationParams {
    pub(crate) fn chain_head(req: CreateJobRequest) -> Self {
        Self {
            is_chain_head: true,
            chain_type_name: req.type_name.clone(),
            type_name: req.type_name,
            chain_id: None,
            chain_index: 0,
            origin_id: None,
            root_chain_id: None,
            input: req.input,
            blockers: req.blockers,
            deduplication: req.deduplication,
            schedule: req.schedule,
            trace_context: req.trace_context,
        }
    }

    pub(crate) fn continuation(current: &Job, req: ContinueWithRequest) -> Self {
        Self {
            is_chain_head: false,
            type_name: req.type_name,
            chain_type_name: current.chain_type_name.clone(),
            chain_id: Some(current.chain_id),
            chain_index: current.chain_index + 1,
            origin_id: Some(current.id),
            root_chain_id: Some(current.root_chain_id),
            input: req.input,
            blockers: Vec::new(),
            deduplication: None,
            schedule: ScheduleOptions::default(),
            trace_context: req.trace_context,
        }
    }
}

/// A resolved handler outcome that mutates job state on failure (spec
/// §4.3 `handleJobHandlerError`). The three "ignored" [`ContractError`]
/// kinds are folded in here too: whatever raised them (a racing
/// `renew`/`complete` call inside the handler) should be treated exactly
/// like any other terminal attempt outcome by the one funnel below.
pub enum HandlerFailure {
    /// The handler explicitly asked to be rescheduled with a specific
    /// [`ScheduleOptions`] (spec §4.9 `rescheduleJob`).
    Reschedule { schedule: ScheduleOptions, message: String },
    /// The handler threw; back off using the worker's retry config.
    Backoff { message: String },
    /// One of the three ignored [`ContractError`] kinds: the attempt is
    /// no longer authoritative, so no mutation follows.
    Ignored,
}

/// Shared, cheaply-cloned state-machine operations (spec §4.3). Cloning
/// only clones the inner `Arc`s.
pub struct Helper<S, O, R> {
    state: Arc<S>,
    observability: Arc<O>,
    registry: Arc<R>,
}

impl<S, O, R> Clone for Helper<S, O, R> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone(), observability: self.observability.clone(), registry: self.registry.clone() }
    }
}

impl<S, O, R> Helper<S, O, R>
where
    S: StateAdapter,
    O: ObservabilityAdapter,
    R: jc_core::JobTypeRegistry,
{
    pub fn new(state: Arc<S>, observability: Arc<O>, registry: Arc<R>) -> Self {
        Self { state, observability, registry }
    }

    pub fn observability(&self) -> &O {
        &self.observability
    }

    pub fn observability_arc(&self) -> Arc<O> {
        self.observability.clone()
    }

    /// Opens a fresh transaction on the underlying adapter. A thin
    /// passthrough so callers that need a transaction spanning more than
    /// one `Helper` method (e.g. [`crate::attempt::JobHandle::complete`])
    /// don't need their own handle to the adapter.
    pub async fn in_transaction<F, Fut, T>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(TxContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send,
        T: Send + 'static,
    {
        self.state.clone().run_in_transaction(f).await
    }

    /// Creates a chain head or continuation job (spec §4.3 `createJob`).
    /// Atomic with attaching its blockers: if `tx` is `None`, both steps
    /// run inside one transaction opened here; if `Some`, the caller's
    /// transaction is reused and commit/rollback is the caller's
    /// responsibility. Returns `(job, true)` when an existing row
    /// satisfied the request's deduplication key instead of a new job
    /// being created.
    pub(crate) async fn create_job(
        &self,
        tx: Option<&TxContext>,
        params: JobCreationParams,
    ) -> Result<(Job, bool), ContractError> {
        if params.is_chain_head {
            self.registry.validate_entry(&params.type_name).await?;
        }
        let parsed_input = self.registry.parse_input(&params.type_name, params.input.clone()).await?;

        match tx {
            Some(tx) => self.create_job_in_tx(tx, params, parsed_input).await,
            None => {
                let this = self.clone();
                self.state
                    .clone()
                    .run_in_transaction(move |tx| async move { this.create_job_in_tx(&tx, params, parsed_input).await })
                    .await
            }
        }
    }

    async fn create_job_in_tx(
        &self,
        tx: &TxContext,
        params: JobCreationParams,
        parsed_input: Value,
    ) -> Result<(Job, bool), ContractError> {
        let create_params = CreateJobParams {
            type_name: params.type_name.clone(),
            chain_id: params.chain_id,
            chain_type_name: params.chain_type_name.clone(),
            chain_index: params.chain_index,
            input: parsed_input,
            origin_id: params.origin_id,
            root_chain_id: params.root_chain_id,
            deduplication: params.deduplication.clone(),
            schedule: params.schedule,
            trace_context: params.trace_context.clone(),
        };
        let result = self.state.create_job(Some(tx), create_params).await?;
        if result.deduplicated {
            return Ok((result.job, true));
        }

        let mut job = result.job;
        if !params.blockers.is_empty() {
            let type_refs: Vec<jc_core::TypeRef> =
                params.blockers.iter().map(|b| jc_core::TypeRef::new(b.type_name.clone(), Value::Null)).collect();
            self.registry.validate_blockers(&job.type_name, &type_refs).await?;

            let chain_ids = params.blockers.iter().map(|b| b.chain_id).collect();
            let traces = params.blockers.iter().map(|b| b.trace_context.clone()).collect();
            let added = self.state.add_job_blockers(Some(tx), job.id, chain_ids, traces).await?;
            job = added.job;

            self.observability
                .record_event(LifecycleEvent::JobCreated { job_id: job.id, chain_id: job.chain_id, type_name: job.type_name.clone() })
                .await;
            for blocked_by_chain_id in added.incomplete_blocker_chain_ids {
                self.observability.record_event(LifecycleEvent::JobBlocked { job_id: job.id, blocked_by_chain_id }).await;
            }
        } else {
            self.observability
                .record_event(LifecycleEvent::JobCreated { job_id: job.id, chain_id: job.chain_id, type_name: job.type_name.clone() })
                .await;
        }

        if params.is_chain_head {
            self.observability
                .record_event(LifecycleEvent::JobChainCreated { chain_id: job.chain_id, type_name: job.chain_type_name.clone() })
                .await;
        }

        if job.status == JobStatus::Pending {
            self.notify_scheduled(&job.type_name).await;
        }

        Ok((job, false))
    }

    /// Validates and appends a continuation from inside a completion
    /// callback (spec §4.3 `continueWith`). `tx` must be the same
    /// transaction the enclosing completion runs in.
    pub async fn continue_with(&self, tx: &TxContext, current: &Job, req: ContinueWithRequest) -> Result<Job, ContractError> {
        let next_ref = jc_core::TypeRef::new(req.type_name.clone(), req.input.clone());
        self.registry.validate_continue_with(&current.type_name, &next_ref).await?;
        let params = JobCreationParams::continuation(current, req);
        let (job, _deduplicated) = self.create_job(Some(tx), params).await?;
        Ok(job)
    }

    /// Finalizes a job (spec §4.3 `finishJob`). `is_leaf` marks the
    /// terminal job of a chain (no `continueWith` was called): only then
    /// does completion cascade into chain-duration recording,
    /// chain-completed notification, and unblocking jobs that were
    /// waiting on this chain.
    pub async fn finish_job(
        &self,
        tx: &TxContext,
        job_id: JobId,
        worker_id: Option<WorkerId>,
        is_leaf: bool,
        output: Value,
    ) -> Result<Job, ContractError> {
        let output = if is_leaf { self.registry.parse_output(&self.peek_type_name(tx, job_id).await?, output).await? } else { output };
        let completed = self.state.complete_job(Some(tx), job_id, output, worker_id).await?;
        self.observability.record_event(LifecycleEvent::JobCompleted { job_id: completed.id }).await;

        let job_duration_ms = completed.completed_at_ms.unwrap_or(completed.created_at_ms).saturating_sub(completed.created_at_ms);
        self.observability.record_duration(DurationMetric::Job, &completed.type_name, job_duration_ms).await;

        if is_leaf {
            let head = self.state.get_job_for_update(Some(tx), completed.chain_id).await?;
            let chain_duration_ms =
                completed.completed_at_ms.unwrap_or(completed.created_at_ms).saturating_sub(head.created_at_ms);
            self.observability.record_duration(DurationMetric::Chain, &completed.chain_type_name, chain_duration_ms).await;
            self.observability.record_event(LifecycleEvent::JobChainCompleted { chain_id: completed.chain_id }).await;

            if !notify_context::notify_job_chain_completed(completed.chain_id) {
                self.observability
                    .record_event(LifecycleEvent::NotifyContextAbsence { type_name: completed.chain_type_name.clone() })
                    .await;
            }

            let unblocked = self.state.schedule_blocked_jobs(Some(tx), completed.chain_id).await?;
            for unblocked_job in unblocked {
                self.observability.record_event(LifecycleEvent::JobUnblocked { job_id: unblocked_job.job.id }).await;
                self.notify_scheduled(&unblocked_job.job.type_name).await;
            }
        }

        Ok(completed)
    }

    async fn peek_type_name(&self, tx: &TxContext, job_id: JobId) -> Result<String, ContractError> {
        Ok(self.state.get_job_for_update(Some(tx), job_id).await?.type_name)
    }

    /// Handles a failed attempt (spec §4.3 `handleJobHandlerError`).
    /// Opens its own transaction (the attempt's own transaction, if any,
    /// has already rolled back by the time this runs). Returns `None`
    /// for the ignored case, with no state mutated.
    pub async fn handle_job_handler_error(
        &self,
        job_id: JobId,
        attempt: u32,
        retry: HandlerRetryConfig,
        failure: HandlerFailure,
    ) -> Result<Option<Job>, ContractError> {
        let (schedule, message) = match failure {
            HandlerFailure::Ignored => return Ok(None),
            HandlerFailure::Reschedule { schedule, message } => (schedule, message),
            HandlerFailure::Backoff { message } => (ScheduleOptions::after(retry.delay_ms_for_attempt(attempt)), message),
        };

        self.observability.record_event(LifecycleEvent::JobAttemptFailed { job_id, error: message.clone() }).await;
        let job = self.state.reschedule_job(None, job_id, schedule, message).await?;
        self.notify_scheduled(&job.type_name).await;
        Ok(Some(job))
    }

    /// Re-reads a job with its row lock held, asserting it is still
    /// mutable by `worker_id` (spec §4.3 `refetchJobForUpdate`). A `None`
    /// `worker_id` skips the ownership assertion: it marks the workerless
    /// completion path (`Client::complete_job_chain`), which is allowed to
    /// override a job another worker currently holds (spec §4.6 — the
    /// override itself is what raises `jobOwnershipLost`).
    pub async fn refetch_job_for_update(&self, tx: &TxContext, job_id: JobId, worker_id: Option<WorkerId>) -> Result<Job, ContractError> {
        let job = self.state.get_job_for_update(Some(tx), job_id).await?;
        if job.status == JobStatus::Completed {
            return Err(ContractError::JobAlreadyCompleted { job_id });
        }
        if let Some(worker_id) = worker_id {
            if job.leased_by != Some(worker_id) {
                return Err(ContractError::JobTakenByAnotherWorker { job_id, worker_id, leased_by: job.leased_by });
            }
        }
        Ok(job)
    }

    async fn notify_scheduled(&self, type_name: &str) {
        if !notify_context::notify_job_scheduled(type_name) {
            self.observability.record_event(LifecycleEvent::NotifyContextAbsence { type_name: type_name.to_string() }).await;
        }
    }
}
