// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One attempt at running a job's handler (spec §4.4 `runJob`): acquires
//! nothing itself (the caller already holds the lease from
//! `StateAdapter::acquire_job`), runs the handler against a
//! [`JobHandle`] while [`crate::lease_manager::LeaseManager`] renews the
//! lease in the background, and funnels whatever happens — completion,
//! a continuation, a thrown error, or losing the lease mid-flight —
//! through [`crate::helper::Helper::handle_job_handler_error`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use jc_core::{ContractError, Job, JobTypeRegistry, ScheduleOptions, WorkerId};
use jc_notify::NotifyAdapter;
use jc_observability::{DurationMetric, LifecycleEvent, ObservabilityAdapter};
use jc_storage::StateAdapter;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::config::{HandlerRetryConfig, LeaseConfig};
use crate::helper::{Helper, HandlerFailure};
use crate::lease_manager::LeaseManager;
use crate::notify_context;
use crate::types::ContinueWithRequest;

/// Why an attempt was cancelled mid-flight rather than reaching a normal
/// completed/rescheduled outcome (spec §4.4's lease-loss branch, plus
/// worker shutdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    LeaseExpired,
    OwnershipLost,
    /// A workerless completion (or another worker's `completeJob`) beat
    /// this attempt to finishing the job while it still held a lease.
    AlreadyCompleted,
    WorkerStopping,
}

/// An error a handler can return. `Reschedule` is the explicit
/// `rescheduleJob` request (spec §4.9); `Ignored` folds in the three
/// ignored [`ContractError`] kinds (spec §4.3) a handler's own
/// state-adapter calls may surface when it's no longer authoritative;
/// anything else backs off using the worker's retry config.
#[derive(Debug)]
pub enum AttemptError {
    Reschedule(RescheduleJobError),
    Ignored(ContractError),
    Other(String),
}

impl From<RescheduleJobError> for AttemptError {
    fn from(err: RescheduleJobError) -> Self {
        AttemptError::Reschedule(err)
    }
}

impl From<ContractError> for AttemptError {
    fn from(err: ContractError) -> Self {
        if err.is_ignored_on_handler_error() {
            AttemptError::Ignored(err)
        } else {
            AttemptError::Other(err.to_string())
        }
    }
}

/// Raised by a handler that wants its job rescheduled rather than
/// treated as a failure (spec §4.9 `rescheduleJob`).
#[derive(Debug, Clone)]
pub struct RescheduleJobError {
    pub schedule: ScheduleOptions,
    pub message: String,
}

impl RescheduleJobError {
    pub fn new(schedule: ScheduleOptions, message: impl Into<String>) -> Self {
        Self { schedule, message: message.into() }
    }
}

impl std::fmt::Display for RescheduleJobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reschedule requested: {}", self.message)
    }
}

impl std::error::Error for RescheduleJobError {}

/// What an attempt settled into.
#[derive(Debug)]
pub enum AttemptOutcome {
    Completed(Job),
    Rescheduled(Job),
    Cancelled(CancelReason),
}

/// Passed to a type handler for the duration of one attempt. Exposes the
/// job being worked on and the two ways a handler finishes it
/// (`complete`/`continue_with`); a handler is expected to call exactly
/// one of them before returning `Ok(())`.
pub struct JobHandle<S, O, R> {
    job: Job,
    worker_id: WorkerId,
    helper: Helper<S, O, R>,
    cancellation: CancellationToken,
    finished: Arc<OnceCell<Job>>,
}

impl<S, O, R> JobHandle<S, O, R>
where
    S: StateAdapter,
    O: ObservabilityAdapter,
    R: JobTypeRegistry,
{
    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Cancelled once the lease is confirmed lost or the worker is
    /// stopping; handlers that support cooperative cancellation should
    /// race their own work against this.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Completes this job as the terminal job of its chain (spec §4.3
    /// `completeChain`).
    pub async fn complete(&self, output: Value) -> Result<(), ContractError> {
        let job = self.finish(None, output).await?;
        let _ = self.finished.set(job);
        Ok(())
    }

    /// Appends a continuation and completes this job as a non-terminal
    /// link (spec §4.3 `continueWith`).
    pub async fn continue_with(&self, request: ContinueWithRequest) -> Result<(), ContractError> {
        let job = self.finish(Some(request), Value::Null).await?;
        let _ = self.finished.set(job);
        Ok(())
    }

    async fn finish(&self, continuation: Option<ContinueWithRequest>, output: Value) -> Result<Job, ContractError> {
        let helper = self.helper.clone();
        let worker_id = self.worker_id;
        let job_id = self.job.id;
        self.helper
            .in_transaction(move |tx| async move {
                let current = helper.refetch_job_for_update(&tx, job_id, Some(worker_id)).await?;
                match continuation {
                    Some(request) => {
                        helper.continue_with(&tx, &current, request).await?;
                        helper.finish_job(&tx, job_id, Some(worker_id), false, Value::Null).await
                    }
                    None => helper.finish_job(&tx, job_id, Some(worker_id), true, output).await,
                }
            })
            .await
    }
}

/// Drives one attempt end to end.
pub struct AttemptRuntime<S, N, O, R> {
    helper: Helper<S, O, R>,
    notify: Arc<N>,
    state: Arc<S>,
    job: Job,
    worker_id: WorkerId,
    lease: LeaseConfig,
    retry: HandlerRetryConfig,
}

impl<S, N, O, R> AttemptRuntime<S, N, O, R>
where
    S: StateAdapter,
    N: NotifyAdapter,
    O: ObservabilityAdapter,
    R: JobTypeRegistry,
{
    pub fn new(
        helper: Helper<S, O, R>,
        notify: Arc<N>,
        state: Arc<S>,
        job: Job,
        worker_id: WorkerId,
        lease: LeaseConfig,
        retry: HandlerRetryConfig,
    ) -> Self {
        Self { helper, notify, state, job, worker_id, lease, retry }
    }

    /// Runs `handler` against a [`JobHandle`] for this attempt's job
    /// while a background task renews its lease, racing the two (spec
    /// §4.4 steps 2–4). Whichever finishes first decides the outcome.
    pub async fn run<F, Fut>(self, handler: F) -> AttemptOutcome
    where
        F: FnOnce(JobHandle<S, O, R>) -> Fut,
        Fut: Future<Output = Result<(), AttemptError>>,
    {
        self.helper
            .observability()
            .record_event(LifecycleEvent::JobAttemptStarted {
                job_id: self.job.id,
                worker_id: self.worker_id,
                attempt: self.job.attempt,
            })
            .await;
        let started_at = Instant::now();

        let cancellation = CancellationToken::new();
        let finished = Arc::new(OnceCell::new());
        let handle = JobHandle {
            job: self.job.clone(),
            worker_id: self.worker_id,
            helper: self.helper.clone(),
            cancellation: cancellation.clone(),
            finished: finished.clone(),
        };

        let lease_manager =
            LeaseManager::new(self.state.clone(), self.helper.observability_arc(), self.job.id, self.worker_id, self.lease);
        let renew_fut = lease_manager.run(cancellation.clone());
        tokio::pin!(renew_fut);
        // spec §2/§4.5: scope the handler so a successful finish_job's
        // chain-completed and job-scheduled intents are buffered and
        // flushed on commit, same as the client start path and the
        // failure path below.
        let notify = self.notify.clone();
        let handler_fut = notify_context::with_notify(notify.as_ref(), move || handler(handle));
        tokio::pin!(handler_fut);

        // spec §4.4 step 2: a job-ownership-lost subscription raises
        // cancellation too, independent of (and usually faster than) the
        // lease manager noticing via a failed renewal.
        let mut ownership_lost = self.notify.listen_job_ownership_lost(self.job.id).await;
        let ownership_lost_fut = ownership_lost.recv();
        tokio::pin!(ownership_lost_fut);

        enum Raced {
            Cancelled(CancelReason),
            Handler(Result<(), AttemptError>),
        }

        let raced = tokio::select! {
            reason = &mut renew_fut => Raced::Cancelled(reason),
            _ = &mut ownership_lost_fut => {
                cancellation.cancel();
                Raced::Cancelled(CancelReason::OwnershipLost)
            }
            result = &mut handler_fut => {
                cancellation.cancel();
                Raced::Handler(result)
            }
        };

        let attempt_duration_ms = started_at.elapsed().as_millis() as u64;
        self.helper.observability().record_duration(DurationMetric::Attempt, &self.job.type_name, attempt_duration_ms).await;

        match raced {
            Raced::Cancelled(reason) => {
                match reason {
                    CancelReason::LeaseExpired => {
                        self.helper.observability().record_event(LifecycleEvent::JobAttemptLeaseExpired { job_id: self.job.id }).await
                    }
                    CancelReason::OwnershipLost => {
                        self.helper
                            .observability()
                            .record_event(LifecycleEvent::JobAttemptTakenByAnotherWorker { job_id: self.job.id })
                            .await
                    }
                    CancelReason::AlreadyCompleted => {
                        self.helper
                            .observability()
                            .record_event(LifecycleEvent::JobAttemptAlreadyCompleted { job_id: self.job.id })
                            .await
                    }
                    CancelReason::WorkerStopping => {}
                }
                AttemptOutcome::Cancelled(reason)
            }
            Raced::Handler(Ok(())) => match finished.get() {
                Some(job) => AttemptOutcome::Completed(job.clone()),
                None => {
                    self.reschedule_after_failure(AttemptError::Other(
                        "handler returned without completing or continuing the job".to_string(),
                    ))
                    .await
                }
            },
            Raced::Handler(Err(err)) => self.reschedule_after_failure(err).await,
        }
    }

    async fn reschedule_after_failure(&self, err: AttemptError) -> AttemptOutcome {
        let ignored_reason = match &err {
            AttemptError::Ignored(ContractError::JobAlreadyCompleted { .. }) => Some(CancelReason::AlreadyCompleted),
            AttemptError::Ignored(ContractError::JobTakenByAnotherWorker { .. }) => Some(CancelReason::OwnershipLost),
            AttemptError::Ignored(_) => Some(CancelReason::LeaseExpired),
            _ => None,
        };
        let failure = match err {
            AttemptError::Reschedule(RescheduleJobError { schedule, message }) => HandlerFailure::Reschedule { schedule, message },
            AttemptError::Ignored(_) => HandlerFailure::Ignored,
            AttemptError::Other(message) => HandlerFailure::Backoff { message },
        };

        let helper = self.helper.clone();
        let job_id = self.job.id;
        let attempt = self.job.attempt;
        let retry = self.retry;
        let notify = self.notify.clone();

        let result = notify_context::with_notify(notify.as_ref(), move || {
            let helper = helper.clone();
            async move { helper.handle_job_handler_error(job_id, attempt, retry, failure).await }
        })
        .await;

        match result {
            Ok(Some(job)) => AttemptOutcome::Rescheduled(job),
            Ok(None) => AttemptOutcome::Cancelled(ignored_reason.unwrap_or(CancelReason::OwnershipLost)),
            Err(_) => AttemptOutcome::Cancelled(CancelReason::OwnershipLost),
        }
    }
}
