// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker loop (spec §4.7): repeatedly acquires eligible jobs for
//! its registered type names, runs each through an
//! [`crate::attempt::AttemptRuntime`] up to `concurrency` at a time, and
//! — when nothing is eligible — reaps one expired lease if there is one,
//! else waits for a job-scheduled wake-up or its poll interval, whichever
//! comes first.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use jc_core::{Clock, JobTypeRegistry, SystemClock, WorkerId};
use jc_notify::NotifyAdapter;
use jc_observability::{LifecycleEvent, ObservabilityAdapter};
use jc_storage::{AcquireResult, StateAdapter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::attempt::{AttemptError, AttemptRuntime};
use crate::config::{self, WorkerConfig};
use crate::helper::Helper;
use crate::middleware::{self, HandlerFn, Middleware};
use crate::notify_context;

/// The innermost handler for one job type — the same shape as any
/// middleware layer's `next`.
pub type TypeHandler<S, O, R> = HandlerFn<S, O, R>;

pub struct Worker<S, N, O, R> {
    state: Arc<S>,
    notify: Arc<N>,
    observability: Arc<O>,
    helper: Helper<S, O, R>,
    worker_id: WorkerId,
    config: WorkerConfig,
    handlers: HashMap<String, TypeHandler<S, O, R>>,
    middleware: Vec<Arc<dyn Middleware<S, O, R>>>,
}

impl<S, N, O, R> Worker<S, N, O, R>
where
    S: StateAdapter,
    N: NotifyAdapter,
    O: ObservabilityAdapter,
    R: JobTypeRegistry,
{
    pub fn new(state: Arc<S>, notify: Arc<N>, observability: Arc<O>, registry: Arc<R>, config: WorkerConfig) -> Self {
        let helper = Helper::new(state.clone(), observability.clone(), registry);
        Self {
            state,
            notify,
            observability,
            helper,
            worker_id: WorkerId::new(),
            config,
            handlers: HashMap::new(),
            middleware: Vec::new(),
        }
    }

    pub fn with_worker_id(mut self, worker_id: WorkerId) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    /// Registers the handler for `type_name` (spec §4.7 "typeHandlers").
    pub fn register<F, Fut>(mut self, type_name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(crate::attempt::JobHandle<S, O, R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), AttemptError>> + Send + 'static,
    {
        let boxed: TypeHandler<S, O, R> = Arc::new(move |handle| Box::pin(handler(handle)));
        self.handlers.insert(type_name.into(), boxed);
        self
    }

    /// Adds an outermost-first middleware layer (spec §4.8).
    pub fn layer(mut self, middleware: impl Middleware<S, O, R>) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Runs the worker loop until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        self.observability.record_event(LifecycleEvent::WorkerStarted { worker_id: self.worker_id }).await;

        let type_names: Vec<String> = self.handlers.keys().cloned().collect();
        let mut executor = crate::parallel_executor::ParallelExecutor::new(self.config.concurrency);

        while !shutdown.is_cancelled() {
            let acquired = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.state.acquire_job(None, &type_names, self.worker_id, self.config.lease.lease_ms) => result,
            };

            match acquired {
                Ok(AcquireResult { job: Some(job), .. }) => {
                    let idle_ms = SystemClock.epoch_ms().saturating_sub(job.scheduled_at_ms);
                    self.observability.record_idle(&job.type_name, idle_ms).await;

                    let Some(handler) = self.handlers.get(&job.type_name).cloned() else { continue };
                    let chained = middleware::chain(&self.middleware, handler);
                    let runtime = AttemptRuntime::new(
                        self.helper.clone(),
                        self.notify.clone(),
                        self.state.clone(),
                        job,
                        self.worker_id,
                        self.config.lease,
                        self.config.worker_loop_retry,
                    );
                    let _ = executor
                        .spawn(async move {
                            runtime.run(move |handle| chained(handle)).await;
                        })
                        .await;
                }
                Ok(AcquireResult { job: None, .. }) => {
                    self.wait_for_more_work(&type_names, &shutdown).await;
                }
                Err(err) => {
                    self.observability
                        .record_event(LifecycleEvent::WorkerError { worker_id: self.worker_id, error: err.to_string() })
                        .await;
                    tokio::time::sleep(config::jitter(self.config.worker_loop_retry.initial_delay_ms)).await;
                }
            }
        }

        self.observability.record_event(LifecycleEvent::WorkerStopping { worker_id: self.worker_id }).await;
        executor.join_all().await;
        self.observability.record_event(LifecycleEvent::WorkerStopped { worker_id: self.worker_id }).await;
    }

    async fn wait_for_more_work(&self, type_names: &[String], shutdown: &CancellationToken) {
        if let Ok(Some(reaped)) = self.state.remove_expired_job_lease(None, type_names, &[]).await {
            self.observability.record_event(LifecycleEvent::JobReaped { job_id: reaped.id }).await;
            // spec §4.7 step 2: wake a worker for the reaped type and tell
            // the losing owner its lease is gone, same as any other
            // buffered intent (§4.5).
            let notify = self.notify.clone();
            let type_name = reaped.type_name.clone();
            let job_id = reaped.id;
            notify_context::with_notify(notify.as_ref(), move || async move {
                notify_context::notify_job_scheduled(&type_name);
                notify_context::notify_job_ownership_lost(job_id);
                Ok::<(), std::convert::Infallible>(())
            })
            .await
            .ok();
            return;
        }

        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let mut forwarders = JoinSet::new();
        for type_name in type_names {
            let mut subscription = self.notify.listen_job_scheduled(type_name).await;
            let wake_tx = wake_tx.clone();
            forwarders.spawn(async move {
                subscription.recv().await;
                let _ = wake_tx.send(()).await;
            });
        }
        drop(wake_tx);

        // spec §4.7 step 3: sleep(min(getNextJobAvailableInMs, pollInterval)).
        let next_available_ms = self.state.get_next_job_available_in_ms(None, type_names).await.ok().flatten();
        let wait_ms = match next_available_ms {
            Some(ms) => ms.min(self.config.poll_interval_ms),
            None => self.config.poll_interval_ms,
        };
        let poll_interval = config::jitter(wait_ms);
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(poll_interval) => {}
            _ = wake_rx.recv() => {}
        }
        forwarders.abort_all();
    }
}
