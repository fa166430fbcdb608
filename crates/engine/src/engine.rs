// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single struct holding every adapter (spec §9 design note:
//! "cyclic references between Client/Worker/Helper... re-architect as a
//! single Engine struct holding the adapters; Client and Worker are thin
//! view facades over it"). [`crate::client::Client`] and
//! [`crate::worker::Worker`] are built from an `Engine` rather than
//! wiring up the four adapters themselves.

use std::sync::Arc;

use jc_core::JobTypeRegistry;
use jc_notify::NotifyAdapter;
use jc_observability::ObservabilityAdapter;
use jc_storage::StateAdapter;

use crate::client::Client;
use crate::config::WorkerConfig;
use crate::helper::Helper;
use crate::worker::Worker;

pub struct Engine<S, N, O, R> {
    state: Arc<S>,
    notify: Arc<N>,
    observability: Arc<O>,
    registry: Arc<R>,
    helper: Helper<S, O, R>,
}

impl<S, N, O, R> Clone for Engine<S, N, O, R> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            notify: self.notify.clone(),
            observability: self.observability.clone(),
            registry: self.registry.clone(),
            helper: self.helper.clone(),
        }
    }
}

impl<S, N, O, R> Engine<S, N, O, R>
where
    S: StateAdapter,
    N: NotifyAdapter,
    O: ObservabilityAdapter,
    R: JobTypeRegistry,
{
    pub fn new(state: Arc<S>, notify: Arc<N>, observability: Arc<O>, registry: Arc<R>) -> Self {
        let helper = Helper::new(state.clone(), observability.clone(), registry.clone());
        Self { state, notify, observability, registry, helper }
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    pub fn notify(&self) -> &Arc<N> {
        &self.notify
    }

    pub fn observability(&self) -> &Arc<O> {
        &self.observability
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Builds the user-facing [`Client`] view over this engine's adapters,
    /// with the default [`crate::config::WaitConfig`].
    pub fn client(&self) -> Client<S, N, O, R> {
        Client::from_parts(self.state.clone(), self.notify.clone(), self.helper.clone(), Default::default())
    }

    /// Builds a [`Worker`] view over this engine's adapters, ready for
    /// `register`/`layer` calls before `run`.
    pub fn worker(&self, config: WorkerConfig) -> Worker<S, N, O, R> {
        Worker::new(self.state.clone(), self.notify.clone(), self.observability.clone(), self.registry.clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc_core::{NominalRegistry, TypeDeclaration};
    use jc_notify::FakeNotifyAdapter;
    use jc_observability::FakeObservabilityAdapter;
    use jc_storage::memory::InMemoryStateAdapter;

    #[tokio::test]
    async fn client_and_worker_views_share_the_same_underlying_state() {
        let registry = Arc::new(NominalRegistry::new());
        registry.register("greet", TypeDeclaration { is_entry_point: true, ..Default::default() });
        let engine = Engine::new(
            Arc::new(InMemoryStateAdapter::new()),
            Arc::new(FakeNotifyAdapter::new()),
            Arc::new(FakeObservabilityAdapter::new()),
            registry,
        );

        let client = engine.client();
        let started =
            client.start_job_chain(crate::types::CreateJobRequest::new("greet", serde_json::Value::Null)).await.unwrap();

        let _worker: Worker<_, _, _, _> = engine.worker(WorkerConfig::default());
        let chain = client.get_job_chain(started.job.chain_id).await.unwrap();
        assert_eq!(chain.head.id, started.job.id);
    }
}
