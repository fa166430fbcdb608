// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A serialized, long-lived transaction (spec §4.10 "manual transaction
//! context"): several logically-separate steps (e.g. a caller's own
//! application writes alongside `Client::start_job_chain_in`) sharing
//! one `StateAdapter` transaction without all being known up front as a
//! single closure.
//!
//! `StateAdapter::run_in_transaction` only accepts one `FnOnce` for the
//! whole transaction body, so this wraps it in a spawned actor task: the
//! task owns the one `run_in_transaction` call and drives it from a
//! channel of boxed operations, each carrying its own oneshot result
//! channel back to the caller that queued it. `resolve`/`reject` consume
//! `self`, so "running an operation after the transaction has resolved"
//! (spec §4.10) is a compile error rather than a runtime assertion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use jc_core::ContractError;
use jc_storage::{StateAdapter, TxContext};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type BoxedOp = Box<dyn FnOnce(TxContext) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

enum Command {
    Run(BoxedOp),
    Commit,
    Abort(ContractError),
}

/// A handle to one in-flight, actor-driven transaction. Queue operations
/// with [`run`](Self::run), then consume the handle with
/// [`resolve`](Self::resolve) or [`reject`](Self::reject).
pub struct TransactionContext {
    commands: Option<mpsc::Sender<Command>>,
    join: Option<JoinHandle<Result<(), ContractError>>>,
}

impl TransactionContext {
    /// Opens a transaction on `state` and spawns the actor task that
    /// owns it for the lifetime of this handle.
    pub fn begin<S: StateAdapter>(state: Arc<S>) -> Self {
        let (commands_tx, mut commands_rx) = mpsc::channel::<Command>(8);
        let join = tokio::spawn(async move {
            state
                .run_in_transaction(move |tx| async move {
                    loop {
                        match commands_rx.recv().await {
                            Some(Command::Run(op)) => op(tx.clone()).await,
                            Some(Command::Commit) | None => return Ok(()),
                            Some(Command::Abort(reason)) => return Err(reason),
                        }
                    }
                })
                .await
        });
        Self { commands: Some(commands_tx), join: Some(join) }
    }

    /// Queues `f` to run against this transaction's [`TxContext`] and
    /// waits for its result. May be called any number of times before
    /// the context is resolved or rejected.
    pub async fn run<F, Fut, T>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(TxContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
        T: Send + 'static,
    {
        let Some(commands) = self.commands.as_ref() else {
            return Err(ContractError::Transient("transaction context already resolved".to_string()));
        };

        let (result_tx, result_rx) = oneshot::channel();
        let op: BoxedOp = Box::new(move |tx| {
            Box::pin(async move {
                let result = f(tx).await;
                let _ = result_tx.send(result);
            })
        });

        commands
            .send(Command::Run(op))
            .await
            .map_err(|_| ContractError::Transient("transaction actor is no longer running".to_string()))?;

        result_rx
            .await
            .map_err(|_| ContractError::Transient("transaction actor dropped the result channel".to_string()))?
    }

    /// Commits the transaction and waits for the actor task to finish.
    pub async fn resolve(mut self) -> Result<(), ContractError> {
        self.finish(Command::Commit).await
    }

    /// Rolls the transaction back, surfacing `reason` as the result.
    pub async fn reject(mut self, reason: ContractError) -> Result<(), ContractError> {
        self.finish(Command::Abort(reason)).await
    }

    async fn finish(&mut self, command: Command) -> Result<(), ContractError> {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(command).await;
        }
        match self.join.take() {
            Some(join) => {
                join.await.unwrap_or_else(|_| Err(ContractError::Transient("transaction actor panicked".to_string())))
            }
            None => Ok(()),
        }
    }
}

impl Drop for TransactionContext {
    /// A context dropped without an explicit `resolve`/`reject` rolls
    /// back rather than silently committing.
    fn drop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.try_send(Command::Abort(ContractError::Transient(
                "transaction context dropped without resolving".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc_storage::memory::InMemoryStateAdapter;
    use jc_storage::params::CreateJobParams;

    #[tokio::test]
    async fn resolve_commits_queued_operations() {
        let state = Arc::new(InMemoryStateAdapter::new());
        let tx = TransactionContext::begin(state.clone());

        let created = tx
            .run(|ctx| {
                let state = state.clone();
                async move { state.create_job(Some(&ctx), CreateJobParams::chain_head("greet", serde_json::Value::Null)).await }
            })
            .await
            .unwrap();
        tx.resolve().await.unwrap();

        let job = state.get_job_for_update(None, created.job.id).await.unwrap();
        assert_eq!(job.id, created.job.id);
    }

    #[tokio::test]
    async fn reject_rolls_back_queued_operations() {
        let state = Arc::new(InMemoryStateAdapter::new());
        let tx = TransactionContext::begin(state.clone());

        let created = tx
            .run(|ctx| {
                let state = state.clone();
                async move { state.create_job(Some(&ctx), CreateJobParams::chain_head("greet", serde_json::Value::Null)).await }
            })
            .await
            .unwrap();
        let err = tx.reject(ContractError::Transient("caller aborted".to_string())).await.unwrap_err();
        assert!(matches!(err, ContractError::Transient(_)));

        let result = state.get_job_for_update(None, created.job.id).await;
        assert!(matches!(result, Err(ContractError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn dropping_without_resolving_rolls_back() {
        let state = Arc::new(InMemoryStateAdapter::new());
        let created = {
            let tx = TransactionContext::begin(state.clone());
            let created = tx
                .run(|ctx| {
                    let state = state.clone();
                    async move {
                        state.create_job(Some(&ctx), CreateJobParams::chain_head("greet", serde_json::Value::Null)).await
                    }
                })
                .await
                .unwrap();
            created
        };

        // Give the actor task a chance to observe the dropped sender.
        tokio::task::yield_now().await;
        let result = state.get_job_for_update(None, created.job.id).await;
        assert!(matches!(result, Err(ContractError::JobNotFound(_))));
    }
}
