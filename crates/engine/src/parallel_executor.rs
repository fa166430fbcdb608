// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency task runner backing the worker loop's
//! `concurrency` setting (spec §4.7: "run up to `concurrency` attempts
//! at once"). A semaphore gates how many spawned tasks may be in flight;
//! a [`tokio::task::JoinSet`] tracks them so the worker can wait for all
//! outstanding attempts to drain on shutdown.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor is shutting down")]
    ShuttingDown,
}

pub struct ParallelExecutor {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl ParallelExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(concurrency.max(1))), tasks: JoinSet::new() }
    }

    /// Acquires a concurrency slot, then spawns `task`. Awaiting this
    /// call blocks (without occupying a worker thread) until a slot is
    /// free when the executor is already at capacity.
    pub async fn spawn<F>(&mut self, task: F) -> Result<(), ExecutorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self.semaphore.clone().acquire_owned().await.map_err(|_| ExecutorError::ShuttingDown)?;
        self.tasks.spawn(async move {
            task.await;
            drop(permit);
        });
        Ok(())
    }

    /// How many more tasks could be spawned right now without waiting.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// How many tasks are currently spawned (running or queued to run).
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every spawned task to finish.
    pub async fn join_all(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_concurrency() {
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let mut executor = ParallelExecutor::new(2);

        for _ in 0..6 {
            let concurrent = concurrent.clone();
            let max_seen = max_seen.clone();
            executor
                .spawn(async move {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
        }
        executor.join_all().await;

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn join_all_waits_for_every_spawned_task() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut executor = ParallelExecutor::new(4);
        for _ in 0..4 {
            let done = done.clone();
            executor.spawn(async move { done.fetch_add(1, Ordering::SeqCst); }).await.unwrap();
        }
        executor.join_all().await;
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }
}
