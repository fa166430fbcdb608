// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `NotifyAdapter` trait itself (spec §4.2).

use async_trait::async_trait;
use jc_core::{ChainId, JobId};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// A live subscription on one of the three channels. Dropping it (or
/// calling `dispose` explicitly) unregisters the listener; re-subscribing
/// after a backend disconnect is expected to be transparent to callers —
/// every wait site also polls, so a missed wake-up only costs latency.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    dispose: Box<dyn FnOnce() + Send>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<T>, dispose: impl FnOnce() + Send + 'static) -> Self {
        Self { rx, dispose: Box::new(dispose) }
    }

    /// Waits for the next notification on this subscription. Returns
    /// `None` once the backend has torn the channel down (e.g. the last
    /// publisher side was dropped); callers should fall back to polling.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Explicit dispose, matching the `dispose` callable named in spec
    /// §4.2. Equivalent to dropping the subscription.
    pub fn dispose(self) {
        (self.dispose)();
    }
}

#[async_trait]
pub trait NotifyAdapter: Send + Sync + 'static {
    /// Wake workers polling for `type_name`. `count` is an optional hint
    /// for backends that broker wake-ups (e.g. a Redis decrement script);
    /// the in-process backend ignores it.
    async fn notify_job_scheduled(&self, type_name: &str, count: u32) -> Result<(), NotifyError>;

    /// Broadcast that `chain_id`'s chain has completed.
    async fn notify_job_chain_completed(&self, chain_id: ChainId) -> Result<(), NotifyError>;

    /// Broadcast that `job_id`'s lease was revoked out from under its
    /// current attempt.
    async fn notify_job_ownership_lost(&self, job_id: JobId) -> Result<(), NotifyError>;

    /// Subscribe to wake-ups for `type_name`. Queue-like: each publish is
    /// intended for exactly one listener, though duplicates are permitted
    /// (acquire is idempotent, so a spurious wake-up just costs a no-op poll).
    async fn listen_job_scheduled(&self, type_name: &str) -> Subscription<u32>;

    /// Subscribe to completion of a specific chain. Every listener on that
    /// id wakes.
    async fn listen_job_chain_completed(&self, chain_id: ChainId) -> Subscription<()>;

    /// Subscribe to ownership loss for a specific job. Every listener on
    /// that id wakes.
    async fn listen_job_ownership_lost(&self, job_id: JobId) -> Subscription<()>;
}
