// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The default adapter when nothing is configured (spec §4.2: "a no-op
//! implementation is permitted and is the default"). Publishes vanish;
//! listeners never fire. Correct only because every wait site also polls.

use crate::port::{NotifyAdapter, NotifyError, Subscription};
use async_trait::async_trait;
use jc_core::{ChainId, JobId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifyAdapter;

impl NoopNotifyAdapter {
    pub fn new() -> Self {
        Self
    }

    fn dead_subscription<T>() -> Subscription<T> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription::new(rx, || {})
    }
}

#[async_trait]
impl NotifyAdapter for NoopNotifyAdapter {
    async fn notify_job_scheduled(&self, _type_name: &str, _count: u32) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_job_chain_completed(&self, _chain_id: ChainId) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_job_ownership_lost(&self, _job_id: JobId) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn listen_job_scheduled(&self, _type_name: &str) -> Subscription<u32> {
        Self::dead_subscription()
    }

    async fn listen_job_chain_completed(&self, _chain_id: ChainId) -> Subscription<()> {
        Self::dead_subscription()
    }

    async fn listen_job_ownership_lost(&self, _job_id: JobId) -> Subscription<()> {
        Self::dead_subscription()
    }
}
