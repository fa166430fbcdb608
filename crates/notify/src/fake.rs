// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double recording every publish without actually delivering
//! anything, mirroring the teacher's `FakeNotifyAdapter` (so `Helper`/
//! `Client` tests can assert "an intent was enqueued" without standing
//! up the in-process backend's channels).

use crate::port::{NotifyAdapter, NotifyError, Subscription};
use async_trait::async_trait;
use jc_core::{ChainId, JobId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedNotification {
    JobScheduled { type_name: String, count: u32 },
    JobChainCompleted { chain_id: ChainId },
    JobOwnershipLost { job_id: JobId },
}

#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<RecordedNotification>>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedNotification> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify_job_scheduled(&self, type_name: &str, count: u32) -> Result<(), NotifyError> {
        self.calls.lock().push(RecordedNotification::JobScheduled { type_name: type_name.to_string(), count });
        Ok(())
    }

    async fn notify_job_chain_completed(&self, chain_id: ChainId) -> Result<(), NotifyError> {
        self.calls.lock().push(RecordedNotification::JobChainCompleted { chain_id });
        Ok(())
    }

    async fn notify_job_ownership_lost(&self, job_id: JobId) -> Result<(), NotifyError> {
        self.calls.lock().push(RecordedNotification::JobOwnershipLost { job_id });
        Ok(())
    }

    async fn listen_job_scheduled(&self, _type_name: &str) -> Subscription<u32> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription::new(rx, || {})
    }

    async fn listen_job_chain_completed(&self, _chain_id: ChainId) -> Subscription<()> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription::new(rx, || {})
    }

    async fn listen_job_ownership_lost(&self, _job_id: JobId) -> Subscription<()> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription::new(rx, || {})
    }
}
