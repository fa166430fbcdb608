// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-process `NotifyAdapter` backend.
//!
//! No network, no broker — channels live in an in-memory registry guarded
//! by one async mutex per topic kind. Good enough for a single daemon
//! process and for integration tests; a real deployment with multiple
//! worker processes needs a backend with an actual transport (Postgres
//! LISTEN/NOTIFY, Redis pub/sub) behind the same port.

use crate::port::{NotifyAdapter, NotifyError, Subscription};
use async_trait::async_trait;
use jc_core::{ChainId, JobId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Lifecycle of a shared broadcast topic (spec §9 "shared listener
/// pattern"). A real backend with a network connection per topic would
/// observe all four states; the in-memory registry collapses `starting`
/// into the instant the entry is inserted under the registry lock, so
/// concurrent `listen()` calls on the same key always join the same
/// channel rather than racing to create two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Starting,
    Running,
    Stopping,
}

struct BroadcastTopic {
    sender: broadcast::Sender<()>,
    listener_count: usize,
    state: ListenerState,
}

#[derive(Default)]
struct Registry {
    job_scheduled: HashMap<String, VecDeque<mpsc::UnboundedSender<u32>>>,
    chain_completed: HashMap<ChainId, BroadcastTopic>,
    ownership_lost: HashMap<JobId, BroadcastTopic>,
}

#[derive(Clone, Default)]
pub struct InProcessNotifyAdapter {
    registry: Arc<Mutex<Registry>>,
}

impl InProcessNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn listen_broadcast<K: std::hash::Hash + Eq + Copy>(
        topics: &mut HashMap<K, BroadcastTopic>,
        key: K,
    ) -> broadcast::Receiver<()> {
        let topic = topics.entry(key).or_insert_with(|| BroadcastTopic {
            sender: broadcast::channel(16).0,
            listener_count: 0,
            state: ListenerState::Starting,
        });
        topic.listener_count += 1;
        topic.state = ListenerState::Running;
        topic.sender.subscribe()
    }

    fn dispose_broadcast<K: std::hash::Hash + Eq>(registry: &Mutex<Registry>, pick: impl Fn(&mut Registry) -> &mut HashMap<K, BroadcastTopic>, key: K) {
        let mut guard = registry.lock();
        let topics = pick(&mut guard);
        if let Some(topic) = topics.get_mut(&key) {
            topic.listener_count = topic.listener_count.saturating_sub(1);
            if topic.listener_count == 0 {
                topic.state = ListenerState::Stopping;
                topics.remove(&key);
            }
        }
    }
}

#[async_trait]
impl NotifyAdapter for InProcessNotifyAdapter {
    async fn notify_job_scheduled(&self, type_name: &str, _count: u32) -> Result<(), NotifyError> {
        let mut registry = self.registry.lock();
        let queue = registry.job_scheduled.entry(type_name.to_string()).or_default();
        // Queue semantics: rotate through listeners, delivering to exactly
        // one per publish (spec §4.2 #1). A dead sender is dropped and the
        // next one in line is tried instead.
        while let Some(sender) = queue.pop_front() {
            if sender.send(1).is_ok() {
                queue.push_back(sender);
                break;
            }
        }
        Ok(())
    }

    async fn notify_job_chain_completed(&self, chain_id: ChainId) -> Result<(), NotifyError> {
        let registry = self.registry.lock();
        if let Some(topic) = registry.chain_completed.get(&chain_id) {
            let _ = topic.sender.send(());
        }
        Ok(())
    }

    async fn notify_job_ownership_lost(&self, job_id: JobId) -> Result<(), NotifyError> {
        let registry = self.registry.lock();
        if let Some(topic) = registry.ownership_lost.get(&job_id) {
            let _ = topic.sender.send(());
        }
        Ok(())
    }

    async fn listen_job_scheduled(&self, type_name: &str) -> Subscription<u32> {
        let (tx, rx) = mpsc::unbounded_channel();
        let type_name = type_name.to_string();
        self.registry.lock().job_scheduled.entry(type_name.clone()).or_default().push_back(tx);
        let registry = self.registry.clone();
        Subscription::new(rx, move || {
            let mut guard = registry.lock();
            if let Some(queue) = guard.job_scheduled.get_mut(&type_name) {
                queue.retain(|s| !s.is_closed());
            }
        })
    }

    async fn listen_job_chain_completed(&self, chain_id: ChainId) -> Subscription<()> {
        let mut broadcast_rx = Self::listen_broadcast(&mut self.registry.lock().chain_completed, chain_id);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while broadcast_rx.recv().await.is_ok() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        let registry = self.registry.clone();
        Subscription::new(rx, move || {
            Self::dispose_broadcast(&registry, |r| &mut r.chain_completed, chain_id);
        })
    }

    async fn listen_job_ownership_lost(&self, job_id: JobId) -> Subscription<()> {
        let mut broadcast_rx = Self::listen_broadcast(&mut self.registry.lock().ownership_lost, job_id);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while broadcast_rx.recv().await.is_ok() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        let registry = self.registry.clone();
        Subscription::new(rx, move || {
            Self::dispose_broadcast(&registry, |r| &mut r.ownership_lost, job_id);
        })
    }
}

#[cfg(test)]
#[path = "inprocess_tests.rs"]
mod tests;
