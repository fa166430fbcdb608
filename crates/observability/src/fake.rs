// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double recording every call for assertions in `jc-engine`'s tests.

use crate::event::{DurationMetric, LifecycleEvent};
use crate::port::ObservabilityAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum RecordedCall {
    Event(LifecycleEvent),
    Duration { metric: DurationMetric, type_name: String, millis: u64 },
    Idle { type_name: String, millis: u64 },
}

#[derive(Clone, Default)]
pub struct FakeObservabilityAdapter {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeObservabilityAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Event(e) => Some(e.name()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ObservabilityAdapter for FakeObservabilityAdapter {
    async fn record_event(&self, event: LifecycleEvent) {
        self.calls.lock().push(RecordedCall::Event(event));
    }

    async fn record_duration(&self, metric: DurationMetric, type_name: &str, millis: u64) {
        self.calls.lock().push(RecordedCall::Duration { metric, type_name: type_name.to_string(), millis });
    }

    async fn record_idle(&self, type_name: &str, millis: u64) {
        self.calls.lock().push(RecordedCall::Idle { type_name: type_name.to_string(), millis });
    }
}
