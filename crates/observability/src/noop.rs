// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discards everything. Useful for benchmarks and embedders who don't
//! want tracing subscriber setup as a hard dependency.

use crate::event::{DurationMetric, LifecycleEvent};
use crate::port::ObservabilityAdapter;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObservabilityAdapter;

impl NoopObservabilityAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObservabilityAdapter for NoopObservabilityAdapter {
    async fn record_event(&self, _event: LifecycleEvent) {}
    async fn record_duration(&self, _metric: DurationMetric, _type_name: &str, _millis: u64) {}
    async fn record_idle(&self, _type_name: &str, _millis: u64) {}
}
