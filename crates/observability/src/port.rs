// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `ObservabilityAdapter` trait (spec §6).

use crate::event::{DurationMetric, LifecycleEvent};
use async_trait::async_trait;

/// Observability is fire-and-forget from the engine's point of view:
/// these calls never fail and never block the caller on network I/O.
/// `async_trait` is still used (rather than a plain sync trait) so
/// backends that do batch/flush to a remote collector can do so without
/// forcing the engine onto `spawn_blocking`.
#[async_trait]
pub trait ObservabilityAdapter: Send + Sync + 'static {
    /// Record that `event` happened.
    async fn record_event(&self, event: LifecycleEvent);

    /// Record a duration sample (milliseconds) for `metric`, scoped to
    /// `type_name`.
    async fn record_duration(&self, metric: DurationMetric, type_name: &str, millis: u64);

    /// Record how long a job of `type_name` sat eligible-but-unacquired
    /// before a worker picked it up (spec §6 "per-type idle... durations").
    async fn record_idle(&self, type_name: &str, millis: u64);
}
