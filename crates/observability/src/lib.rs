// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ObservabilityAdapter` port (spec §6) and its reference backends.
//!
//! The contract is a fixed set of lifecycle event names plus a handful of
//! duration/idle measurements — deliberately not a generic "log anything"
//! sink, so that every call site names one of the events spec.md actually
//! enumerates.

pub mod event;
pub mod noop;
pub mod port;
pub mod tracing_adapter;

pub use event::{DurationMetric, LifecycleEvent};
pub use noop::NoopObservabilityAdapter;
pub use port::ObservabilityAdapter;
pub use tracing_adapter::TracingObservabilityAdapter;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeObservabilityAdapter;
