// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NotifyAdapter` port (spec §4.2) and its reference backends.
//!
//! Three logical channels: job-scheduled (queue-like, single receiver per
//! publish), job-chain-completed and job-ownership-lost (broadcast, every
//! waiting listener wakes). A no-op backend is the default when nothing is
//! configured; an in-process backend backs the integration tests and any
//! single-node deployment that doesn't need a real message broker.

pub mod inprocess;
pub mod noop;
pub mod port;

pub use inprocess::InProcessNotifyAdapter;
pub use noop::NoopNotifyAdapter;
pub use port::{NotifyAdapter, NotifyError, Subscription};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, RecordedNotification};
