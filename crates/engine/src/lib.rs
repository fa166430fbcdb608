// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jc-engine: the durable job-chain orchestration runtime.
//!
//! Composes [`jc_storage::StateAdapter`], [`jc_notify::NotifyAdapter`],
//! [`jc_observability::ObservabilityAdapter`] and [`jc_core::JobTypeRegistry`]
//! into the engine core described by spec.md §4: a deferred-notification
//! scope ([`notify_context`]), the state-machine helper ([`helper`]), a
//! per-attempt runtime ([`attempt`]), the worker loop ([`worker`]), a
//! bounded-concurrency primitive ([`parallel_executor`]), a lease-renewal
//! driver ([`lease_manager`]), a serialized long-lived transaction wrapper
//! ([`transaction`]), and the user-facing [`client`].
//!
//! [`Engine`] is the single struct holding the adapters (spec §9 design
//! note: "re-architect [Client/Worker/Helper] as a single Engine struct
//! holding the adapters; Client and Worker are thin view facades over
//! it").

pub mod attempt;
pub mod client;
pub mod config;
pub mod engine;
pub mod helper;
pub mod lease_manager;
pub mod middleware;
pub mod notify_context;
pub mod parallel_executor;
pub mod transaction;
pub mod types;
pub mod worker;

pub use attempt::{AttemptError, AttemptOutcome, AttemptRuntime, CancelReason, JobHandle, RescheduleJobError};
pub use client::{Client, StartedJobChain, WorkerlessOutcome};
pub use config::{HandlerRetryConfig, LeaseConfig, WaitConfig, WorkerConfig};
pub use engine::Engine;
pub use middleware::{HandlerFn, Middleware, Next};
pub use notify_context::with_notify;
pub use parallel_executor::{ExecutorError, ParallelExecutor};
pub use transaction::TransactionContext;
pub use types::{BlockerRef, ContinueWithRequest, CreateJobRequest};
pub use worker::{TypeHandler, Worker};
