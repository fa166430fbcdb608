// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration structs for the worker runtime (spec §4.4, §4.7, §4.6).
//! Plain `Clone + Debug` carriers with `Default` impls holding the
//! numeric defaults spec.md names, generated with [`jc_core::setters!`]
//! rather than hand-rolled, matching the teacher's config-struct
//! convention.

use std::time::Duration;

/// Lease tuning for one attempt (spec §4.4 "lease config {leaseMs,
/// renewIntervalMs}"). No default is named in spec.md for these two
/// numbers; 30s/10s mirrors a renewal cadence comfortably inside the
/// lease window under the default worker poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseConfig {
    pub lease_ms: u64,
    pub renew_interval_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self { lease_ms: 30_000, renew_interval_ms: 10_000 }
    }
}

impl LeaseConfig {
    pub fn new(lease_ms: u64, renew_interval_ms: u64) -> Self {
        Self { lease_ms, renew_interval_ms }
    }
}

/// Exponential backoff tuning shared by the handler-retry computation
/// (spec §4.3 `handleJobHandlerError`) and the worker loop's own backoff
/// on adapter exceptions (spec §4.7 step 4). Distinct from
/// [`jc_storage::RetryConfig`], which tunes *transient adapter-call*
/// retries rather than *job attempt* backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlerRetryConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for HandlerRetryConfig {
    fn default() -> Self {
        Self { initial_delay_ms: 1_000, max_delay_ms: 30_000, multiplier: 2.0 }
    }
}

impl HandlerRetryConfig {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64, multiplier: f64) -> Self {
        Self { initial_delay_ms, max_delay_ms, multiplier }
    }

    /// Backoff delay for the attempt that just failed, counting from 1.
    /// `attempt` is the job's post-increment attempt counter (spec §3
    /// "attempt ... incremented on each acquire"), so the first failure
    /// (attempt=1) backs off by exactly `initial_delay_ms`.
    pub fn delay_ms_for_attempt(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        (scaled.min(self.max_delay_ms as f64)) as u64
    }

    /// Jittered delay (±10%), matching the worker loop's `sleep(min(...),
    /// jitter=10%)` (spec §4.7 step 3) and the retry pattern used
    /// elsewhere in the corpus (`rand::rng().random_range(0.9..1.1)`).
    pub fn jittered_duration_for_attempt(&self, attempt: u32) -> Duration {
        jitter(self.delay_ms_for_attempt(attempt))
    }
}

/// Applies a ±10% jitter to a millisecond duration.
pub fn jitter(millis: u64) -> Duration {
    let factor = rand::Rng::random_range(&mut rand::rng(), 0.9..1.1);
    Duration::from_millis(((millis as f64) * factor) as u64)
}

/// Tuning for [`crate::client::Client::wait_for_job_chain_completion`]
/// (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 15_000 }
    }
}

/// Worker construction defaults (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub poll_interval_ms: u64,
    pub lease: LeaseConfig,
    pub worker_loop_retry: HandlerRetryConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval_ms: 60_000,
            lease: LeaseConfig::default(),
            worker_loop_retry: HandlerRetryConfig::default(),
        }
    }
}

impl WorkerConfig {
    jc_core::setters! {
        set {
            concurrency: usize,
            poll_interval_ms: u64,
            lease: LeaseConfig,
            worker_loop_retry: HandlerRetryConfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_from_first_failure() {
        let cfg = HandlerRetryConfig::new(100, 10_000, 2.0);
        assert_eq!(cfg.delay_ms_for_attempt(1), 100);
        assert_eq!(cfg.delay_ms_for_attempt(2), 200);
        assert_eq!(cfg.delay_ms_for_attempt(3), 400);
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let cfg = HandlerRetryConfig::new(100, 100, 5.0);
        assert_eq!(cfg.delay_ms_for_attempt(10), 100);
    }

    #[test]
    fn default_wait_poll_interval_matches_spec() {
        assert_eq!(WaitConfig::default().poll_interval_ms, 15_000);
    }

    #[test]
    fn default_worker_poll_interval_matches_spec() {
        assert_eq!(WorkerConfig::default().poll_interval_ms, 60_000);
    }
}
