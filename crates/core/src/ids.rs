// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for jobs and workers.

crate::define_id! {
    /// Unique identifier for a job instance.
    ///
    /// A job's `id` also serves as its `chainId` when the job is a chain
    /// head (see `Job::is_chain_head`).
    pub struct JobId("job-");
}

/// A chain is identified by its head job's id. `ChainId` is a type alias
/// rather than a distinct newtype so that `job.chain_id == job.id` for a
/// head job can be checked without conversion, matching spec.md §3's
/// "Chain" definition (no separate chain record exists).
pub type ChainId = JobId;

crate::define_id! {
    /// Unique identifier for a worker process/instance.
    pub struct WorkerId("wkr-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
