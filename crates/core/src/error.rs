// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract errors at the system boundary (spec §6/§7).
//!
//! These are the only public error kinds. Everything else (adapter
//! transport errors, registry plumbing) is wrapped into one of these
//! before crossing a `Helper`/`Client` API boundary.

use crate::ids::{ChainId, JobId, WorkerId};
use thiserror::Error;

/// A code identifying why `JobTypeValidationError` was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    NotEntryPoint,
    InvalidContinuation,
    InvalidBlockers,
    InvalidInput,
    InvalidOutput,
}

crate::simple_display! {
    ValidationCode {
        NotEntryPoint => "not_entry_point",
        InvalidContinuation => "invalid_continuation",
        InvalidBlockers => "invalid_blockers",
        InvalidInput => "invalid_input",
        InvalidOutput => "invalid_output",
    }
}

/// The four contract error kinds named in spec §6, plus the validation
/// error's structured cause. Match by variant, not by dynamic type
/// (spec §9 design note).
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("job {job_id} was already completed")]
    JobAlreadyCompleted { job_id: JobId },

    /// `leased_by` is `None` when the job is not currently held by anyone
    /// (e.g. a reap raced ahead of this renewal) — still a mismatch against
    /// `worker_id` per spec §4.1, just with nothing to name as the holder.
    #[error("job {job_id} is not held by {worker_id} (held by {leased_by:?})")]
    JobTakenByAnotherWorker {
        job_id: JobId,
        worker_id: WorkerId,
        leased_by: Option<WorkerId>,
    },

    #[error("chain {chain_id} did not complete within {timeout_ms}ms")]
    WaitForJobChainCompletionTimeout { chain_id: ChainId, timeout_ms: u64 },

    #[error("job type validation failed ({code}) for type {type_name}: {details}")]
    JobTypeValidation {
        code: ValidationCode,
        type_name: String,
        details: String,
    },

    /// Not one of the four contract kinds above — this is the retry
    /// wrapper's own signal (spec §7.2) that a transient backend failure
    /// survived every retry attempt. A correctly configured retry wrapper
    /// absorbs transient failures silently; this variant only reaches a
    /// caller when the backend is still unavailable after backoff.
    #[error("storage adapter unavailable after retries: {0}")]
    Transient(String),

    /// `Client::delete_job_chains` was given an id that is not itself a
    /// chain head whose chain is its own root (spec §4.6 "verifies every
    /// supplied id is a root"). Not one of spec §6's four named kinds —
    /// that list predates the supplemented delete-chains operation.
    #[error("chain {chain_id} is not a root chain")]
    NotARootChain { chain_id: ChainId },

    /// `Client::delete_job_chains` refused because jobs outside the
    /// requested root chains are still blocked on jobs inside them (spec
    /// §4.6 "fails otherwise with a descriptive error listing the
    /// external root chain ids").
    #[error("refusing to delete: jobs outside the requested chains are blocked on them (external root chains: {external_root_chain_ids:?})")]
    DeleteWouldOrphanExternalBlockers { external_root_chain_ids: Vec<ChainId> },
}

impl ContractError {
    /// The three "ignored" kinds per spec §4.3 `handleJobHandlerError`: the
    /// attempt is no longer authoritative, so no state mutation follows.
    pub fn is_ignored_on_handler_error(&self) -> bool {
        matches!(
            self,
            ContractError::JobTakenByAnotherWorker { .. }
                | ContractError::JobAlreadyCompleted { .. }
                | ContractError::JobNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_kinds_are_exactly_the_three_named_in_spec() {
        let job_id = JobId::new();
        assert!(ContractError::JobNotFound(job_id).is_ignored_on_handler_error());
        assert!(ContractError::JobAlreadyCompleted { job_id }.is_ignored_on_handler_error());
        assert!(ContractError::JobTakenByAnotherWorker {
            job_id,
            worker_id: WorkerId::new(),
            leased_by: Some(WorkerId::new()),
        }
        .is_ignored_on_handler_error());
        assert!(!ContractError::WaitForJobChainCompletionTimeout {
            chain_id: job_id,
            timeout_ms: 0,
        }
        .is_ignored_on_handler_error());
    }
}
