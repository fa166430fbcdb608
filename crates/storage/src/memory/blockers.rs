// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocker-row operations over [`super::MaterializedState`] (spec §4.1, §3).

use super::MaterializedState;
use crate::params::{AddJobBlockersResult, UnblockedJob};
use jc_core::{ChainId, ContractError, JobBlocker, JobId, JobStatus};
use std::collections::HashMap;

/// A chain is completed iff its current job (largest `chainIndex`) is
/// completed and did not continue (spec §3 "Chain").
fn is_chain_completed(state: &MaterializedState, chain_id: ChainId) -> bool {
    let Some(current) = state.jobs.values().filter(|j| j.chain_id == chain_id).max_by_key(|j| j.chain_index) else {
        return false;
    };
    if current.status != JobStatus::Completed {
        return false;
    }
    !state.jobs.values().any(|j| j.chain_id == chain_id && j.chain_index == current.chain_index + 1)
}

pub(crate) fn add_job_blockers(
    state: &mut MaterializedState,
    job_id: JobId,
    blocked_by_chain_ids: Vec<ChainId>,
    blocker_trace_contexts: Vec<Option<serde_json::Value>>,
) -> Result<AddJobBlockersResult, ContractError> {
    if !state.jobs.contains_key(&job_id) {
        return Err(ContractError::JobNotFound(job_id));
    }

    let mut new_rows = Vec::new();
    let mut incomplete = Vec::new();
    let mut trace_contexts = HashMap::new();
    for (i, chain_id) in blocked_by_chain_ids.into_iter().enumerate() {
        let trace_context = blocker_trace_contexts.get(i).cloned().flatten();
        new_rows.push(JobBlocker {
            job_id,
            blocked_by_chain_id: chain_id,
            blocker_trace_context: trace_context.clone(),
        });
        if !is_chain_completed(state, chain_id) {
            incomplete.push(chain_id);
            trace_contexts.insert(chain_id, trace_context);
        }
    }

    state.blockers.entry(job_id).or_default().extend(new_rows);
    let Some(job) = state.jobs.get_mut(&job_id) else {
        return Err(ContractError::JobNotFound(job_id));
    };
    if !incomplete.is_empty() {
        job.status = JobStatus::Blocked;
    }
    let job = job.clone();
    Ok(AddJobBlockersResult { job, incomplete_blocker_chain_ids: incomplete, blocker_chain_trace_contexts: trace_contexts })
}

pub(crate) fn schedule_blocked_jobs(state: &mut MaterializedState, blocked_by_chain_id: ChainId) -> Vec<UnblockedJob> {
    let mut newly_unblocked: Vec<JobId> = Vec::new();
    let mut trace_context_for: HashMap<JobId, Option<serde_json::Value>> = HashMap::new();

    for (job_id, rows) in state.blockers.iter_mut() {
        if let Some(pos) = rows.iter().position(|r| r.blocked_by_chain_id == blocked_by_chain_id) {
            let removed = rows.remove(pos);
            trace_context_for.insert(*job_id, removed.blocker_trace_context);
            if rows.is_empty() {
                newly_unblocked.push(*job_id);
            }
        }
    }
    // Deterministic order by jobId, per spec §4.1.
    newly_unblocked.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    newly_unblocked
        .into_iter()
        .filter_map(|job_id| {
            let job = state.jobs.get_mut(&job_id)?;
            if job.status == JobStatus::Blocked {
                job.status = JobStatus::Pending;
            }
            let job = job.clone();
            Some(UnblockedJob { job, blocker_trace_context: trace_context_for.remove(&job_id).flatten() })
        })
        .collect()
}

/// Current (unsatisfied) blocker rows for one job, in insertion order.
/// Backs the `JobChain` read model's `blockers` field (SPEC_FULL.md §C).
pub(crate) fn list_job_blockers(state: &MaterializedState, job_id: JobId) -> Vec<JobBlocker> {
    state.blockers.get(&job_id).cloned().unwrap_or_default()
}

pub(crate) fn get_external_blockers(state: &MaterializedState, root_chain_ids: &[ChainId]) -> Vec<JobBlocker> {
    state
        .blockers
        .values()
        .flatten()
        .filter(|blocker| root_chain_ids.contains(&blocker.blocked_by_chain_id))
        .filter(|blocker| match state.jobs.get(&blocker.job_id) {
            Some(job) => !root_chain_ids.contains(&job.root_chain_id),
            None => false,
        })
        .cloned()
        .collect()
}

/// Hard-deletes every job whose `rootChainId` is in `root_chain_ids`, plus
/// their blocker rows. The "refuse if externally blocked" contract is
/// enforced by the caller (`Client::delete_job_chains` probes
/// `get_external_blockers` first per spec §4.6); this operation trusts
/// that check rather than repeating it.
pub(crate) fn delete_jobs_by_root_chain_ids(state: &mut MaterializedState, root_chain_ids: &[ChainId]) -> u64 {
    let to_delete: Vec<JobId> =
        state.jobs.values().filter(|j| root_chain_ids.contains(&j.root_chain_id)).map(|j| j.id).collect();
    for id in &to_delete {
        state.jobs.remove(id);
        state.blockers.remove(id);
    }
    to_delete.len() as u64
}

#[cfg(test)]
#[path = "blockers_tests.rs"]
mod tests;
