// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-row operations over [`super::MaterializedState`] (spec §4.1).

use super::MaterializedState;
use crate::params::{AcquireResult, CreateJobParams, CreateJobResult};
use jc_core::{ContractError, DeduplicationOptions, DeduplicationScope, Job, JobConfig, JobId, JobStatus, ScheduleOptions, WorkerId};

pub(crate) fn create_job(state: &mut MaterializedState, now_ms: u64, params: CreateJobParams) -> CreateJobResult {
    if let Some(dedup) = &params.deduplication {
        if let Some(existing) = find_dedup_match(state, dedup, now_ms) {
            return CreateJobResult { job: existing, deduplicated: true };
        }
    }

    let id = JobId::new();
    let scheduled_at_ms = params.schedule.resolve(now_ms).max(now_ms);
    let config = JobConfig {
        type_name: params.type_name,
        chain_id: params.chain_id,
        chain_type_name: params.chain_type_name,
        chain_index: params.chain_index,
        input: params.input,
        origin_id: params.origin_id,
        root_chain_id: params.root_chain_id,
        deduplication_key: params.deduplication.map(|d| d.key),
        scheduled_at_ms,
        trace_context: params.trace_context,
    };
    let job = Job::new(config, id, now_ms);
    state.jobs.insert(id, job.clone());
    CreateJobResult { job, deduplicated: false }
}

fn find_dedup_match(state: &MaterializedState, dedup: &DeduplicationOptions, now_ms: u64) -> Option<Job> {
    let window_floor = dedup.window_ms.map(|w| now_ms.saturating_sub(w));
    state
        .jobs
        .values()
        .filter(|j| j.is_chain_head())
        .filter(|j| j.deduplication_key.as_deref() == Some(dedup.key.as_str()))
        .filter(|j| match dedup.scope {
            DeduplicationScope::Incomplete => j.status != JobStatus::Completed,
            DeduplicationScope::All => true,
        })
        .filter(|j| match window_floor {
            Some(floor) => j.created_at_ms >= floor,
            None => true,
        })
        .max_by_key(|j| j.created_at_ms)
        .cloned()
}

pub(crate) fn acquire_job(
    state: &mut MaterializedState,
    now_ms: u64,
    type_names: &[String],
    worker_id: WorkerId,
    default_lease_ms: u64,
) -> AcquireResult {
    let mut eligible: Vec<JobId> = state
        .jobs
        .values()
        .filter(|j| {
            j.status == JobStatus::Pending
                && j.scheduled_at_ms <= now_ms
                && type_names.iter().any(|t| t == &j.type_name)
        })
        .map(|j| j.id)
        .collect();
    eligible.sort_by(|a, b| {
        let ja = &state.jobs[a];
        let jb = &state.jobs[b];
        ja.scheduled_at_ms.cmp(&jb.scheduled_at_ms).then_with(|| ja.id.as_str().cmp(jb.id.as_str()))
    });

    let has_more = eligible.len() > 1;
    let job = eligible.first().and_then(|id| state.jobs.get_mut(id)).map(|job| {
        job.status = JobStatus::Running;
        job.leased_by = Some(worker_id);
        job.leased_until_ms = Some(now_ms + default_lease_ms);
        job.attempt += 1;
        job.last_attempt_at_ms = Some(now_ms);
        job.clone()
    });
    AcquireResult { job, has_more }
}

pub(crate) fn renew_job_lease(
    state: &mut MaterializedState,
    now_ms: u64,
    job_id: JobId,
    worker_id: WorkerId,
    lease_duration_ms: u64,
) -> Result<Job, ContractError> {
    let job = state.jobs.get_mut(&job_id).ok_or(ContractError::JobNotFound(job_id))?;
    if job.status == JobStatus::Completed {
        return Err(ContractError::JobAlreadyCompleted { job_id });
    }
    if job.leased_by != Some(worker_id) {
        return Err(ContractError::JobTakenByAnotherWorker { job_id, worker_id, leased_by: job.leased_by });
    }
    job.leased_until_ms = Some(now_ms + lease_duration_ms);
    Ok(job.clone())
}

pub(crate) fn reschedule_job(
    state: &mut MaterializedState,
    now_ms: u64,
    job_id: JobId,
    schedule: ScheduleOptions,
    error: String,
) -> Result<Job, ContractError> {
    let job = state.jobs.get_mut(&job_id).ok_or(ContractError::JobNotFound(job_id))?;
    if job.status == JobStatus::Completed {
        return Err(ContractError::JobAlreadyCompleted { job_id });
    }
    job.status = JobStatus::Pending;
    job.leased_by = None;
    job.leased_until_ms = None;
    job.scheduled_at_ms = schedule.resolve(now_ms).max(job.scheduled_at_ms);
    job.last_attempt_error = Some(error);
    Ok(job.clone())
}

pub(crate) fn complete_job(
    state: &mut MaterializedState,
    now_ms: u64,
    job_id: JobId,
    output: serde_json::Value,
    worker_id: Option<WorkerId>,
) -> Result<Job, ContractError> {
    let job = state.jobs.get_mut(&job_id).ok_or(ContractError::JobNotFound(job_id))?;
    if job.status == JobStatus::Completed {
        return Err(ContractError::JobAlreadyCompleted { job_id });
    }
    match worker_id {
        Some(worker_id) if job.status == JobStatus::Running && job.leased_by != Some(worker_id) => {
            return Err(ContractError::JobTakenByAnotherWorker { job_id, worker_id, leased_by: job.leased_by });
        }
        _ => {}
    }
    job.status = JobStatus::Completed;
    job.output = Some(output);
    job.completed_at_ms = Some(now_ms);
    job.completed_by = worker_id;
    job.leased_by = None;
    job.leased_until_ms = None;
    Ok(job.clone())
}

pub(crate) fn remove_expired_job_lease(
    state: &mut MaterializedState,
    now_ms: u64,
    type_names: &[String],
    ignored_job_ids: &[JobId],
) -> Option<Job> {
    let expired_id = state
        .jobs
        .values()
        .filter(|j| {
            j.status == JobStatus::Running
                && j.leased_until_ms.is_some_and(|until| until < now_ms)
                && !ignored_job_ids.contains(&j.id)
                && type_names.iter().any(|t| t == &j.type_name)
        })
        .map(|j| j.id)
        .next()?;
    let job = state.jobs.get_mut(&expired_id)?;
    job.status = JobStatus::Pending;
    job.leased_by = None;
    job.leased_until_ms = None;
    Some(job.clone())
}

pub(crate) fn get_job_for_update(state: &MaterializedState, job_id: JobId) -> Result<Job, ContractError> {
    state.jobs.get(&job_id).cloned().ok_or(ContractError::JobNotFound(job_id))
}

pub(crate) fn get_current_job_for_update(
    state: &MaterializedState,
    chain_id: jc_core::ChainId,
) -> Result<Job, ContractError> {
    state
        .jobs
        .values()
        .filter(|j| j.chain_id == chain_id)
        .max_by_key(|j| j.chain_index)
        .cloned()
        .ok_or(ContractError::JobNotFound(chain_id))
}

pub(crate) fn get_next_job_available_in_ms(
    state: &MaterializedState,
    now_ms: u64,
    type_names: &[String],
) -> Option<u64> {
    state
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Pending && type_names.iter().any(|t| t == &j.type_name))
        .map(|j| j.scheduled_at_ms.saturating_sub(now_ms))
        .min()
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
