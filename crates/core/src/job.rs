// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and chain data model (spec §3).

use crate::ids::{ChainId, JobId, WorkerId};
use serde::{Deserialize, Serialize};

/// Status of a job. Transitions are restricted to:
/// `blocked -> pending -> running -> completed`, or `pending <-> running`
/// while retrying. `completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Blocked,
    Pending,
    Running,
    Completed,
}

crate::simple_display! {
    JobStatus {
        Blocked => "blocked",
        Pending => "pending",
        Running => "running",
        Completed => "completed",
    }
}

impl JobStatus {
    /// Whether `next` is a legal successor of `self` per spec.md §3 invariant 1.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Blocked, Pending)
                | (Pending, Running)
                | (Running, Pending)
                | (Running, Completed)
        )
    }
}

/// Configuration for creating a new job, mirroring the shape of
/// `StateAdapter::createJob`'s parameters (spec §4.1).
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub type_name: String,
    pub chain_id: Option<ChainId>,
    pub chain_type_name: String,
    pub chain_index: u64,
    pub input: serde_json::Value,
    pub origin_id: Option<JobId>,
    pub root_chain_id: Option<ChainId>,
    pub deduplication_key: Option<String>,
    pub scheduled_at_ms: u64,
    pub trace_context: Option<serde_json::Value>,
}

impl JobConfig {
    pub fn builder(type_name: impl Into<String>, chain_type_name: impl Into<String>) -> JobConfigBuilder {
        JobConfigBuilder {
            type_name: type_name.into(),
            chain_type_name: chain_type_name.into(),
            chain_id: None,
            chain_index: 0,
            input: serde_json::Value::Null,
            origin_id: None,
            root_chain_id: None,
            deduplication_key: None,
            scheduled_at_ms: 0,
            trace_context: None,
        }
    }
}

pub struct JobConfigBuilder {
    type_name: String,
    chain_type_name: String,
    chain_id: Option<ChainId>,
    chain_index: u64,
    input: serde_json::Value,
    origin_id: Option<JobId>,
    root_chain_id: Option<ChainId>,
    deduplication_key: Option<String>,
    scheduled_at_ms: u64,
    trace_context: Option<serde_json::Value>,
}

impl JobConfigBuilder {
    crate::setters! {
        set {
            input: serde_json::Value,
            chain_index: u64,
            scheduled_at_ms: u64,
        }
        option {
            chain_id: ChainId,
            origin_id: JobId,
            root_chain_id: ChainId,
            deduplication_key: String,
            trace_context: serde_json::Value,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            type_name: self.type_name,
            chain_id: self.chain_id,
            chain_type_name: self.chain_type_name,
            chain_index: self.chain_index,
            input: self.input,
            origin_id: self.origin_id,
            root_chain_id: self.root_chain_id,
            deduplication_key: self.deduplication_key,
            scheduled_at_ms: self.scheduled_at_ms,
            trace_context: self.trace_context,
        }
    }
}

/// A job instance (spec §3 "Job").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub type_name: String,
    pub chain_id: ChainId,
    pub chain_type_name: String,
    pub chain_index: u64,
    pub origin_id: Option<JobId>,
    pub root_chain_id: ChainId,
    pub input: serde_json::Value,
    pub output: Option<serde_json::Value>,
    pub status: JobStatus,
    pub scheduled_at_ms: u64,
    pub created_at_ms: u64,
    pub attempt: u32,
    pub last_attempt_at_ms: Option<u64>,
    pub last_attempt_error: Option<String>,
    pub leased_by: Option<WorkerId>,
    pub leased_until_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    /// `None` until completed; `Some(None)` is not representable, so a
    /// workerless completion is recorded as `completed_by: None` alongside
    /// `status == Completed` (distinguished from "never completed" by status).
    pub completed_by: Option<WorkerId>,
    pub deduplication_key: Option<String>,
    pub trace_context: Option<serde_json::Value>,
}

impl Job {
    /// A job is a chain head iff its id equals its chain_id (spec §3 GLOSSARY).
    pub fn is_chain_head(&self) -> bool {
        self.id == self.chain_id
    }

    pub fn is_root_chain(&self) -> bool {
        self.chain_id == self.root_chain_id
    }

    pub fn new(config: JobConfig, id: JobId, created_at_ms: u64) -> Self {
        let chain_id = config.chain_id.unwrap_or(id);
        let root_chain_id = config.root_chain_id.unwrap_or(chain_id);
        let status = JobStatus::Pending;
        Self {
            id,
            type_name: config.type_name,
            chain_id,
            chain_type_name: config.chain_type_name,
            chain_index: config.chain_index,
            origin_id: config.origin_id,
            root_chain_id,
            input: config.input,
            output: None,
            status,
            scheduled_at_ms: config.scheduled_at_ms,
            created_at_ms,
            attempt: 0,
            last_attempt_at_ms: None,
            last_attempt_error: None,
            leased_by: None,
            leased_until_ms: None,
            completed_at_ms: None,
            completed_by: None,
            deduplication_key: config.deduplication_key,
            trace_context: config.trace_context,
        }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            type_name: String = "greet",
            chain_type_name: String = "greet",
        }
        set {
            id: JobId = JobId::new(),
            chain_id: JobId = JobId::new(),
            root_chain_id: JobId = JobId::new(),
            chain_index: u64 = 0,
            input: serde_json::Value = serde_json::Value::Null,
            status: JobStatus = JobStatus::Pending,
            scheduled_at_ms: u64 = 0,
            created_at_ms: u64 = 0,
            attempt: u32 = 0,
        }
        option {
            output: serde_json::Value = None,
            origin_id: JobId = None,
            last_attempt_at_ms: u64 = None,
            last_attempt_error: String = None,
            leased_by: WorkerId = None,
            leased_until_ms: u64 = None,
            completed_at_ms: u64 = None,
            completed_by: WorkerId = None,
            deduplication_key: String = None,
            trace_context: serde_json::Value = None,
        }
    }
}

/// Many-to-many relation: `job_id` cannot become `pending` until
/// `blocked_by_chain_id` completes (spec §3 "JobBlocker").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBlocker {
    pub job_id: JobId,
    pub blocked_by_chain_id: ChainId,
    pub blocker_trace_context: Option<serde_json::Value>,
}

/// Coarse chain-level status, derived (never stored) from the current job's
/// status and whether it continued (spec §3 "Chain").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Blocked,
    Pending,
    Running,
    Completed,
}

crate::simple_display! {
    ChainStatus {
        Blocked => "blocked",
        Pending => "pending",
        Running => "running",
        Completed => "completed",
    }
}

impl From<JobStatus> for ChainStatus {
    fn from(s: JobStatus) -> Self {
        match s {
            JobStatus::Blocked => ChainStatus::Blocked,
            JobStatus::Pending => ChainStatus::Pending,
            JobStatus::Running => ChainStatus::Running,
            JobStatus::Completed => ChainStatus::Completed,
        }
    }
}

/// Read-model view of a chain: head + current job, derived status, and
/// the current job's outstanding blockers (supplemented per SPEC_FULL.md
/// §C — none of this is a stored record; it is assembled at read time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobChain {
    pub head: Job,
    pub current: Job,
    pub status: ChainStatus,
    pub blockers: Vec<JobBlocker>,
}

impl JobChain {
    pub fn new(head: Job, current: Job, blockers: Vec<JobBlocker>) -> Self {
        let status = current.status.into();
        Self { head, current, status, blockers }
    }

    pub fn chain_id(&self) -> ChainId {
        self.head.chain_id
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
