// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter and result types for `StateAdapter` operations (spec §4.1).

use jc_core::{ChainId, DeduplicationOptions, Job, JobId, ScheduleOptions};
use std::collections::HashMap;

/// Arguments to `StateAdapter::create_job`. `chain_id == None` means "create
/// a chain head"; otherwise this is a continuation and `chain_index` must
/// equal the chain's current max index + 1.
#[derive(Debug, Clone)]
pub struct CreateJobParams {
    pub type_name: String,
    pub chain_id: Option<ChainId>,
    pub chain_type_name: String,
    pub chain_index: u64,
    pub input: serde_json::Value,
    pub origin_id: Option<JobId>,
    pub root_chain_id: Option<ChainId>,
    pub deduplication: Option<DeduplicationOptions>,
    pub schedule: ScheduleOptions,
    pub trace_context: Option<serde_json::Value>,
}

impl CreateJobParams {
    pub fn chain_head(type_name: impl Into<String>, input: serde_json::Value) -> Self {
        let type_name = type_name.into();
        Self {
            chain_type_name: type_name.clone(),
            type_name,
            chain_id: None,
            chain_index: 0,
            input,
            origin_id: None,
            root_chain_id: None,
            deduplication: None,
            schedule: ScheduleOptions::default(),
            trace_context: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateJobResult {
    pub job: Job,
    pub deduplicated: bool,
}

#[derive(Debug, Clone)]
pub struct AddJobBlockersResult {
    pub job: Job,
    pub incomplete_blocker_chain_ids: Vec<ChainId>,
    pub blocker_chain_trace_contexts: HashMap<ChainId, Option<serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub struct UnblockedJob {
    pub job: Job,
    pub blocker_trace_context: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct AcquireResult {
    pub job: Option<Job>,
    /// Best-effort hint that more eligible jobs exist beyond the one returned.
    pub has_more: bool,
}
