// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing request shapes for creating chain heads and continuations
//! (spec §4.6 `startJobChain`, §4.3 `continueWith`).

use jc_core::{ChainId, DeduplicationOptions, ScheduleOptions};
use serde_json::Value;

/// A reference to an already-started chain that must complete before a
/// job becomes eligible (spec §3 "JobBlocker", §4.1 `addJobBlockers`).
/// `type_name` is the blocker chain's head type, carried alongside the id
/// so [`jc_core::JobTypeRegistry::validate_blockers`] can check it
/// against the blocked job's declared blocker schema.
#[derive(Debug, Clone)]
pub struct BlockerRef {
    pub chain_id: ChainId,
    pub type_name: String,
    pub trace_context: Option<Value>,
}

impl BlockerRef {
    pub fn new(chain_id: ChainId, type_name: impl Into<String>) -> Self {
        Self { chain_id, type_name: type_name.into(), trace_context: None }
    }

    pub fn with_trace_context(mut self, trace_context: Value) -> Self {
        self.trace_context = Some(trace_context);
        self
    }
}

/// Request to start a new chain head (spec §4.6 `startJobChain`).
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub type_name: String,
    pub input: Value,
    pub blockers: Vec<BlockerRef>,
    pub schedule: ScheduleOptions,
    pub deduplication: Option<DeduplicationOptions>,
    pub trace_context: Option<Value>,
}

impl CreateJobRequest {
    pub fn new(type_name: impl Into<String>, input: Value) -> Self {
        Self {
            type_name: type_name.into(),
            input,
            blockers: Vec::new(),
            schedule: ScheduleOptions::default(),
            deduplication: None,
            trace_context: None,
        }
    }

    jc_core::setters! {
        set {
            schedule: ScheduleOptions,
        }
        option {
            deduplication: DeduplicationOptions,
            trace_context: Value,
        }
    }

    pub fn with_blocker(mut self, blocker: BlockerRef) -> Self {
        self.blockers.push(blocker);
        self
    }
}

/// Request to append a continuation from inside a completion callback
/// (spec §4.3 `continueWith`, §4.4 step 3).
#[derive(Debug, Clone)]
pub struct ContinueWithRequest {
    pub type_name: String,
    pub input: Value,
    pub trace_context: Option<Value>,
}

impl ContinueWithRequest {
    pub fn new(type_name: impl Into<String>, input: Value) -> Self {
        Self { type_name: type_name.into(), input, trace_context: None }
    }

    pub fn with_trace_context(mut self, trace_context: Value) -> Self {
        self.trace_context = Some(trace_context);
        self
    }
}
