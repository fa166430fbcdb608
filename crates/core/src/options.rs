// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule and deduplication options (spec §6).

use serde::{Deserialize, Serialize};

/// `{ at?: timestamp; afterMs?: integer }`. If both given, `at` wins.
/// If neither, the resolved time is `now`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub at_ms: Option<u64>,
    pub after_ms: Option<u64>,
}

impl ScheduleOptions {
    pub fn at(at_ms: u64) -> Self {
        Self { at_ms: Some(at_ms), after_ms: None }
    }

    pub fn after(after_ms: u64) -> Self {
        Self { at_ms: None, after_ms: Some(after_ms) }
    }

    /// Resolve against the current time, per spec §4.1 `createJob` and
    /// §6 "Schedule options".
    pub fn resolve(&self, now_ms: u64) -> u64 {
        if let Some(at) = self.at_ms {
            at
        } else if let Some(after) = self.after_ms {
            now_ms + after
        } else {
            now_ms
        }
    }
}

/// Deduplication scope: `incomplete` matches only non-completed rows,
/// `all` matches any row (spec §4.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeduplicationScope {
    #[default]
    Incomplete,
    All,
}

/// `{ key: string; scope?: "incomplete"|"all" = "incomplete"; windowMs?: integer }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduplicationOptions {
    pub key: String,
    #[serde(default)]
    pub scope: DeduplicationScope,
    pub window_ms: Option<u64>,
}

impl DeduplicationOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), scope: DeduplicationScope::default(), window_ms: None }
    }

    pub fn scope(mut self, scope: DeduplicationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = Some(window_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_wins_over_after_ms_when_both_given() {
        let s = ScheduleOptions { at_ms: Some(500), after_ms: Some(100) };
        assert_eq!(s.resolve(1_000), 500);
    }

    #[test]
    fn after_ms_adds_to_now() {
        let s = ScheduleOptions::after(250);
        assert_eq!(s.resolve(1_000), 1_250);
    }

    #[test]
    fn neither_resolves_to_now() {
        let s = ScheduleOptions::default();
        assert_eq!(s.resolve(1_000), 1_000);
    }

    #[test]
    fn default_dedup_scope_is_incomplete() {
        let d = DeduplicationOptions::new("k");
        assert_eq!(d.scope, DeduplicationScope::Incomplete);
    }
}
