// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred-notification scope (spec §4.2, §9 design note: "batch
//! notifications raised during a transaction and only publish them once
//! it commits"). `Helper` and `Client` call the free functions below as
//! they mutate state; nothing is actually published until the enclosing
//! [`with_notify`] scope resolves `Ok`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use jc_core::{ChainId, JobId};
use jc_notify::NotifyAdapter;
use parking_lot::Mutex;

#[derive(Default)]
struct NotifyBuffer {
    job_type_counts: HashMap<String, u32>,
    chain_completions: Vec<ChainId>,
    ownership_losses: Vec<JobId>,
}

tokio::task_local! {
    static BUFFER: Arc<Mutex<NotifyBuffer>>;
}

/// Buffers a job-scheduled wake-up if a [`with_notify`] scope is active;
/// otherwise does nothing. Returns whether a scope was active, so
/// callers can fire `notify_context_absence` (spec §6) when it wasn't.
pub fn notify_job_scheduled(type_name: &str) -> bool {
    BUFFER
        .try_with(|buffer| {
            *buffer.lock().job_type_counts.entry(type_name.to_string()).or_insert(0) += 1;
        })
        .is_ok()
}

/// Buffers a chain-completed broadcast. See [`notify_job_scheduled`].
pub fn notify_job_chain_completed(chain_id: ChainId) -> bool {
    BUFFER.try_with(|buffer| buffer.lock().chain_completions.push(chain_id)).is_ok()
}

/// Buffers an ownership-lost broadcast. See [`notify_job_scheduled`].
pub fn notify_job_ownership_lost(job_id: JobId) -> bool {
    BUFFER.try_with(|buffer| buffer.lock().ownership_losses.push(job_id)).is_ok()
}

/// Runs `f` inside a deferred-notification scope: every `notify_*` call
/// above made while `f` runs is buffered, then flushed through `notify`
/// once `f` resolves `Ok`. On `Err` the buffer is dropped unpublished —
/// a rolled-back transaction should not wake workers for state that
/// never took effect.
///
/// Nesting is a no-op: an inner `with_notify` reuses the outer scope's
/// buffer instead of flushing early, since only the outermost
/// transaction's commit/rollback decides what actually happened.
pub async fn with_notify<N, F, Fut, T, E>(notify: &N, f: F) -> Result<T, E>
where
    N: NotifyAdapter,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if BUFFER.try_with(|_| ()).is_ok() {
        return f().await;
    }

    let buffer = Arc::new(Mutex::new(NotifyBuffer::default()));
    let result = BUFFER.scope(buffer.clone(), f()).await;

    if result.is_ok() {
        flush(notify, &buffer).await;
    }

    result
}

async fn flush<N: NotifyAdapter>(notify: &N, buffer: &Arc<Mutex<NotifyBuffer>>) {
    let NotifyBuffer { job_type_counts, chain_completions, ownership_losses } =
        std::mem::take(&mut *buffer.lock());

    for (type_name, count) in job_type_counts {
        if let Err(err) = notify.notify_job_scheduled(&type_name, count).await {
            tracing::warn!(type_name = %type_name, %err, "failed to publish job-scheduled notification");
        }
    }
    for chain_id in chain_completions {
        if let Err(err) = notify.notify_job_chain_completed(chain_id).await {
            tracing::warn!(%chain_id, %err, "failed to publish chain-completed notification");
        }
    }
    for job_id in ownership_losses {
        if let Err(err) = notify.notify_job_ownership_lost(job_id).await {
            tracing::warn!(%job_id, %err, "failed to publish ownership-lost notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jc_core::ContractError;
    use jc_notify::FakeNotifyAdapter;

    #[tokio::test]
    async fn buffers_until_scope_resolves_ok() {
        let notify = FakeNotifyAdapter::new();
        with_notify(&notify, || async {
            assert!(notify_job_scheduled("greet"));
            assert!(notify_job_scheduled("greet"));
            Ok::<_, ContractError>(())
        })
        .await
        .unwrap();
        assert_eq!(notify.calls().len(), 1);
    }

    #[tokio::test]
    async fn discards_buffer_on_err() {
        let notify = FakeNotifyAdapter::new();
        let result = with_notify(&notify, || async {
            notify_job_scheduled("greet");
            Err::<(), _>(ContractError::JobNotFound(JobId::new()))
        })
        .await;
        assert!(result.is_err());
        assert!(notify.calls().is_empty());
    }

    #[tokio::test]
    async fn nested_scope_shares_the_outer_buffer() {
        let notify = FakeNotifyAdapter::new();
        with_notify(&notify, || async {
            notify_job_scheduled("outer");
            with_notify(&notify, || async {
                notify_job_scheduled("inner");
                Ok::<_, ContractError>(())
            })
            .await
        })
        .await
        .unwrap();
        assert_eq!(notify.calls().len(), 2);
    }

    #[test]
    fn outside_any_scope_is_a_no_op() {
        assert!(!notify_job_scheduled("greet"));
    }
}
