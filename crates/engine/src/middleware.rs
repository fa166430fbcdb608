// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Middleware around every attempt (spec §4.8): cross-cutting behavior
//! (structured logging, per-tenant auth checks on a job's input, request
//! tagging) that should run for every job type a worker handles, without
//! every [`crate::worker::TypeHandler`] repeating it. Modeled as an onion
//! of `(handle, next)` steps, the same shape tower/axum middleware uses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::attempt::{AttemptError, JobHandle};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed per-attempt handler: either the innermost type handler or one
/// more layer of wrapped middleware.
pub type HandlerFn<S, O, R> = Arc<dyn Fn(JobHandle<S, O, R>) -> BoxFuture<'static, Result<(), AttemptError>> + Send + Sync>;

/// The remaining middleware chain, callable exactly once per attempt.
pub struct Next<S, O, R> {
    inner: HandlerFn<S, O, R>,
}

impl<S, O, R> Next<S, O, R> {
    pub(crate) fn new(inner: HandlerFn<S, O, R>) -> Self {
        Self { inner }
    }

    pub async fn run(self, handle: JobHandle<S, O, R>) -> Result<(), AttemptError> {
        (self.inner)(handle).await
    }
}

/// One layer of the onion. `call` decides whether/when to invoke `next`
/// (e.g. skip it entirely to short-circuit, or wrap it in timing/logging
/// before and after).
pub trait Middleware<S, O, R>: Send + Sync + 'static
where
    S: 'static,
    O: 'static,
    R: 'static,
{
    fn call(&self, handle: JobHandle<S, O, R>, next: Next<S, O, R>) -> BoxFuture<'static, Result<(), AttemptError>>;
}

/// Wraps `inner` with `middleware` layered outermost-first: the first
/// entry in `middleware` sees the attempt before any other layer and
/// after every other layer's post-processing.
pub(crate) fn chain<S, O, R>(
    middleware: &[Arc<dyn Middleware<S, O, R>>],
    inner: HandlerFn<S, O, R>,
) -> HandlerFn<S, O, R>
where
    S: Send + Sync + 'static,
    O: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    middleware.iter().rev().fold(inner, |next_fn, layer| {
        let layer = layer.clone();
        Arc::new(move |handle: JobHandle<S, O, R>| {
            let layer = layer.clone();
            let next = Next::new(next_fn.clone());
            Box::pin(async move { layer.call(handle, next).await }) as BoxFuture<'static, Result<(), AttemptError>>
        })
    })
}
