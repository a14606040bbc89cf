//! The single-shot future returned by [`crate::engine::pool::Engine::submit`].

use crate::engine::pool::Engine;
use crate::engine::request::CompletionValue;
use crate::error::Error;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Resolves exactly once, to the outcome of the request it was created for.
///
/// Dropping this before it resolves does not cancel the underlying request
/// (spec §4.2/§5: the worker thread runs the blocking syscall to completion
/// regardless); it only stops the result from being delivered anywhere, via
/// [`Engine::forget`].
pub(crate) struct RawIoFuture {
    id: usize,
    engine: Arc<Engine>,
    path: Option<PathBuf>,
    resolved: bool,
}

impl RawIoFuture {
    pub(crate) fn new(id: usize, engine: Arc<Engine>, path: Option<PathBuf>) -> Self {
        Self {
            id,
            engine,
            path,
            resolved: false,
        }
    }
}

impl Future for RawIoFuture {
    type Output = Result<CompletionValue, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.engine.poll_request(this.id, cx, this.path.as_deref()) {
            Some(result) => {
                this.resolved = true;
                Poll::Ready(result)
            }
            None => Poll::Pending,
        }
    }
}

impl Drop for RawIoFuture {
    fn drop(&mut self) {
        if !self.resolved {
            self.engine.forget(self.id);
        }
    }
}
