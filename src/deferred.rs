//! Handle to an in-flight request.
//!
//! The request runs on its own task as soon as it is issued. Awaiting the
//! handle yields its result; dropping it (or calling `detach`) lets the
//! request finish unobserved. Requests are never cancelled.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

use crate::error::SyncError;

#[must_use = "await the request or call `detach` to let it finish unobserved"]
pub struct Deferred<T> {
    handle: JoinHandle<Result<T, SyncError>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Start `request` immediately.
    pub fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(request),
        }
    }

    /// A handle that is already resolved.
    pub fn ready(result: Result<T, SyncError>) -> Self {
        Self::spawn(async move { result })
    }
}

impl<T> Deferred<T> {
    /// Stop observing the request. It still runs to completion.
    pub fn detach(self) {}

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, SyncError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(SyncError::Interrupted(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
