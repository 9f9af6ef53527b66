//! Bounded-concurrency worker pool for outbound requests.
//!
//! Every submitted unit runs on its own tokio task but must hold one of `N`
//! semaphore permits while it executes. tokio's semaphore is fair, so waiting
//! units are admitted in submission order. The queue of waiting units is
//! unbounded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Errors from running a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The unit panicked or its task was cancelled.
    #[error("worker aborted: {0}")]
    Aborted(String),

    #[error("worker pool closed")]
    Closed,
}

/// Worker pool admitting at most `connections` units at a time.
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    permits: Arc<Semaphore>,
    connections: usize,
}

impl FetchScheduler {
    /// Create a pool of `connections` workers (at least one).
    pub fn new(connections: usize) -> Self {
        let connections = connections.max(1);
        Self { permits: Arc::new(Semaphore::new(connections)), connections }
    }

    /// Pool size.
    pub fn connections(&self) -> usize {
        self.connections
    }

    /// Workers currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue `work`; it starts once a worker is free.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, work: F) -> Submission<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.map_err(|_| SchedulerError::Closed)?;
            Ok(work.await)
        });
        Submission { handle }
    }
}

/// Completion of a submitted unit.
#[must_use = "a submission does nothing useful unless awaited"]
pub struct Submission<T> {
    handle: JoinHandle<Result<T, SchedulerError>>,
}

impl<T> Future for Submission<T> {
    type Output = Result<T, SchedulerError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(SchedulerError::Aborted(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
