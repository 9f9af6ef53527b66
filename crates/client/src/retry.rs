//! Retry state machine tying the worker pool, the transport and failure
//! classification together.
//!
//! ```text
//! Init -> Queued -> Executing -> Success
//!                             -> PermanentFailure            (terminal)
//!                             -> TransientFailure -> backoff -> Queued
//! ```
//!
//! - Exactly `max_attempts` attempts are permitted; the ceiling is checked
//!   before each one.
//! - Unreachable destinations (connection refused, name resolution) end the
//!   task at once.
//! - Anything else, including a status other than 200, is transient and is
//!   retried after a fixed backoff.
//! - Attempts of one task are strictly sequential.

use std::sync::Arc;
use std::time::Duration;

use scrapyard_core::Error;

use crate::fetch::{FetchReply, FetchRequest, RequestDescriptor, Transport, TransportError};
use crate::parse::ResultType;
use crate::scheduler::{FetchScheduler, SchedulerError};

/// Pause between a transient failure and the next attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Retryable or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Why a single attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("response status code {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl AttemptFailure {
    pub fn class(&self) -> FailureClass {
        match self {
            AttemptFailure::Transport(e) if e.is_unreachable() => FailureClass::Permanent,
            _ => FailureClass::Transient,
        }
    }
}

/// One logical request travelling through the state machine.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub identity: String,
    pub request: FetchRequest,
    pub result_type: ResultType,
    /// 1-based number of the attempt about to run.
    pub attempt: u32,
}

impl FetchTask {
    pub fn new(descriptor: &RequestDescriptor) -> Self {
        Self {
            identity: descriptor.identity(),
            request: descriptor.to_request(),
            result_type: descriptor.result_type,
            attempt: 1,
        }
    }
}

/// Drives tasks through the worker pool until they succeed or fail for good.
#[derive(Clone)]
pub struct RetryOrchestrator {
    scheduler: FetchScheduler,
    transport: Arc<dyn Transport>,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryOrchestrator {
    pub fn new(scheduler: FetchScheduler, transport: Arc<dyn Transport>, max_attempts: u32) -> Self {
        Self { scheduler, transport, max_attempts, backoff: DEFAULT_BACKOFF }
    }

    /// Override the pause between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn scheduler(&self) -> &FetchScheduler {
        &self.scheduler
    }

    /// Run `task` to its terminal state.
    ///
    /// The loop's `break` value is the only place a result is produced.
    pub async fn run(&self, mut task: FetchTask) -> Result<FetchReply, Error> {
        loop {
            if task.attempt > self.max_attempts {
                tracing::debug!(url = %task.request.url, attempt = task.attempt, "retry ceiling reached, giving up");
                break Err(Error::RetriesExhausted {
                    identity: task.identity,
                    attempts: task.attempt.saturating_sub(1),
                    last: "no attempts left".into(),
                });
            }

            let failure = match self.attempt(&task).await {
                Ok(reply) => break Ok(reply),
                Err(failure) => failure,
            };

            match failure.class() {
                FailureClass::Permanent => {
                    tracing::debug!(url = %task.request.url, error = %failure, "unrecoverable error");
                    break Err(Error::PermanentNetwork { identity: task.identity, message: failure.to_string() });
                }
                FailureClass::Transient if task.attempt == self.max_attempts => {
                    tracing::debug!(url = %task.request.url, attempt = task.attempt, error = %failure, "giving up");
                    break Err(Error::RetriesExhausted {
                        identity: task.identity,
                        attempts: task.attempt,
                        last: failure.to_string(),
                    });
                }
                FailureClass::Transient => {
                    tracing::debug!(url = %task.request.url, attempt = task.attempt, error = %failure, "retrying");
                    tokio::time::sleep(self.backoff).await;
                    task.attempt += 1;
                }
            }
        }
    }

    /// Execute one attempt on the worker pool.
    async fn attempt(&self, task: &FetchTask) -> Result<FetchReply, AttemptFailure> {
        let transport = Arc::clone(&self.transport);
        let request = task.request.clone();

        let reply = self
            .scheduler
            .submit(async move { transport.send(&request).await })
            .await??;

        if reply.is_ok() { Ok(reply) } else { Err(AttemptFailure::Status(reply.status)) }
    }
}
