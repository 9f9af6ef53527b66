//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::fetch::{FetchReply, FetchRequest, Transport, TransportError, TransportErrorCode};

pub(crate) type Outcome = Result<FetchReply, TransportError>;

pub(crate) fn ok(body: &str) -> Outcome {
    Ok(FetchReply::new(200, body.to_string()))
}

pub(crate) fn status(code: u16) -> Outcome {
    Ok(FetchReply::new(code, "error page"))
}

pub(crate) fn refused() -> Outcome {
    Err(TransportError::new(Some(TransportErrorCode::ConnectionRefused), "connection refused"))
}

pub(crate) fn timeout() -> Outcome {
    Err(TransportError::new(Some(TransportErrorCode::Timeout), "timed out"))
}

/// Replays outcomes in order, then repeats `fallback` forever.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn always(outcome: Outcome) -> Self {
        Self::scripted(Vec::new(), outcome)
    }

    pub(crate) fn scripted(script: Vec<Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        self.running.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
