//! Cache-or-network fetch orchestration.
//!
//! ```text
//! fetch(descriptor)
//!   -> fresh entry in ContentStore?  -> parse cached bytes
//!   -> RetryOrchestrator -> FetchScheduler -> Transport
//!        -> spawn ContentStore::put (best effort)
//!        -> parse
//! ```
//!
//! Store failures never reach the caller: an unreadable entry is a cache
//! miss and a failed write is only logged.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;

use scrapyard_core::{ContentStore, Error, ScrapyardConfig, StoreKey};

use crate::fetch::{HttpTransport, LegacyArg, RequestDescriptor, Transport};
use crate::parse::{Parsed, parse};
use crate::retry::{FetchTask, RetryOrchestrator};
use crate::scheduler::FetchScheduler;

/// Caching fetch orchestrator.
pub struct Scrapyard {
    retry: RetryOrchestrator,
    store: Option<ContentStore>,
    freshness: Duration,
    pending_writes: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Scrapyard {
    /// Create an orchestrator that talks HTTP through reqwest.
    pub fn new(config: &ScrapyardConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create an orchestrator over any transport.
    pub fn with_transport(config: &ScrapyardConfig, transport: Arc<dyn Transport>) -> Self {
        let scheduler = FetchScheduler::new(config.connections);
        let retry = RetryOrchestrator::new(scheduler, transport, config.retry);
        let store = config.cache.as_ref().map(ContentStore::open);

        if let Some(store) = &store {
            tracing::debug!(root = %store.root().display(), freshness = ?config.freshness, "cache enabled");
        }

        Self { retry, store, freshness: config.freshness, pending_writes: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Override the pause between retries.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.retry = self.retry.with_backoff(backoff);
        self
    }

    /// The cache, when enabled.
    pub fn store(&self) -> Option<&ContentStore> {
        self.store.as_ref()
    }

    pub fn scheduler(&self) -> &FetchScheduler {
        self.retry.scheduler()
    }

    /// Fetch and parse the resource described by `descriptor`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the URL is not an absolute http(s) URL
    /// - `Error::PermanentNetwork` if the destination is unreachable
    /// - `Error::RetriesExhausted` if every permitted attempt failed
    /// - `Error::Parse` if the payload does not decode as the requested type
    pub async fn fetch(&self, descriptor: &RequestDescriptor) -> Result<Parsed, Error> {
        descriptor.validate()?;
        let task = FetchTask::new(descriptor);

        let cache = self.store.as_ref().map(|store| (store, StoreKey::from_identity(&task.identity)));

        if let Some((store, key)) = &cache
            && let Some(bytes) = self.read_fresh(store, key, &descriptor.url).await
        {
            tracing::debug!(url = %descriptor.url, key = %key, "cache hit");
            return decode(&task, &bytes);
        }

        let reply = self.retry.run(task.clone()).await?;

        if let Some((store, key)) = cache {
            self.spawn_put(store.clone(), key, reply.body.clone(), descriptor.url.clone());
        }

        decode(&task, &reply.body)
    }

    /// Fetch using a legacy positional argument list.
    pub async fn fetch_legacy(&self, args: &[LegacyArg]) -> Result<Parsed, Error> {
        let descriptor = RequestDescriptor::from_legacy(args)?;
        self.fetch(&descriptor).await
    }

    /// Wait for every cache write spawned so far.
    pub async fn settle(&self) {
        let handles = match self.pending_writes.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Cached bytes for `key` if the entry is fresh and readable.
    async fn read_fresh(&self, store: &ContentStore, key: &StoreKey, url: &str) -> Option<Bytes> {
        if !store.is_fresh(key, self.freshness).await {
            return None;
        }

        match store.get(key).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                tracing::debug!(url = %url, key = %key, "cache entry vanished, fetching");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, key = %key, error = %e, "cache read failed, fetching");
                None
            }
        }
    }

    fn spawn_put(&self, store: ContentStore, key: StoreKey, body: Bytes, url: String) {
        let handle = tokio::spawn(async move {
            match store.put(&key, body).await {
                Ok(()) => tracing::debug!(url = %url, key = %key, "saved to cache"),
                Err(e) => tracing::warn!(url = %url, key = %key, error = %e, "cache write failed"),
            }
        });

        if let Ok(mut pending) = self.pending_writes.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }
}

fn decode(task: &FetchTask, bytes: &Bytes) -> Result<Parsed, Error> {
    parse(task.result_type, bytes).map_err(|e| Error::Parse { identity: task.identity.clone(), message: e.to_string() })
}
