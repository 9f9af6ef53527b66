//! Client code for scrapyard.
//!
//! This crate provides the fetch pipeline: a bounded worker pool, the retry
//! state machine, response parsing and the caching orchestrator that ties
//! them to the content store in `scrapyard-core`.

pub mod fetch;
pub mod orchestrator;
pub mod parse;
pub mod retry;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use fetch::{
    Encoding, FetchReply, FetchRequest, HttpTransport, LegacyArg, Method, RequestDescriptor, Transport, TransportError,
    TransportErrorCode,
};
pub use orchestrator::Scrapyard;
pub use parse::{HtmlDocument, ParseError, Parsed, ResultType};
pub use retry::{FailureClass, FetchTask, RetryOrchestrator};
pub use scheduler::{FetchScheduler, SchedulerError};
