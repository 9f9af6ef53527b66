//! Core types and shared functionality for scrapyard.
//!
//! This crate provides:
//! - Content-addressed disk cache with freshness checks
//! - Unified error types
//! - Configuration structures and logging bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use config::{ConfigError, PartialConfig, ScrapyardConfig};
pub use error::Error;
pub use store::{ContentStore, StoreKey};
