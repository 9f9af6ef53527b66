//! Network collaborator: request/reply types and the reqwest transport.
//!
//! ### Contract
//! - A [`Transport`] takes a [`FetchRequest`] and returns the status code and
//!   raw body, or a [`TransportError`].
//! - Non-200 statuses are replies, not errors; the retry layer decides.
//! - Errors carry an optional [`TransportErrorCode`] so that unreachable
//!   destinations can be told apart from transient faults.
//!
//! ### Encodings
//! - `binary` passes the body through untouched.
//! - `utf8` replaces invalid UTF-8 sequences with U+FFFD.

pub mod descriptor;
pub mod legacy;
pub mod url;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::io::ErrorKind;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub use descriptor::RequestDescriptor;
pub use legacy::LegacyArg;
pub use url::{UrlError, validate_url};

use scrapyard_core::{Error, ScrapyardConfig};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// How the response body should be treated by the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Binary,
    Utf8,
}

/// A single outbound request as handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    /// Sent as `application/x-www-form-urlencoded` when present.
    pub form: Option<BTreeMap<String, String>>,
    pub encoding: Encoding,
}

/// Status code and raw body returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReply {
    pub status: u16,
    pub body: Bytes,
}

impl FetchReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    /// Only a plain 200 counts as success.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Machine-readable cause attached to a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCode {
    /// The peer actively refused the connection.
    ConnectionRefused,
    /// The host name could not be resolved.
    NameResolution,
    Timeout,
    ConnectionReset,
}

/// Failure reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub code: Option<TransportErrorCode>,
    pub message: String,
}

impl TransportError {
    pub fn new(code: Option<TransportErrorCode>, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Whether the destination itself is unreachable.
    pub fn is_unreachable(&self) -> bool {
        matches!(self.code, Some(TransportErrorCode::ConnectionRefused | TransportErrorCode::NameResolution))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let code = classify_reqwest(&err);
        TransportError { code, message: format!("network error: {}", err) }
    }
}

/// Walk the error chain looking for a recognizable cause.
fn classify_reqwest(err: &reqwest::Error) -> Option<TransportErrorCode> {
    if err.is_timeout() {
        return Some(TransportErrorCode::Timeout);
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                ErrorKind::ConnectionRefused => return Some(TransportErrorCode::ConnectionRefused),
                ErrorKind::ConnectionReset => return Some(TransportErrorCode::ConnectionReset),
                _ => {}
            }
        }
        if cause.to_string().contains("dns error") {
            return Some(TransportErrorCode::NameResolution);
        }
        source = cause.source();
    }

    None
}

/// The network collaborator.
///
/// Implementations must be shareable across the worker pool.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request.
    async fn send(&self, request: &FetchRequest) -> Result<FetchReply, TransportError>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Create a transport using the configured user agent and timeout.
    pub fn new(config: &ScrapyardConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(url = %request.url, status, bytes = body.len(), "transport reply");

        let body = match request.encoding {
            Encoding::Binary => body,
            Encoding::Utf8 => normalize_utf8(body),
        };

        Ok(FetchReply { status, body })
    }
}

/// Replace invalid UTF-8 sequences, reusing the buffer when it is already valid.
pub fn normalize_utf8(body: Bytes) -> Bytes {
    match String::from_utf8_lossy(&body) {
        Cow::Borrowed(_) => body,
        Cow::Owned(text) => Bytes::from(text),
    }
}
