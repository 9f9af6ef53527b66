//! Decode fetched bytes into the caller's requested result shape.
//!
//! | type   | result                                  |
//! |--------|-----------------------------------------|
//! | `html` | [`HtmlDocument`] (queryable DOM tree)   |
//! | `json` | `serde_json::Value`                     |
//! | `xml`  | `serde_json::Value` tree, see [`xml`]   |
//! | `raw`  | the bytes, unchanged                    |
//!
//! Parse failures are final; they are never retried.

pub mod html;
pub mod xml;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use html::HtmlDocument;

/// Result shape requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    #[default]
    Html,
    Json,
    Xml,
    Raw,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Html => "html",
            ResultType::Json => "json",
            ResultType::Xml => "xml",
            ResultType::Raw => "raw",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(ResultType::Html),
            "json" => Ok(ResultType::Json),
            "xml" => Ok(ResultType::Xml),
            "raw" => Ok(ResultType::Raw),
            other => Err(ParseError::UnknownType(other.to_string())),
        }
    }
}

/// Errors from decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(String),

    #[error("invalid xml: {0}")]
    Xml(String),

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("unknown result type: {0}")]
    UnknownType(String),
}

/// A decoded payload.
#[derive(Debug, Clone)]
pub enum Parsed {
    Html(HtmlDocument),
    Json(Value),
    Xml(Value),
    Raw(Bytes),
}

impl Parsed {
    pub fn result_type(&self) -> ResultType {
        match self {
            Parsed::Html(_) => ResultType::Html,
            Parsed::Json(_) => ResultType::Json,
            Parsed::Xml(_) => ResultType::Xml,
            Parsed::Raw(_) => ResultType::Raw,
        }
    }

    pub fn as_html(&self) -> Option<&HtmlDocument> {
        match self {
            Parsed::Html(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Parsed::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&Value> {
        match self {
            Parsed::Xml(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Parsed::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Decode `bytes` as `result_type`.
pub fn parse(result_type: ResultType, bytes: &Bytes) -> Result<Parsed, ParseError> {
    match result_type {
        ResultType::Html => Ok(Parsed::Html(HtmlDocument::parse(bytes))),
        ResultType::Json => serde_json::from_slice(bytes)
            .map(Parsed::Json)
            .map_err(|e| ParseError::Json(e.to_string())),
        ResultType::Xml => xml::to_value(bytes).map(Parsed::Xml),
        ResultType::Raw => Ok(Parsed::Raw(bytes.clone())),
    }
}
