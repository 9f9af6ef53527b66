//! Request descriptors: what the caller asks the orchestrator for.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scrapyard_core::{Error, StoreKey, store::request_identity};

use super::{Encoding, FetchRequest, Method, validate_url};
use crate::parse::ResultType;

/// A request to fetch and parse one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Absolute http(s) URL.
    pub url: String,

    #[serde(default)]
    pub method: Method,

    #[serde(default)]
    pub encoding: Encoding,

    /// Optional form body; also part of the cache identity.
    #[serde(default)]
    pub form: Option<BTreeMap<String, String>>,

    /// Extra request headers. Not part of the cache identity.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Desired result shape (default: html).
    #[serde(default, rename = "type")]
    pub result_type: ResultType,
}

impl RequestDescriptor {
    /// A GET request for `url` parsed as HTML.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::default(),
            encoding: Encoding::default(),
            form: None,
            headers: BTreeMap::new(),
            result_type: ResultType::default(),
        }
    }

    pub fn with_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_form(mut self, form: BTreeMap<String, String>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Reject descriptors that could never be fetched.
    pub fn validate(&self) -> Result<(), Error> {
        validate_url(&self.url)
            .map(|_| ())
            .map_err(|e| Error::InvalidInput(format!("{}: {}", self.url, e)))
    }

    /// Cache identity: the URL followed by the serialized form body.
    pub fn identity(&self) -> String {
        request_identity(&self.url, self.form.as_ref())
    }

    pub fn store_key(&self) -> StoreKey {
        StoreKey::from_identity(&self.identity())
    }

    /// The transport-level request for this descriptor.
    pub fn to_request(&self) -> FetchRequest {
        FetchRequest {
            url: self.url.clone(),
            method: self.method,
            headers: self.headers.clone(),
            form: self.form.clone(),
            encoding: self.encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let d = RequestDescriptor::new("http://x/a");
        assert_eq!(d.method, Method::Get);
        assert_eq!(d.encoding, Encoding::Binary);
        assert_eq!(d.result_type, ResultType::Html);
        assert!(d.form.is_none());
        assert!(d.headers.is_empty());
    }

    #[test]
    fn test_identity_includes_form() {
        let form: BTreeMap<_, _> = [("q".to_string(), "rust".to_string())].into();
        let plain = RequestDescriptor::new("http://x/a");
        let posted = RequestDescriptor::new("http://x/a").with_method(Method::Post).with_form(form);

        assert_eq!(plain.identity(), "http://x/a");
        assert_eq!(posted.identity(), r#"http://x/a{"q":"rust"}"#);
        assert_ne!(plain.store_key(), posted.store_key());
    }

    #[test]
    fn test_identity_ignores_type_and_headers() {
        let a = RequestDescriptor::new("http://x/a").with_type(ResultType::Json);
        let b = RequestDescriptor::new("http://x/a").with_header("Accept", "application/json");
        assert_eq!(a.store_key(), b.store_key());
    }

    #[test]
    fn test_validate() {
        assert!(RequestDescriptor::new("http://x/a").validate().is_ok());
        let err = RequestDescriptor::new("ftp://x/a").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_to_request() {
        let d = RequestDescriptor::new("http://x/a")
            .with_method(Method::Post)
            .with_encoding(Encoding::Utf8)
            .with_header("X-Token", "t");
        let req = d.to_request();
        assert_eq!(req.url, "http://x/a");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.encoding, Encoding::Utf8);
        assert_eq!(req.headers.get("X-Token").map(String::as_str), Some("t"));
    }

    #[test]
    fn test_deserialize_descriptor() {
        let d: RequestDescriptor = serde_json::from_str(r#"{"url":"http://x/a","type":"json"}"#).unwrap();
        assert_eq!(d.result_type, ResultType::Json);
        assert_eq!(d.method, Method::Get);

        let d: RequestDescriptor =
            serde_json::from_str(r#"{"url":"http://x/a","method":"POST","form":{"a":"1"},"encoding":"utf8"}"#)
                .unwrap();
        assert_eq!(d.method, Method::Post);
        assert_eq!(d.encoding, Encoding::Utf8);
        assert_eq!(d.identity(), r#"http://x/a{"a":"1"}"#);
    }
}
