//! Positional call shapes from older callers.
//!
//! Older callers passed a URL followed by loose keywords (`"json"`, `"post"`,
//! `"utf8"`, ...) and an optional form map. This adapter turns those into a
//! [`RequestDescriptor`] before anything else sees them.

use std::collections::BTreeMap;

use scrapyard_core::Error;

use super::{Encoding, Method, RequestDescriptor};
use crate::parse::ResultType;

/// One positional argument of a legacy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyArg {
    Text(String),
    Form(BTreeMap<String, String>),
}

impl From<&str> for LegacyArg {
    fn from(value: &str) -> Self {
        LegacyArg::Text(value.to_string())
    }
}

impl From<String> for LegacyArg {
    fn from(value: String) -> Self {
        LegacyArg::Text(value)
    }
}

impl From<BTreeMap<String, String>> for LegacyArg {
    fn from(value: BTreeMap<String, String>) -> Self {
        LegacyArg::Form(value)
    }
}

impl RequestDescriptor {
    /// Translate a legacy argument list.
    ///
    /// The first argument must be the URL. Later text arguments are matched
    /// case-insensitively; unknown words are logged and skipped. The last
    /// form argument wins.
    pub fn from_legacy(args: &[LegacyArg]) -> Result<Self, Error> {
        let url = match args.first() {
            Some(LegacyArg::Text(url)) => url,
            _ => return Err(Error::InvalidInput("legacy call must start with a URL".into())),
        };

        let mut descriptor = RequestDescriptor::new(url.clone());

        for arg in &args[1..] {
            match arg {
                LegacyArg::Form(form) => descriptor.form = Some(form.clone()),
                LegacyArg::Text(word) => match word.to_lowercase().as_str() {
                    "html" => descriptor.result_type = ResultType::Html,
                    "xml" => descriptor.result_type = ResultType::Xml,
                    "json" => descriptor.result_type = ResultType::Json,
                    "raw" => descriptor.result_type = ResultType::Raw,
                    "get" => descriptor.method = Method::Get,
                    "post" => descriptor.method = Method::Post,
                    "binary" => descriptor.encoding = Encoding::Binary,
                    "utf8" => descriptor.encoding = Encoding::Utf8,
                    _ => tracing::warn!(argument = %word, url = %descriptor.url, "unrecognized argument"),
                },
            }
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_only() {
        let d = RequestDescriptor::from_legacy(&["http://x/a".into()]).unwrap();
        assert_eq!(d, RequestDescriptor::new("http://x/a"));
    }

    #[test]
    fn test_keywords() {
        let args: Vec<LegacyArg> = vec!["http://x/a".into(), "JSON".into(), "post".into(), "utf8".into()];
        let d = RequestDescriptor::from_legacy(&args).unwrap();
        assert_eq!(d.result_type, ResultType::Json);
        assert_eq!(d.method, Method::Post);
        assert_eq!(d.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_form_argument() {
        let form: BTreeMap<_, _> = [("id".to_string(), "7".to_string())].into();
        let args = vec![LegacyArg::from("http://x/a"), LegacyArg::from("xml"), LegacyArg::from(form.clone())];
        let d = RequestDescriptor::from_legacy(&args).unwrap();
        assert_eq!(d.result_type, ResultType::Xml);
        assert_eq!(d.form, Some(form));
    }

    #[test]
    fn test_unknown_words_ignored() {
        let args: Vec<LegacyArg> = vec!["http://x/a".into(), "sideways".into(), "raw".into()];
        let d = RequestDescriptor::from_legacy(&args).unwrap();
        assert_eq!(d.result_type, ResultType::Raw);
        assert_eq!(d.method, Method::Get);
    }

    #[test]
    fn test_missing_url() {
        assert!(matches!(RequestDescriptor::from_legacy(&[]), Err(Error::InvalidInput(_))));

        let args = vec![LegacyArg::Form(BTreeMap::new())];
        assert!(matches!(RequestDescriptor::from_legacy(&args), Err(Error::InvalidInput(_))));
    }
}
