//! Queryable HTML documents.

use scraper::{Html, Selector};

use super::ParseError;

/// A parsed, queryable HTML document.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Build a DOM tree from raw bytes, decoding them as (lossy) UTF-8.
    ///
    /// HTML parsing is error-tolerant and always yields a document.
    pub fn parse(bytes: &[u8]) -> Self {
        Self { html: Html::parse_document(&String::from_utf8_lossy(bytes)) }
    }

    /// The underlying scraper tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Text content of every element matching `css`, whitespace-trimmed.
    pub fn select_text(&self, css: &str) -> Result<Vec<String>, ParseError> {
        let selector = parse_selector(css)?;
        Ok(self
            .html
            .select(&selector)
            .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .collect())
    }

    /// Value of `attr` on every element matching `css` that has it.
    pub fn select_attr(&self, css: &str, attr: &str) -> Result<Vec<String>, ParseError> {
        let selector = parse_selector(css)?;
        Ok(self
            .html
            .select(&selector)
            .filter_map(|el| el.value().attr(attr).map(str::to_string))
            .collect())
    }

    /// Contents of the `<title>` element, if non-empty.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").expect("invalid selector");
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

}

fn parse_selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{css}: {e}")))
}
