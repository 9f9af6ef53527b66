//! XML documents decoded into a JSON-like value tree.
//!
//! The shape follows the common xml2js convention:
//!
//! - the result is `{ "<root>": node }`
//! - an element with only text (or nothing) and no attributes is a string
//! - otherwise it is an object with attributes under `"$"`, text under `"_"`,
//!   and one array per child element name, in document order
//!
//! ```text
//! <feed lang="en"><entry>a</entry><entry>b</entry></feed>
//! => {"feed": {"$": {"lang": "en"}, "entry": ["a", "b"]}}
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use super::ParseError;

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    attrs: Map<String, Value>,
    text: String,
    children: Map<String, Value>,
}

impl OpenElement {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attrs = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(format!("<{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Xml(format!("<{name} {key}>: {e}")))?;
            attrs.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self { name, attrs, text: String::new(), children: Map::new() })
    }

    fn add_child(&mut self, name: String, value: Value) {
        if let Value::Array(items) = self.children.entry(name).or_insert_with(|| Value::Array(Vec::new())) {
            items.push(value);
        }
    }

    fn into_value(self) -> (String, Value) {
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut node = Map::new();
        if !self.attrs.is_empty() {
            node.insert("$".into(), Value::Object(self.attrs));
        }
        if !self.text.is_empty() {
            node.insert("_".into(), Value::String(self.text));
        }
        node.extend(self.children);
        (self.name, Value::Object(node))
    }
}

/// Attach a finished element to its parent, or make it the document root.
fn close(element: OpenElement, stack: &mut [OpenElement], root: &mut Option<(String, Value)>) -> Result<(), ParseError> {
    let (name, value) = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None if root.is_some() => {
            return Err(ParseError::Xml(format!("unexpected second root element <{name}>")));
        }
        None => *root = Some((name, value)),
    }
    Ok(())
}

/// Decode an XML document into a value tree.
pub fn to_value(bytes: &[u8]) -> Result<Value, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::Xml(format!("at byte {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(start) => stack.push(OpenElement::open(&start)?),
            Event::Empty(start) => {
                let element = OpenElement::open(&start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("closing tag without matching opening tag".into()))?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(ParseError::Xml("text outside of the root element".into())),
                }
            }
            Event::CData(data) => {
                let data = data.into_inner();
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&String::from_utf8_lossy(&data)),
                    None => return Err(ParseError::Xml("CDATA outside of the root element".into())),
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Xml(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| ParseError::Xml("document has no root element".into()))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}
