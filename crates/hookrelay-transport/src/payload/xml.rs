//! XML → JSON conversion for 3scale-style webhook bodies.
//!
//! The mapping is the one 3scale consumers conventionally rely on:
//!
//! - the root element becomes the single top-level key;
//! - tag names are lower-cased;
//! - an element with only text becomes a string (`""` when empty);
//! - a child appearing once is a value, a repeated child becomes an array;
//! - attributes go under `"$"`, text mixed with children under `"_"`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::error::GatewayError;

fn malformed(err: impl std::fmt::Display) -> GatewayError {
    GatewayError::MalformedPayload(format!("invalid XML: {err}"))
}

/// An element whose closing tag has not been read yet.
struct Element {
    name: String,
    attrs: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, GatewayError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_lowercase();
        let mut attrs = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(malformed)?;
            attrs.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn adopt(&mut self, name: String, value: Value) {
        match self.children.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    fn into_parts(self) -> (String, Value) {
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut map = Map::new();
        if !self.attrs.is_empty() {
            map.insert("$".to_string(), Value::Object(self.attrs));
        }
        map.extend(self.children);
        if !self.text.is_empty() {
            map.insert("_".to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(map))
    }
}

fn close(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
) -> Result<(), GatewayError> {
    let (name, value) = element.into_parts();
    match stack.last_mut() {
        Some(parent) => parent.adopt(name, value),
        None if root.is_some() => return Err(malformed("more than one root element")),
        None => *root = Some((name, value)),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), GatewayError> {
    match stack.last_mut() {
        Some(top) => top.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(malformed("text outside of the root element")),
    }
    Ok(())
}

/// Converts an XML document into its JSON rendering.
pub fn xml_to_json(xml: &str) -> Result<Value, GatewayError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(Element::open(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = Element::open(e)?;
                close(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                close(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(malformed)?;
                append_text(&mut stack, &text)?;
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e)),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    let (name, value) = root.ok_or_else(|| malformed("no root element"))?;

    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}
