//! Conversion between XML documents and [`Value`] trees.
//!
//! Decoding folds an [`Element`] into nested mappings, collapsing repeated
//! sibling tags into sequences. Encoding renders a value back into XML
//! text. Both directions are stateless and never touch attributes.
//!
//! Decoding walks the tree with an explicit stack, so its depth is bounded
//! only by memory. Encoding recurses and refuses values nested deeper than
//! [`MAX_DEPTH`] elements.
//!
//! ```
//! use jss_client::convert::{from_xml, to_xml_wrapped};
//!
//! let doc = from_xml("<computer><id>7</id><name>lab-01</name></computer>").unwrap();
//! let computer = doc.get("computer").unwrap();
//! assert_eq!(computer.get("name").and_then(|v| v.as_str()), Some("lab-01"));
//!
//! let xml = to_xml_wrapped(computer, "computer").unwrap();
//! assert_eq!(xml, "<computer><id>7</id><name>lab-01</name></computer>");
//! ```

use indexmap::IndexMap;
use quick_xml::escape::escape;

use crate::element::{Element, MAX_DEPTH};
use crate::error::{JssError, Result};
use crate::value::{Mapping, Value};

// ── Decoding ─────────────────────────────────────────────────────────────

/// Decodes an element into `{ element.tag: <contents> }`.
///
/// - With children: the contents are a mapping from child tag to child
///   contents. A tag seen once maps to its value directly; a tag seen two or
///   more times maps to a `Sequence` in document order. Text mixed in with
///   child elements is ignored.
/// - Without children: the contents are the trimmed text as a scalar, or
///   `""` when the element is empty or holds only whitespace.
///
/// Scalars are never coerced: `"1"` and `"true"` stay strings.
pub fn decode(element: &Element) -> Value {
    Value::Mapping(Mapping::from([(element.tag.clone(), fold(element))]))
}

/// Parses and decodes a complete XML document.
///
/// The result is wrapped in the root tag, so `<policy>…</policy>` yields
/// `{ "policy": { … } }`.
///
/// # Errors
///
/// `JssError::MalformedDocument` if `xml` is not well-formed. A partial
/// value is never returned.
pub fn from_xml(xml: &str) -> Result<Value> {
    Element::parse(xml).map(|root| decode(&root))
}

/// An element whose children are being folded, with the decoded children
/// so far grouped by tag in first-seen order.
struct Frame<'a> {
    element: &'a Element,
    next_child: usize,
    groups: IndexMap<&'a str, Vec<Value>>,
}

impl<'a> Frame<'a> {
    fn new(element: &'a Element) -> Self {
        Frame {
            element,
            next_child: 0,
            groups: IndexMap::new(),
        }
    }

    /// The element's contents once every child has been folded.
    fn finish(self) -> Value {
        if self.element.children.is_empty() {
            let text = self.element.text.as_deref().map(str::trim).unwrap_or_default();
            return Value::Scalar(text.to_string());
        }
        self.groups
            .into_iter()
            .map(|(tag, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Sequence(values)
                };
                (tag.to_string(), value)
            })
            .collect()
    }
}

/// The unwrapped contents of an element, folded bottom-up.
fn fold(root: &Element) -> Value {
    let mut stack = vec![Frame::new(root)];
    let mut folded = Value::Scalar(String::new());

    while let Some(frame) = stack.last_mut() {
        let element = frame.element;
        if let Some(child) = element.children.get(frame.next_child) {
            frame.next_child += 1;
            stack.push(Frame::new(child));
            continue;
        }

        let Some(done) = stack.pop() else { break };
        let value = done.finish();
        match stack.last_mut() {
            Some(parent) => parent.groups.entry(element.tag.as_str()).or_default().push(value),
            None => folded = value,
        }
    }

    folded
}

// ── Encoding ─────────────────────────────────────────────────────────────

/// Renders a value as XML text without an enclosing root tag.
///
/// - Mapping: each `(key, value)` in insertion order becomes
///   `<key>…</key>`. A sequence value repeats `<key>…</key>` once per item.
/// - Scalar: the text with `& < > " '` escaped.
///
/// # Errors
///
/// `JssError::UnsupportedShape` for a top-level sequence, a sequence nested
/// directly in another sequence, a mapping key that cannot be a tag name,
/// or elements nested deeper than [`MAX_DEPTH`].
pub fn to_xml(value: &Value) -> Result<String> {
    if let Value::Sequence(_) = value {
        return Err(bare_sequence());
    }
    let mut out = String::new();
    write_value(value, &mut out, 0)?;
    Ok(out)
}

/// Renders a value as a single XML element named `tag`.
///
/// `to_xml_wrapped(&{a: "x"}, "root")` is `<root><a>x</a></root>`.
///
/// # Errors
///
/// Same as [`to_xml`]; a sequence is rejected here too because repeating
/// the wrapping tag would produce more than one document root.
pub fn to_xml_wrapped(value: &Value, tag: &str) -> Result<String> {
    if let Value::Sequence(_) = value {
        return Err(bare_sequence());
    }
    let mut out = String::new();
    write_element(tag, value, &mut out, 0)?;
    Ok(out)
}

/// `depth` is the number of elements already open around `value`.
fn write_value(value: &Value, out: &mut String, depth: usize) -> Result<()> {
    match value {
        Value::Scalar(text) => out.push_str(&escape(text.as_str())),
        Value::Mapping(map) => {
            for (key, child) in map {
                match child {
                    Value::Sequence(items) => {
                        for item in items {
                            if let Value::Sequence(_) = item {
                                return Err(JssError::UnsupportedShape(format!(
                                    "nested sequence under <{key}> has no tag to repeat"
                                )));
                            }
                            write_element(key, item, out, depth)?;
                        }
                    }
                    _ => write_element(key, child, out, depth)?,
                }
            }
        }
        Value::Sequence(_) => return Err(bare_sequence()),
    }
    Ok(())
}

fn write_element(tag: &str, value: &Value, out: &mut String, depth: usize) -> Result<()> {
    check_tag(tag)?;
    if depth >= MAX_DEPTH {
        return Err(JssError::UnsupportedShape(format!(
            "<{tag}> is nested deeper than {MAX_DEPTH} elements"
        )));
    }
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_value(value, out, depth + 1)?;
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Ok(())
}

fn check_tag(tag: &str) -> Result<()> {
    let invalid = tag.is_empty()
        || tag
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '/' | '='));
    if invalid {
        return Err(JssError::UnsupportedShape(format!(
            "{tag:?} is not a usable tag name"
        )));
    }
    Ok(())
}

fn bare_sequence() -> JssError {
    JssError::UnsupportedShape("a top-level sequence has no tag to repeat".to_string())
}
