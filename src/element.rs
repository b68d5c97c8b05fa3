//! In-memory XML element tree.
//!
//! [`Element::parse`] reads a document with `quick-xml` and keeps only what
//! the codec needs: tag names, child order and character data. Attributes,
//! comments, processing instructions and the DOCTYPE are dropped on the
//! floor and cannot be recovered from an `Element`.
//!
//! Parsing is iterative and refuses documents nested deeper than
//! [`MAX_DEPTH`], so a hostile or broken response body is reported as
//! `MalformedDocument` instead of exhausting the stack later on.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{JssError, Result};

/// Deepest element nesting [`Element::parse`] accepts. The root is at
/// depth 1. JSSResource documents stay well under ten levels.
pub const MAX_DEPTH: usize = 256;

/// A single XML element: tag name, ordered children, optional text.
///
/// `text` holds the element's own character data (entity references
/// resolved, CDATA included) exactly as it appeared, untrimmed. It is
/// `None` when the element contained no character data at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, including any namespace prefix.
    pub tag: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Own character data, untrimmed.
    pub text: Option<String>,
}

impl Element {
    /// An element with no children and no text.
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder: sets the element text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: appends a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Parses a complete XML document into its root element.
    ///
    /// # Errors
    ///
    /// `JssError::MalformedDocument` when the document is not well-formed:
    /// tokenizer errors, mismatched or unclosed tags, no root element, more
    /// than one root element, non-whitespace text outside the root, or
    /// nesting deeper than [`MAX_DEPTH`].
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(malformed(format!(
                        "{e} at byte {}",
                        reader.buffer_position()
                    )))
                }
            };

            match event {
                Event::Start(start) => {
                    check_depth(&stack)?;
                    stack.push(Element::new(tag_name(start.name().as_ref())?));
                }
                Event::Empty(start) => {
                    check_depth(&stack)?;
                    let element = Element::new(tag_name(start.name().as_ref())?);
                    attach(element, &mut stack, &mut root)?;
                }
                Event::End(end) => {
                    let name = tag_name(end.name().as_ref())?;
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed(format!("unexpected closing tag </{name}>")))?;
                    if element.tag != name {
                        return Err(malformed(format!(
                            "expected </{}>, found </{name}>",
                            element.tag
                        )));
                    }
                    attach(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| malformed(e.to_string()))?;
                    push_text(&text, &mut stack)?;
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8(cdata.into_inner().into_owned())
                        .map_err(|e| malformed(e.to_string()))?;
                    push_text(&text, &mut stack)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, DOCTYPE.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("unclosed element <{}>", open.tag)));
        }
        root.ok_or_else(|| malformed("no root element".to_string()))
    }
}

fn malformed(message: String) -> JssError {
    JssError::MalformedDocument(message)
}

/// Fails when opening one more element would exceed [`MAX_DEPTH`].
fn check_depth(stack: &[Element]) -> Result<()> {
    if stack.len() >= MAX_DEPTH {
        return Err(malformed(format!(
            "elements nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

fn tag_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| malformed(format!("tag name is not UTF-8: {e}")))
}

/// Hands a finished element to its parent, or makes it the document root.
fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(malformed(format!(
                "second root element <{}>",
                element.tag
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(text: &str, stack: &mut [Element]) -> Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.get_or_insert_with(String::new).push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed(format!(
            "text outside the root element: {:?}",
            text.trim()
        ))),
    }
}
