//! Human-readable messages from HTML error pages.
//!
//! When a JSSResource call fails, the server answers with a small HTML
//! status page instead of XML:
//!
//! ```text
//! <p>Unauthorized</p>
//! <p>The request requires user authentication</p>
//! <p>You can get technical details <a href="…">here</a>. …</p>
//! ```
//!
//! The first two paragraphs are a title and a sentence worth showing; the
//! third is fixed boilerplate. [`MessageExtractor`] returns at most those
//! first two paragraph texts. Two strategies implement it:
//!
//! - [`FullParserExtractor`] parses the page with `scraper` (cargo feature
//!   `html-parser`, enabled by default).
//! - [`StreamingScannerExtractor`] is a single-pass scanner that needs no
//!   HTML library.
//!
//! [`default_extractor`] picks the full parser when it is compiled in.
//! Both strategies trim fragments, skip blank paragraphs and never fail.
//!
//! Design rationale:
//! - The choice is a trait object selected once at client construction,
//!   not a fallback tried on every failure. Builds without `html-parser`
//!   drop the `scraper`/`html5ever` tree entirely and still produce the
//!   same messages.
//! - Both strategies collect the full text of each paragraph, nested
//!   inline markup included, so a title wrapped in `<b>` still counts as
//!   the first paragraph and the boilerplate third paragraph never moves
//!   up into the message.
//! - Extraction never fails. A page with no usable paragraphs yields an
//!   empty vector and the classifier falls back to its default message.

use std::borrow::Cow;

use indexmap::IndexMap;

/// Number of paragraphs kept from an error page.
pub const MAX_FRAGMENTS: usize = 2;

/// Pulls up to [`MAX_FRAGMENTS`] paragraph texts out of an HTML document.
pub trait MessageExtractor: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Returns 0, 1 or 2 trimmed, non-empty paragraph texts in document
    /// order. Empty or non-HTML input yields an empty vector.
    fn extract(&self, html: &str) -> Vec<String>;
}

/// Returns the preferred extractor available in this build.
#[cfg(feature = "html-parser")]
pub fn default_extractor() -> Box<dyn MessageExtractor> {
    Box::new(FullParserExtractor)
}

/// Returns the preferred extractor available in this build.
#[cfg(not(feature = "html-parser"))]
pub fn default_extractor() -> Box<dyn MessageExtractor> {
    Box::new(StreamingScannerExtractor)
}

// ── Full parser ──────────────────────────────────────────────────────────

/// Extracts paragraph text with a conforming HTML parser.
///
/// Paragraph text includes the text of nested inline elements
/// (`<p>see <b>this</b></p>` gives `"see this"`).
#[cfg(feature = "html-parser")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FullParserExtractor;

#[cfg(feature = "html-parser")]
impl MessageExtractor for FullParserExtractor {
    fn name(&self) -> &'static str {
        "html-parser"
    }

    fn extract(&self, html: &str) -> Vec<String> {
        let Ok(selector) = scraper::Selector::parse("p") else {
            return Vec::new();
        };
        let document = scraper::Html::parse_document(html);
        document
            .select(&selector)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .take(MAX_FRAGMENTS)
            .collect()
    }
}

// ── Streaming scanner ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Just after a tag, before any character data.
    OutsideTag,
    /// Between `<` and `>`.
    InsideTag,
    /// Accumulating character data.
    TextRun,
}

/// HTML elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Forward-only scanner that needs no HTML library.
///
/// Character data is appended to one running buffer. Each open element
/// remembers where the buffer stood when it opened, so a closing tag files
/// everything written since, including text of nested inline markup:
/// `<p>see <b>this</b></p>` yields `"see this"`, as the full parser does.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingScannerExtractor;

impl StreamingScannerExtractor {
    /// Scans the whole document and returns the text of every closed
    /// element, grouped by lowercase tag name in first-seen order.
    pub fn collect(html: &str) -> IndexMap<String, Vec<String>> {
        let mut closed: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut state = ScanState::OutsideTag;
        let mut text = String::new();
        let mut open: Vec<(String, usize)> = Vec::new();
        let mut tag = String::new();

        for c in html.chars() {
            state = match (state, c) {
                (ScanState::OutsideTag | ScanState::TextRun, '<') => {
                    tag.clear();
                    ScanState::InsideTag
                }
                (ScanState::OutsideTag | ScanState::TextRun, c) => {
                    text.push(c);
                    ScanState::TextRun
                }
                (ScanState::InsideTag, '>') => {
                    match parse_tag(&tag) {
                        Tag::Open(name) => open.push((name, text.len())),
                        Tag::Close(name) => {
                            if let Some(at) = open.iter().rposition(|(n, _)| *n == name) {
                                let start = open[at].1;
                                open.truncate(at);
                                let decoded = decode_entities(&text[start..]);
                                let run = decoded.trim();
                                if !run.is_empty() {
                                    closed.entry(name).or_default().push(run.to_string());
                                }
                            }
                        }
                        Tag::Other => {}
                    }
                    ScanState::OutsideTag
                }
                (ScanState::InsideTag, c) => {
                    tag.push(c);
                    ScanState::InsideTag
                }
            };
        }

        closed
    }
}

impl MessageExtractor for StreamingScannerExtractor {
    fn name(&self) -> &'static str {
        "streaming-scanner"
    }

    fn extract(&self, html: &str) -> Vec<String> {
        Self::collect(html)
            .swap_remove("p")
            .map(|mut paragraphs| {
                paragraphs.truncate(MAX_FRAGMENTS);
                paragraphs
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Tag {
    /// An opening tag that expects a matching close.
    Open(String),
    /// `</name>`.
    Close(String),
    /// Void and self-closing elements, comments, declarations.
    Other,
}

/// Classifies the text between `<` and `>`. Names are lowercased.
fn parse_tag(tag: &str) -> Tag {
    if tag.starts_with(|c: char| c == '!' || c == '?') {
        return Tag::Other;
    }
    if let Some(rest) = tag.strip_prefix('/') {
        return match rest.split_whitespace().next() {
            Some(name) => Tag::Close(name.to_ascii_lowercase()),
            None => Tag::Other,
        };
    }
    let name = tag
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if name.is_empty() || tag.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&name.as_str()) {
        Tag::Other
    } else {
        Tag::Open(name)
    }
}

/// Resolves XML entities and character references. Text containing
/// HTML-only entities (`&nbsp;`) is returned untouched.
fn decode_entities(text: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(text).unwrap_or(Cow::Borrowed(text))
}
