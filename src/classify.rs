//! Response classification for JSSResource calls.
//!
//! Every request the client sends ends in exactly one terminal state:
//!
//! ```text
//!   RawResponse ──raw?──────────────────────────▶ Outcome::Raw
//!        │
//!        ├── status == success code for verb ───▶ Outcome::{Document, Json, Uploaded}
//!        │
//!        └── anything else ─────────────────────▶ JssError::HttpStatus(ErrorRecord)
//! ```
//!
//! The success code is 200 for GET and 201 for POST, PUT and uploads.
//! `raw` is checked before the status so a caller can inspect a failed
//! response without an error being built.
//!
//! Everything here is synchronous and pure: the transport in
//! [`client`](crate::client) captures the response and hands it over.

use std::path::Path;

use crate::convert::from_xml;
use crate::error::{ErrorRecord, JssError, Result};
use crate::extract::MessageExtractor;
use crate::value::Value;

/// Message used when an error page carries no paragraph text.
pub const DEFAULT_MESSAGE: &str = "failed";

/// Separator between extracted message fragments.
const FRAGMENT_SEPARATOR: &str = ": ";

// ── Request descriptors ──────────────────────────────────────────────────

/// The kind of request a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Read a resource. Succeeds with 200.
    Get,
    /// Create a resource. Succeeds with 201.
    Post,
    /// Update a resource. Succeeds with 201.
    Put,
    /// Multipart file upload (sent as POST). Succeeds with 201, no body.
    Upload,
}

impl Verb {
    /// The HTTP method the verb is sent with.
    pub fn method(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post | Verb::Upload => "POST",
            Verb::Put => "PUT",
        }
    }

    /// The only status code treated as success for this verb.
    pub fn success_status(self) -> u16 {
        match self {
            Verb::Get => 200,
            Verb::Post | Verb::Put | Verb::Upload => 201,
        }
    }
}

/// Representation requested from the server.
///
/// Chosen by the caller, never inferred from the response content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `Accept: application/xml`; bodies go through the XML decoder.
    #[default]
    Xml,
    /// `Accept: application/json`; bodies are parsed with `serde_json`.
    /// The JSS JSON representation is sometimes incomplete.
    Json,
}

impl Format {
    /// Value for the `Accept` header.
    pub fn accept(self) -> &'static str {
        match self {
            Format::Xml => "application/xml",
            Format::Json => "application/json",
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestOptions {
    /// Representation to request and decode. Only honoured for GET.
    pub format: Format,
    /// Return the untouched response, skipping status checks.
    pub raw: bool,
}

impl RequestOptions {
    /// Decode the response as JSON.
    pub fn json() -> Self {
        RequestOptions {
            format: Format::Json,
            raw: false,
        }
    }

    /// Return the response as-is, whatever its status.
    pub fn raw() -> Self {
        RequestOptions {
            format: Format::Xml,
            raw: true,
        }
    }
}

/// A fully read HTTP response together with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP method of the request.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Response status code.
    pub status: u16,
    /// Response `Content-Type`, if the server sent one.
    pub content_type: Option<String>,
    /// Response body as text.
    pub body: String,
}

/// Terminal success states of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// XML body decoded into a value tree, wrapped in its root tag.
    Document(Value),
    /// JSON body, parsed without the XML decoder.
    Json(serde_json::Value),
    /// Upload accepted; the server returns no useful body.
    Uploaded,
    /// `raw` was requested: the response exactly as received.
    Raw(RawResponse),
}

impl Outcome {
    /// Short name of the outcome kind, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Document(_) => "document",
            Outcome::Json(_) => "JSON",
            Outcome::Uploaded => "upload",
            Outcome::Raw(_) => "raw response",
        }
    }

    /// The decoded XML document, if this outcome carries one.
    pub fn into_document(self) -> Option<Value> {
        match self {
            Outcome::Document(value) => Some(value),
            _ => None,
        }
    }

    /// The parsed JSON body, if this outcome carries one.
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Outcome::Json(json) => Some(json),
            _ => None,
        }
    }

    /// The untouched response, if `raw` was requested.
    pub fn into_raw(self) -> Option<RawResponse> {
        match self {
            Outcome::Raw(response) => Some(response),
            _ => None,
        }
    }
}

// ── Classification ───────────────────────────────────────────────────────

/// Classifies one response.
///
/// # Errors
///
/// - `JssError::HttpStatus` — the status is not the success code for
///   `verb` (never raised when `options.raw` is set).
/// - `JssError::MalformedDocument` — a success response whose XML body does
///   not parse.
/// - `JssError::Json` — a success response whose JSON body does not parse.
pub fn classify(
    verb: Verb,
    response: RawResponse,
    options: &RequestOptions,
    extractor: &dyn MessageExtractor,
) -> Result<Outcome> {
    if options.raw {
        return Ok(Outcome::Raw(response));
    }

    if response.status != verb.success_status() {
        return Err(JssError::HttpStatus(build_error(&response, extractor)));
    }

    match (verb, options.format) {
        (Verb::Upload, _) => Ok(Outcome::Uploaded),
        (Verb::Get, Format::Json) => Ok(Outcome::Json(serde_json::from_str(&response.body)?)),
        _ => from_xml(&response.body).map(Outcome::Document),
    }
}

/// Builds the [`ErrorRecord`] for a failed response.
///
/// The message is the extracted paragraph texts joined with `": "`, or
/// [`DEFAULT_MESSAGE`] when the body yields none.
pub fn build_error(response: &RawResponse, extractor: &dyn MessageExtractor) -> ErrorRecord {
    let fragments = extractor.extract(&response.body);
    let message = if fragments.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        fragments.join(FRAGMENT_SEPARATOR)
    };

    let record = ErrorRecord {
        status_code: response.status,
        request_method: response.method.clone(),
        request_url: response.url.clone(),
        message,
    };
    tracing::error!(extractor = extractor.name(), "{record}");
    tracing::debug!(body = %response.body, "error response text");
    record
}

/// Upload pre-flight: the JSS rejects files without an extension.
///
/// # Errors
///
/// `JssError::MissingExtension` when `name` has no extension (`"icon"`,
/// `".png"`, `"archive."`).
pub fn check_upload_name(name: &str) -> Result<()> {
    let has_extension = Path::new(name)
        .extension()
        .is_some_and(|ext| !ext.is_empty());
    if has_extension {
        Ok(())
    } else {
        Err(JssError::MissingExtension {
            path: name.to_string(),
        })
    }
}
