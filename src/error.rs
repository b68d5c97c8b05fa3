//! Typed error hierarchy for the jss-client crate.
//!
//! Every failure in the codec, the response classifier and the transport
//! surfaces as a [`JssError`] variant. Variants map to system boundaries:
//! - `MalformedDocument` / `UnsupportedShape` come from the XML codec.
//! - `HttpStatus` carries an [`ErrorRecord`] for a response whose status
//!   code did not match the success code of its verb.
//! - `MissingExtension` is the upload pre-flight check, raised before any
//!   request is sent.
//! - `InvalidMimeType` rejects a caller-supplied upload content type, also
//!   before any request is sent.
//! - `UnexpectedOutcome` is returned by convenience wrappers that expect a
//!   specific [`Outcome`](crate::classify::Outcome) kind.
//! - `Network`, `Json`, `Io` and `Config` wrap the collaborators underneath.
//!
//! Design rationale:
//! - A failed HTTP call is data, not a transport error. `HttpStatus` carries
//!   an immutable [`ErrorRecord`] with every field a caller needs to log or
//!   retry, so nothing has to reach back into the response object.
//! - Codec failures (`MalformedDocument`, `UnsupportedShape`) never carry a
//!   partial value. A caller either gets the whole document or an error.
//! - `Network` is reserved for failures that produced no HTTP status. Local
//!   problems with a request (bad MIME type, missing extension) get their
//!   own variants so they are never mistaken for connectivity trouble.

use std::fmt;
use std::path::PathBuf;

/// Structured description of a failed JSS API call.
///
/// Built once per failed response by
/// [`build_error`](crate::classify::build_error) and never mutated
/// afterwards. All fields are explicit so callers never need the original
/// response to log or retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// HTTP status code returned by the server.
    pub status_code: u16,
    /// HTTP method of the request (`GET`, `POST`, `PUT`).
    pub request_method: String,
    /// Full URL the request was sent to.
    pub request_url: String,
    /// Human-readable message extracted from the response body, or
    /// `"failed"` when the body carried no paragraph text.
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}: {}",
            self.status_code, self.request_method, self.request_url, self.message
        )
    }
}

/// Unified error type for all jss-client operations.
#[derive(Debug, thiserror::Error)]
pub enum JssError {
    /// The input did not parse as a well-formed XML document.
    ///
    /// Never retried and never replaced by a partial or empty value.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The caller asked the encoder to render a shape XML cannot express,
    /// such as a bare top-level sequence (there is no tag to repeat).
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// The server answered with a status code other than the success code
    /// for the request's verb.
    #[error("{0}")]
    HttpStatus(ErrorRecord),

    /// An upload file name has no extension. The JSS rejects such uploads,
    /// so this is raised before the request is sent.
    #[error("missing file extension: {path:?}")]
    MissingExtension {
        /// The offending file name or path.
        path: String,
    },

    /// A caller-supplied upload MIME type does not parse. Raised before
    /// the file is read or the request is sent.
    #[error("invalid MIME type: {0:?}")]
    InvalidMimeType(String),

    /// A request completed, but with an [`Outcome`](crate::classify::Outcome)
    /// kind the calling wrapper cannot return.
    #[error("expected {expected}, got {found}")]
    UnexpectedOutcome {
        /// The outcome kind the wrapper returns.
        expected: &'static str,
        /// The outcome kind that was produced.
        found: &'static str,
    },

    /// A JSON body (response or CLI input) failed to parse.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A transport-level failure (DNS, TCP, TLS, timeout). No HTTP status
    /// is available because the request did not complete.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Reading a local file (upload payload or configuration) failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The client configuration is incomplete or unreadable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl JssError {
    /// Returns the [`ErrorRecord`] when this is an HTTP status failure.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            JssError::HttpStatus(record) => Some(record),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, JssError>;
