//! Async Rust client and XML codec for the Jamf Pro classic API (JSSResource).
//!
//! The JSS exposes its resources as XML documents. This crate converts those
//! documents to and from a schema-free [`Value`](value::Value) tree and
//! classifies every HTTP response into a decoded document or a typed error,
//! including the HTML status pages the server returns on failure.
//!
//! # Modules
//!
//! - [`element`] — XML element tree parsed with `quick-xml`.
//! - [`value`] — The decoded value tree (scalar, sequence, mapping).
//! - [`convert`] — XML ⇄ value decoder and encoder.
//! - [`extract`] — Paragraph-text extraction from HTML error pages.
//! - [`classify`] — Success / error classification of raw responses.
//! - [`client`] — Thin reqwest transport that feeds the classifier.
//! - [`config`] — Connection settings, loadable from TOML.
//! - [`error`] — Typed error hierarchy (`JssError`, `ErrorRecord`).
//!
//! # Quick Start
//!
//! ```ignore
//! use jss_client::classify::RequestOptions;
//! use jss_client::client::JssClient;
//! use jss_client::config::ClientConfig;
//!
//! let config = ClientConfig::new("jss.example.edu").with_credentials("api", "secret");
//! let client = JssClient::new(&config)?;
//! let doc = client.get_document("policies/id/1").await?;
//! let name = doc.pointer(["policy", "general", "name"]);
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod client;
pub mod config;
pub mod convert;
pub mod element;
pub mod error;
pub mod extract;
pub mod value;

pub use error::{ErrorRecord, JssError, Result};
pub use value::Value;
