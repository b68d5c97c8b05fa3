//! HTTP transport for the JSS classic API.
//!
//! `JssClient` wraps a `reqwest::Client` configured from a
//! [`ClientConfig`]. It turns [`Value`] trees into XML request bodies, sends
//! GET / POST / PUT / upload requests under `…/JSSResource/`, reads each
//! response in full and hands it to [`classify`] together with the
//! client's [`MessageExtractor`].
//!
//! The client is constructed explicitly and passed by reference; there is
//! no process-wide instance. It performs no retries and keeps no cache.
//!
//! Design decisions:
//! - Bodies are read to the end before classification. JSS documents and
//!   error pages are small, and the classifier stays a pure function over
//!   a [`RawResponse`] that can be tested without a server.
//! - `raw` is honoured by the classifier rather than here, so every verb
//!   short-circuits the same way and the status check is never skipped by
//!   accident.
//! - The upload pre-flight (extension, MIME type) runs before the file is
//!   read, so a bad call costs neither disk I/O nor a round trip.

use std::path::Path;
use std::time::Duration;

use mime_guess::Mime;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};

use crate::classify::{
    check_upload_name, classify, Format, Outcome, RawResponse, RequestOptions, Verb,
};
use crate::config::ClientConfig;
use crate::convert::to_xml;
use crate::error::{JssError, Result};
use crate::extract::{default_extractor, MessageExtractor};
use crate::value::Value;

/// Connect timeout (TCP + TLS handshake).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout. Package uploads can be large.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

fn build_http_client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Client for one JSS server.
///
/// Design decisions:
/// - `base_url` is stored as a `String` so tests can point it at a local
///   mock server.
/// - `extractor` defaults to [`default_extractor`] and can be swapped with
///   [`JssClient::with_extractor`]. It is a trait object so the choice
///   between the HTML parser and the streaming scanner is made once, at
///   construction, instead of at every failed call.
pub struct JssClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
    extractor: Box<dyn MessageExtractor>,
}

impl JssClient {
    /// Creates a client for `https://{address}:{port}/JSSResource`.
    ///
    /// # Errors
    ///
    /// - `JssError::Config` — the configuration has no address.
    /// - `JssError::Network` — the HTTP client could not be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_base_url(config, &config.base_url())
    }

    /// Creates a client with an explicit base URL, used by tests to target
    /// a mock server. Credentials still come from `config`.
    pub fn with_base_url(config: &ClientConfig, base_url: &str) -> Result<Self> {
        let extractor = default_extractor();
        tracing::debug!(base_url, extractor = extractor.name(), "creating JSS client");
        Ok(JssClient {
            client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
            extractor,
        })
    }

    /// Replaces the error-message extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn MessageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Base URL every endpoint is joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Builds a request with auth and `Accept` headers attached.
    fn request(&self, verb: Verb, url: &str, format: Format) -> RequestBuilder {
        let method = match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post | Verb::Upload => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
        };
        let mut req = self
            .client
            .request(method, url)
            .header(ACCEPT, format.accept());
        if let Some((user, password)) = &self.credentials {
            req = req.basic_auth(user, password.as_deref());
        }
        req
    }

    /// Sends a request, reads the whole response and classifies it.
    async fn execute(
        &self,
        verb: Verb,
        url: String,
        req: RequestBuilder,
        options: &RequestOptions,
    ) -> Result<Outcome> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.text().await?;
        tracing::debug!(status, url = %url, "response received");

        let response = RawResponse {
            method: verb.method().to_string(),
            url,
            status,
            content_type,
            body,
        };
        classify(verb, response, options, self.extractor.as_ref())
    }

    /// Reads a resource, e.g. `policies/id/1`.
    ///
    /// Returns `Outcome::Document` (or `Outcome::Json` with
    /// [`RequestOptions::json`]) on 200, `Outcome::Raw` when `raw` is set.
    ///
    /// # Errors
    ///
    /// - `JssError::HttpStatus` — any status other than 200 (unless raw).
    /// - `JssError::MalformedDocument` / `JssError::Json` — body did not parse.
    /// - `JssError::Network` — transport-level failure.
    pub async fn get(&self, endpoint: &str, options: &RequestOptions) -> Result<Outcome> {
        tracing::debug!(endpoint, "GET");
        let url = self.url(endpoint);
        let req = self.request(Verb::Get, &url, options.format);
        self.execute(Verb::Get, url, req, options).await
    }

    /// Reads a resource as XML and returns the decoded document.
    pub async fn get_document(&self, endpoint: &str) -> Result<Value> {
        expect_document(self.get(endpoint, &RequestOptions::default()).await?)
    }

    /// Creates a resource, e.g. `policies/id/0` with `{ "policy": { … } }`.
    ///
    /// `data` is encoded with [`to_xml`] and must therefore be a mapping
    /// whose single key is the resource's root tag. The JSS answers 201
    /// with a short document, usually `{ "policy": { "id": "…" } }`.
    ///
    /// # Errors
    ///
    /// - `JssError::UnsupportedShape` — `data` cannot be encoded (no request
    ///   is sent).
    /// - `JssError::HttpStatus` — any status other than 201 (unless raw).
    /// - `JssError::Network` — transport-level failure.
    pub async fn post(
        &self,
        endpoint: &str,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<Outcome> {
        tracing::info!(endpoint, "creating");
        self.send_document(Verb::Post, endpoint, data, options).await
    }

    /// Updates a resource. Same contract as [`JssClient::post`].
    pub async fn put(
        &self,
        endpoint: &str,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<Outcome> {
        tracing::info!(endpoint, "updating");
        self.send_document(Verb::Put, endpoint, data, options).await
    }

    async fn send_document(
        &self,
        verb: Verb,
        endpoint: &str,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<Outcome> {
        let xml = to_xml(data)?;
        let url = self.url(endpoint);
        let req = self
            .request(verb, &url, Format::Xml)
            .header(CONTENT_TYPE, "application/xml")
            .body(xml);
        self.execute(verb, url, req, &RequestOptions { format: Format::Xml, ..*options })
            .await
    }

    /// Uploads a file to `fileuploads/{endpoint}` (e.g. `policies/id/12`
    /// for a Self Service icon).
    ///
    /// `name` defaults to the file name of `path` and must carry an
    /// extension. `mime_type` defaults to a guess from that extension
    /// (`icon.png` is sent as `image/png`), falling back to
    /// `application/octet-stream` for unknown extensions.
    ///
    /// # Errors
    ///
    /// - `JssError::MissingExtension` — raised before the file is read or
    ///   any request is sent. Carries the offending upload name.
    /// - `JssError::InvalidMimeType` — `mime_type` does not parse; also
    ///   raised before any I/O.
    /// - `JssError::Io` — `path` could not be read.
    /// - `JssError::HttpStatus` — any status other than 201 (unless raw).
    /// - `JssError::Network` — transport-level failure.
    pub async fn upload(
        &self,
        endpoint: &str,
        path: &Path,
        name: Option<&str>,
        mime_type: Option<&str>,
        options: &RequestOptions,
    ) -> Result<Outcome> {
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        check_upload_name(&name)?;
        let mime = upload_mime_type(&name, mime_type)?;

        let url = self.url(&format!("fileuploads/{}", endpoint.trim_start_matches('/')));
        tracing::debug!(url = %url, path = %path.display(), mime = %mime, "uploading");

        let bytes = tokio::fs::read(path).await.map_err(|source| JssError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name)
            .mime_str(mime.as_ref())
            .map_err(|_| JssError::InvalidMimeType(mime.to_string()))?;
        let form = reqwest::multipart::Form::new().part("name", part);

        let req = self.request(Verb::Upload, &url, Format::Xml).multipart(form);
        self.execute(Verb::Upload, url, req, options).await
    }
}

/// Explicit `mime_type` if it parses, otherwise a guess from `name`.
fn upload_mime_type(name: &str, mime_type: Option<&str>) -> Result<Mime> {
    match mime_type {
        Some(explicit) => explicit
            .parse()
            .map_err(|_| JssError::InvalidMimeType(explicit.to_string())),
        None => Ok(mime_guess::from_path(name).first_or_octet_stream()),
    }
}

fn expect_document(outcome: Outcome) -> Result<Value> {
    match outcome {
        Outcome::Document(value) => Ok(value),
        other => Err(JssError::UnexpectedOutcome {
            expected: "document",
            found: other.kind(),
        }),
    }
}
