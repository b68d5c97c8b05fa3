//! Connection settings for a JSS server.
//!
//! A [`ClientConfig`] is an ordinary value: build it in code, or load it
//! from a TOML file and then override fields from the command line.
//!
//! ```toml
//! address = "jss.example.edu"
//! port = 8443
//! username = "api-reader"
//! password = "…"
//! ```
//!
//! The library only reads configuration; it never writes credentials.

use std::path::Path;

use serde::Deserialize;

use crate::error::{JssError, Result};

/// Port the classic JSSResource API listens on by default.
pub const DEFAULT_PORT: u16 = 8443;

/// Connection settings consumed by [`JssClient`](crate::client::JssClient).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Host name of the JSS, without scheme or port (`"jss.example.edu"`).
    pub address: String,

    /// HTTPS port, [`DEFAULT_PORT`] unless set.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic-auth user. Requests are sent unauthenticated when `None`.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ClientConfig {
    /// Anonymous configuration on the default port.
    pub fn new(address: &str) -> Self {
        ClientConfig {
            address: address.to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
        }
    }

    /// Builder: sets basic-auth credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Parses TOML configuration text.
    ///
    /// # Errors
    ///
    /// `JssError::Config` if the text is not valid TOML, lacks `address`,
    /// or `address` is blank.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(text).map_err(|e| JssError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// `JssError::Io` if the file cannot be read, otherwise as
    /// [`ClientConfig::from_toml`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| JssError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Rejects a configuration that cannot address a server.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(JssError::Config("no address specified".to_string()));
        }
        Ok(())
    }

    /// `https://{address}:{port}/JSSResource`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/JSSResource", self.address, self.port)
    }
}
