//! CLI entry point for jss — a Jamf Pro classic API client.
//!
//! Subcommands:
//! - `get` — fetch a JSSResource endpoint and print it as JSON.
//! - `decode` — convert an XML document (file or stdin) to JSON.
//! - `encode` — convert a JSON document (file or stdin) to XML.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (HTTP error, malformed document, network failure, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jss_client::classify::{Outcome, RequestOptions};
use jss_client::client::JssClient;
use jss_client::config::ClientConfig;
use jss_client::convert::{from_xml, to_xml, to_xml_wrapped};
use jss_client::{JssError, Value};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch an endpoint (e.g. "policies/id/1") and print it as JSON.
    Get {
        endpoint: String,

        /// Request the JSON representation (sometimes incomplete).
        #[arg(long)]
        json: bool,

        /// Print the status and untouched body, even for failed requests.
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Convert an XML document to JSON.
    Decode {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Convert a JSON document to XML.
    Encode {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,

        /// Wrap the output in this root tag.
        #[arg(long)]
        root: Option<String>,
    },
}

/// Server connection settings. Flags override values from `--config`.
#[derive(Args)]
struct ConnectionArgs {
    /// TOML file with address, port, username and password.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSS host name (e.g. jss.example.edu).
    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    user: Option<String>,

    /// API password. Prefer the JSS_PASSWORD environment variable to keep
    /// it out of process listings and shell history.
    #[arg(long, env = "JSS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl ConnectionArgs {
    /// Merges the optional config file with command-line overrides.
    fn resolve(&self) -> jss_client::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::new(self.address.as_deref().unwrap_or_default()),
        };
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(file: Option<&Path>) -> jss_client::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| JssError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| JssError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            Ok(text)
        }
    }
}

async fn run(command: Command) -> jss_client::Result<String> {
    match command {
        Command::Get {
            endpoint,
            json,
            raw,
            connection,
        } => {
            let client = JssClient::new(&connection.resolve()?)?;
            let mut options = if json {
                RequestOptions::json()
            } else {
                RequestOptions::default()
            };
            options.raw = raw;

            match client.get(&endpoint, &options).await? {
                Outcome::Document(value) => Ok(serde_json::to_string_pretty(&value)?),
                Outcome::Json(json) => Ok(serde_json::to_string_pretty(&json)?),
                Outcome::Raw(response) => Ok(format!("{}\n{}", response.status, response.body)),
                Outcome::Uploaded => Ok(String::new()),
            }
        }
        Command::Decode { file } => {
            let value = from_xml(&read_input(file.as_deref())?)?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        Command::Encode { file, root } => {
            let json: serde_json::Value = serde_json::from_str(&read_input(file.as_deref())?)?;
            let value = Value::from(json);
            match root {
                Some(tag) => to_xml_wrapped(&value, &tag),
                None => to_xml(&value),
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_parses_endpoint_and_flags() {
        let cli = Cli::try_parse_from([
            "jss",
            "get",
            "policies/id/1",
            "--json",
            "--address",
            "jss.example.edu",
            "--user",
            "api",
        ])
        .expect("should parse a complete get command");
        let Command::Get {
            endpoint,
            json,
            raw,
            connection,
        } = cli.command
        else {
            panic!("expected the get subcommand");
        };
        assert_eq!(endpoint, "policies/id/1");
        assert!(json);
        assert!(!raw);
        assert_eq!(connection.address.as_deref(), Some("jss.example.edu"));
        assert_eq!(connection.user.as_deref(), Some("api"));
    }

    #[test]
    fn get_requires_endpoint() {
        assert!(Cli::try_parse_from(["jss", "get"]).is_err());
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["jss"]).is_err());
    }

    #[test]
    fn encode_accepts_root_tag() {
        let cli = Cli::try_parse_from(["jss", "encode", "policy.json", "--root", "policy"]).unwrap();
        let Command::Encode { file, root } = cli.command else {
            panic!("expected the encode subcommand");
        };
        assert_eq!(file.as_deref(), Some(Path::new("policy.json")));
        assert_eq!(root.as_deref(), Some("policy"));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["jss", "decode", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn connection_flags_override_nothing_without_address() {
        let conn = ConnectionArgs {
            config: None,
            address: None,
            port: None,
            user: None,
            password: None,
        };
        assert!(matches!(conn.resolve(), Err(JssError::Config(_))));
    }

    #[test]
    fn connection_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jss.toml");
        std::fs::write(&path, "address = \"from-file\"\nport = 443\nusername = \"file-user\"\n")
            .unwrap();
        let conn = ConnectionArgs {
            config: Some(path),
            address: None,
            port: None,
            user: Some("cli-user".to_string()),
            password: Some("pw".to_string()),
        };
        let config = conn.resolve().unwrap();
        assert_eq!(config.address, "from-file");
        assert_eq!(config.port, 443);
        assert_eq!(config.username.as_deref(), Some("cli-user"));
        assert_eq!(config.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn encode_then_decode_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("policy.json");
        std::fs::write(
            &json_path,
            r#"{"general": {"name": "Firefox", "enabled": true}, "scope": {"computer": ["a", "b"]}}"#,
        )
        .unwrap();

        let xml = run(Command::Encode {
            file: Some(json_path),
            root: Some("policy".to_string()),
        })
        .await
        .unwrap();
        assert_eq!(
            xml,
            "<policy><general><name>Firefox</name><enabled>true</enabled></general>\
             <scope><computer>a</computer><computer>b</computer></scope></policy>"
        );

        let xml_path = dir.path().join("policy.xml");
        std::fs::write(&xml_path, &xml).unwrap();
        let json = run(Command::Decode { file: Some(xml_path) }).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["policy"]["general"]["enabled"], "true");
        assert_eq!(parsed["policy"]["scope"]["computer"][1], "b");
    }
}
