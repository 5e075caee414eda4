//! `mcpdesk.toml` loading and validation.
//!
//! Every field is optional. The file itself is optional too, unless named
//! explicitly with `--config`. Invalid values abort start-up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use transport::{TransportSettings, DEFAULT_MESSAGE_PATH};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mcpdesk.toml";

/// Registry document used when neither config nor flags name one.
pub const DEFAULT_REGISTRY_FILE: &str = "mcp-server-list.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub registry_path: PathBuf,
    /// Undelivered replies buffered for the UI subscriber.
    pub reply_buffer: usize,
    pub logging: LoggingConfig,
    pub transport: TransportConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            reply_buffer: connection::DEFAULT_REPLY_BUFFER,
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub format: LogFormat,
    /// OTLP gRPC collector. Spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            otlp_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub http_path: String,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_path: DEFAULT_MESSAGE_PATH.to_string(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl TransportConfig {
    pub fn settings(&self) -> TransportSettings {
        TransportSettings {
            http_path: self.http_path.clone(),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl CliConfig {
    /// Loads the configuration.
    ///
    /// With `explicit`, that file must exist. Otherwise [`DEFAULT_CONFIG_FILE`]
    /// is read if present and defaults are used if not.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reply_buffer == 0 {
            bail!("reply_buffer must be greater than zero");
        }
        if !self.transport.http_path.starts_with('/') {
            bail!(
                "transport.http_path must start with '/', got '{}'",
                self.transport.http_path
            );
        }
        if self.transport.connect_timeout_secs == Some(0) {
            bail!("transport.connect_timeout_secs must be greater than zero");
        }
        if self.transport.request_timeout_secs == Some(0) {
            bail!("transport.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
