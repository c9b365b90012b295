use crate::nos::error::{ClientError, ClientErrorCode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Wire protocol used to reach the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub const fn scheme(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => anyhow::bail!("unknown protocol '{}', expected http or https", other),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service host, e.g. `nos-eastchina1.126.net`
    pub endpoint: String,

    /// Access key (empty = anonymous)
    #[serde(default)]
    pub access_key: String,

    /// Secret key (empty = anonymous)
    #[serde(default)]
    pub secret_key: String,

    #[serde(default)]
    pub protocol: Protocol,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Time allowed until response headers arrive, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Max wait for each response body chunk, in seconds
    #[serde(default = "default_read_write_timeout")]
    pub read_write_timeout: u64,

    /// Idle pooled connections kept per host
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    /// Default tracing level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    300
}

fn default_read_write_timeout() -> u64 {
    60
}

fn default_max_idle_connections() -> usize {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configuration for `endpoint` with every other field defaulted
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: String::new(),
            secret_key: String::new(),
            protocol: Protocol::default(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            read_write_timeout: default_read_write_timeout(),
            max_idle_connections: default_max_idle_connections(),
            log_level: default_log_level(),
        }
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn read_write_timeout(&self) -> Duration {
        Duration::from_secs(self.read_write_timeout)
    }

    /// Validates the configuration before a client is built
    pub fn check(&self) -> std::result::Result<(), ClientError> {
        if self.endpoint.trim().is_empty() {
            return Err(ClientError::new(ClientErrorCode::ConfigEndpoint));
        }
        if self.connect_timeout == 0 || self.request_timeout == 0 || self.read_write_timeout == 0 {
            return Err(ClientError::new(ClientErrorCode::ConfigTimeout));
        }
        if self.max_idle_connections == 0 {
            return Err(ClientError::new(ClientErrorCode::ConfigMaxIdleConnection));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("protocol", &self.protocol)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("read_write_timeout", &self.read_write_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    Ok(config)
}

fn parse_env<T: FromStr>(name: &str, target: &mut T) -> Result<()>
where
    T::Err: fmt::Display,
{
    if let Ok(raw) = std::env::var(name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, raw, e))?;
    }
    Ok(())
}

/// Load configuration from environment variables
///
/// - NOS_ENDPOINT (required)
/// - NOS_ACCESS_KEY / NOS_SECRET_KEY (optional, anonymous when unset)
/// - NOS_PROTOCOL (http or https, defaults to http)
/// - NOS_CONNECT_TIMEOUT, NOS_REQUEST_TIMEOUT, NOS_READ_WRITE_TIMEOUT (seconds)
/// - NOS_MAX_IDLE_CONNECTIONS
/// - NOS_LOG_LEVEL
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let endpoint = std::env::var("NOS_ENDPOINT")
        .context("NOS_ENDPOINT environment variable not set")?;

    let mut config = Config::new(endpoint.trim());

    if let Ok(access_key) = std::env::var("NOS_ACCESS_KEY") {
        config.access_key = access_key;
    }
    if let Ok(secret_key) = std::env::var("NOS_SECRET_KEY") {
        config.secret_key = secret_key;
    }
    if let Ok(level) = std::env::var("NOS_LOG_LEVEL") {
        config.log_level = level;
    }

    parse_env("NOS_PROTOCOL", &mut config.protocol)?;
    parse_env("NOS_CONNECT_TIMEOUT", &mut config.connect_timeout)?;
    parse_env("NOS_REQUEST_TIMEOUT", &mut config.request_timeout)?;
    parse_env("NOS_READ_WRITE_TIMEOUT", &mut config.read_write_timeout)?;
    parse_env("NOS_MAX_IDLE_CONNECTIONS", &mut config.max_idle_connections)?;

    Ok(config)
}

/// Load configuration from file or environment, then validate it
///
/// # Arguments
/// * `config_path` - Optional path to YAML config file; environment otherwise
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config = match config_path {
        Some(path) => load_from_yaml(path)?,
        None => load_from_env()?,
    };

    config.check().context("Invalid configuration")?;
    Ok(config)
}
