//! Configuration management
//!
//! This module provides YAML-based configuration with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings
//! - TLS material given either as file paths or inline PEM text

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::error::CaError;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub puppet_ca: PuppetCaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// PEM material, either read from a file or given inline
///
/// Written in YAML as `{ file: <path> }` or `{ inline: <pem> }`.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "PemSourceRepr", into = "PemSourceRepr")]
pub enum PemSource {
    File(PathBuf),
    Inline(String),
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PemSourceRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline: Option<String>,
}

impl TryFrom<PemSourceRepr> for PemSource {
    type Error = String;

    fn try_from(repr: PemSourceRepr) -> Result<Self, Self::Error> {
        match (repr.file, repr.inline) {
            (Some(path), None) => Ok(PemSource::File(path)),
            (None, Some(pem)) => Ok(PemSource::Inline(pem)),
            _ => Err("exactly one of `file` or `inline` must be set".to_string()),
        }
    }
}

impl From<PemSource> for PemSourceRepr {
    fn from(source: PemSource) -> Self {
        match source {
            PemSource::File(path) => Self {
                file: Some(path),
                inline: None,
            },
            PemSource::Inline(pem) => Self {
                file: None,
                inline: Some(pem),
            },
        }
    }
}

impl PemSource {
    pub fn is_file(&self) -> bool {
        matches!(self, PemSource::File(_))
    }

    /// Resolve to PEM bytes, reading the file if needed
    pub fn read(&self) -> Result<Vec<u8>, CaError> {
        match self {
            PemSource::File(path) => std::fs::read(path).map_err(|e| {
                CaError::Config(format!("Failed to read {}: {}", path.display(), e))
            }),
            PemSource::Inline(pem) => Ok(pem.as_bytes().to_vec()),
        }
    }

    /// Short description for messages; never includes inline content
    pub fn describe(&self) -> String {
        match self {
            PemSource::File(path) => format!("file {}", path.display()),
            PemSource::Inline(_) => "inline PEM".to_string(),
        }
    }
}

// Inline sources may hold a private key
impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PemSource::File(path) => f.debug_tuple("File").field(path).finish(),
            PemSource::Inline(pem) => write!(f, "Inline(<{} bytes>)", pem.len()),
        }
    }
}

/// Client TLS material for the CA connection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PuppetCaSslConfig {
    /// Client certificate presented to the CA
    #[serde(default)]
    pub cert: Option<PemSource>,
    /// Private key for the client certificate, same form as `cert`
    #[serde(default)]
    pub key: Option<PemSource>,
    /// CA bundle; the only trust anchors used
    #[serde(default)]
    pub ca: Option<PemSource>,
}

/// Puppet CA connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PuppetCaConfig {
    #[serde(default = "default_ca_url")]
    pub url: String,
    /// Timeout in seconds (supports both timeout_secs and timeout field names)
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub ssl: PuppetCaSslConfig,
}

impl Default for PuppetCaConfig {
    fn default() -> Self {
        Self {
            url: default_ca_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            ssl: PuppetCaSslConfig::default(),
        }
    }
}

fn default_ca_url() -> String {
    "https://puppet:8140".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Log file name prefix (default: "openvox-ca")
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to stderr
    #[default]
    Console,
    /// Log to file with optional rotation
    File,
    /// Log to both console and file
    Both,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/openvox/ca-client")
}

fn default_log_prefix() -> String {
    "openvox-ca".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML), `path` if given
    /// 3. Environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("OPENVOX_CA_CONFIG").map(PathBuf::from).ok())
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            // System config directory
            PathBuf::from("/etc/openvox-ca/config.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("openvox-ca/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.is_file())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup; TLS overrides are file paths
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("PUPPET_CA_URL") {
            self.puppet_ca.url = url;
        }
        if let Some(timeout) = var("PUPPET_CA_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.puppet_ca.timeout_secs = secs;
            }
        }

        // Puppet CA SSL overrides
        if let Some(cert) = var("PUPPET_CA_SSL_CERT") {
            self.puppet_ca.ssl.cert = Some(PemSource::File(PathBuf::from(cert)));
        }
        if let Some(key) = var("PUPPET_CA_SSL_KEY") {
            self.puppet_ca.ssl.key = Some(PemSource::File(PathBuf::from(key)));
        }
        if let Some(ca) = var("PUPPET_CA_SSL_CA") {
            self.puppet_ca.ssl.ca = Some(PemSource::File(PathBuf::from(ca)));
        }

        // Logging overrides
        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = var("OPENVOX_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Compact,
            };
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let ca = &self.puppet_ca;

        let url = reqwest::Url::parse(&ca.url)
            .with_context(|| format!("Invalid Puppet CA URL: {}", ca.url))?;
        if !matches!(url.scheme(), "https" | "http") {
            anyhow::bail!("Puppet CA URL must use https: {}", ca.url);
        }
        if url.scheme() == "http" {
            tracing::warn!("Puppet CA URL {} is not using TLS", ca.url);
        }

        if ca.timeout_secs == 0 || ca.connect_timeout_secs == 0 {
            anyhow::bail!("Puppet CA timeouts must be greater than zero");
        }

        let ssl = &ca.ssl;
        let (Some(cert), Some(key)) = (&ssl.cert, &ssl.key) else {
            anyhow::bail!("puppet_ca.ssl.cert and puppet_ca.ssl.key are both required");
        };
        if cert.is_file() != key.is_file() {
            anyhow::bail!(
                "puppet_ca.ssl.cert ({}) and puppet_ca.ssl.key ({}) must both be files or both be inline",
                cert.describe(),
                key.describe()
            );
        }
        if ssl.ca.is_none() {
            anyhow::bail!("puppet_ca.ssl.ca is required");
        }

        Ok(())
    }
}
