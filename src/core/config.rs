//! Configuration management for the MCP servers.
//!
//! Every setting comes from the environment (a `.env` file is honoured) with
//! defaults for everything except the backend identifiers, which
//! [`Config::validate`] checks for the selected service.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::transport::TransportConfig;

/// Main configuration structure for the MCP servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend served by this process, as given (`s3`, `aurora`, `location`).
    pub service: Option<String>,

    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Per-call deadline and shutdown grace.
    pub dispatch: DispatchConfig,

    /// Backoff applied to transient backend failures.
    pub retry: RetryConfig,

    /// Shared AWS SDK settings.
    pub aws: AwsConfig,

    /// RDS Data API identifiers.
    pub aurora: AuroraConfig,

    /// Amazon Location Service resource names.
    pub location: LocationConfig,
}

/// The backend a server process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    S3,
    Aurora,
    Location,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Aurora => "aurora",
            Self::Location => "location",
        }
    }

    /// Name reported to clients when `MCP_SERVER_NAME` is unset.
    pub fn default_server_name(&self) -> &'static str {
        match self {
            Self::S3 => "s3-mcp-server",
            Self::Aurora => "aurora-postgres-mcp-server",
            Self::Location => "location-mcp-server",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "aurora" | "aurora-postgres" | "postgres" => Ok(Self::Aurora),
            "location" => Ok(Self::Location),
            other => Err(Error::config(format!(
                "unknown service '{other}' (expected s3, aurora or location)"
            ))),
        }
    }
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name reported to clients; derived from the service when unset.
    pub name: Option<String>,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Dispatcher limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Deadline for a single tool call.
    pub call_timeout_ms: u64,

    /// Time in-flight calls get to finish after shutdown is requested.
    pub shutdown_grace_ms: u64,
}

impl DispatchConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 30_000,
            shutdown_grace_ms: 5_000,
        }
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per backend call, including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

/// Shared AWS SDK settings; credentials always come from the SDK chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region override; the SDK's own resolution applies when unset.
    pub region: Option<String>,
}

/// RDS Data API identifiers for the Aurora server.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuroraConfig {
    pub cluster_arn: Option<String>,
    pub secret_arn: Option<String>,
    /// Database used when a call names none.
    pub database: String,
}

impl Default for AuroraConfig {
    fn default() -> Self {
        Self {
            cluster_arn: None,
            secret_arn: None,
            database: "postgres".to_string(),
        }
    }
}

/// Custom Debug implementation to redact the secret ARN from logs.
impl fmt::Debug for AuroraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuroraConfig")
            .field("cluster_arn", &self.cluster_arn)
            .field("secret_arn", &self.secret_arn.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .finish()
    }
}

/// Amazon Location Service resources for the Location server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    pub place_index: Option<String>,
    pub route_calculator: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: None,
            server: ServerConfig {
                name: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            dispatch: DispatchConfig::default(),
            retry: RetryConfig::default(),
            aws: AwsConfig::default(),
            aurora: AuroraConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        config.service = non_empty_var("MCP_SERVICE");
        config.server.name = non_empty_var("MCP_SERVER_NAME");

        if let Some(level) = non_empty_var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Some(ms) = parsed_var("MCP_CALL_TIMEOUT_MS") {
            config.dispatch.call_timeout_ms = ms;
        }
        if let Some(ms) = parsed_var("MCP_SHUTDOWN_GRACE_MS") {
            config.dispatch.shutdown_grace_ms = ms;
        }

        if let Some(attempts) = parsed_var("MCP_RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = parsed_var("MCP_RETRY_BASE_DELAY_MS") {
            config.retry.base_delay_ms = ms;
        }
        if let Some(ms) = parsed_var("MCP_RETRY_MAX_DELAY_MS") {
            config.retry.max_delay_ms = ms;
        }

        config.aws.region = non_empty_var("AWS_REGION");

        config.aurora.cluster_arn = non_empty_var("DB_CLUSTER_ARN");
        config.aurora.secret_arn = non_empty_var("DB_SECRET_ARN");
        if let Some(database) = non_empty_var("DEFAULT_DB_NAME") {
            config.aurora.database = database;
        }

        config.location.place_index = non_empty_var("LOCATION_PLACE_INDEX");
        config.location.route_calculator = non_empty_var("LOCATION_ROUTE_CALCULATOR");

        config
    }

    /// Select the service, overriding `MCP_SERVICE`.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Resolve the selected service and check its required settings.
    pub fn validate(&self) -> Result<ServiceKind> {
        let service: ServiceKind = self
            .service
            .as_deref()
            .ok_or_else(|| {
                Error::config("no service selected; set MCP_SERVICE or pass s3, aurora or location")
            })?
            .parse()?;

        match service {
            ServiceKind::S3 => {}
            ServiceKind::Aurora => {
                if self.aurora.cluster_arn.is_none() {
                    return Err(Error::config("DB_CLUSTER_ARN is required for the aurora service"));
                }
                if self.aurora.secret_arn.is_none() {
                    return Err(Error::config("DB_SECRET_ARN is required for the aurora service"));
                }
            }
            ServiceKind::Location => {
                if self.location.place_index.is_none() {
                    return Err(Error::config(
                        "LOCATION_PLACE_INDEX is required for the location service",
                    ));
                }
                if self.location.route_calculator.is_none() {
                    return Err(Error::config(
                        "LOCATION_ROUTE_CALCULATOR is required for the location service",
                    ));
                }
            }
        }

        if self.dispatch.call_timeout_ms == 0 {
            return Err(Error::config("MCP_CALL_TIMEOUT_MS must be greater than zero"));
        }

        info!(service = %service, "Configuration validated");
        Ok(service)
    }

    /// Name reported to clients.
    pub fn server_name(&self, service: ServiceKind) -> String {
        self.server
            .name
            .clone()
            .unwrap_or_else(|| service.default_server_name().to_string())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = non_empty_var(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}: {}", key, raw);
            None
        }
    }
}
