use doclink::{DocLinkConfig, MatchConfig, TableConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use crate::mail::MailConfig;
use crate::payload::PayloadConfig;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Rate limit: requests per minute per API key
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Accepted API keys. Empty disables authentication on `/api/v1/*`.
    #[serde(default)]
    pub api_keys: HashSet<String>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level / `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the Prometheus recorder and serve it on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Reference table source
    #[serde(default)]
    pub table: TableConfig,

    /// Matcher thresholds and vocabulary
    #[serde(default)]
    pub matching: MatchConfig,

    /// Outbound mail transport and templates
    #[serde(default)]
    pub mail: MailConfig,

    /// Webhook field aliases
    #[serde(default)]
    pub payload: PayloadConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            table: TableConfig::default(),
            matching: MatchConfig::default(),
            mail: MailConfig::default(),
            payload: PayloadConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `doclink.*` file, then
    /// `DOCLINK__*` environment variables (e.g. `DOCLINK__MAIL__TRANSPORT=http`).
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("doclink").required(false))
            .add_source(
                config::Environment::with_prefix("DOCLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api_keys")
                    .with_list_parse_key("matching.vocabulary")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        if config.api_keys.is_empty() {
            tracing::warn!("No API keys configured, /api/v1 endpoints are unauthenticated");
        }

        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_body_size_mb == 0 {
            anyhow::bail!("max_body_size_mb must be greater than zero");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        self.doclink_config().validate()?;
        self.mail.validate()?;
        Ok(())
    }

    /// The lookup half of the configuration.
    pub fn doclink_config(&self) -> DocLinkConfig {
        DocLinkConfig {
            table: self.table.clone(),
            matching: self.matching.clone(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_rate_limit_per_minute() -> u32 {
    120
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MailTransport;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size(), 1024 * 1024);
        assert!(cfg.api_keys.is_empty());
        assert!(cfg.enable_cors);
        assert_eq!(cfg.mail.transport, MailTransport::Log);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_nested_sections_deserialize() {
        let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
            "port": 9000,
            "table": { "path": "documents.csv" },
            "matching": { "min_gap": 60 },
            "mail": { "transport": "log", "from": "docs@example.org" }
        }))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.matching.min_gap, 60);
        assert_eq!(cfg.matching.min_score, 140);
        assert_eq!(
            cfg.doclink_config().table.path.as_deref(),
            Some(std::path::Path::new("documents.csv"))
        );
    }

    #[test]
    fn test_invalid_matching_rejected() {
        let mut cfg = ServerConfig::default();
        cfg.matching.min_query_len = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_http_mail_requires_endpoint() {
        let mut cfg = ServerConfig::default();
        cfg.mail.transport = MailTransport::Http;
        cfg.mail.api_url = None;
        assert!(cfg.validate().is_err());
    }
}
