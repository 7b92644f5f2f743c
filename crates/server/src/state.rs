use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::mail::{build_mailer, Mailer};
use dashmap::DashMap;
use doclink::DocLink;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    /// Reference table and resolver (shared across requests)
    pub doclink: Arc<DocLink>,

    /// Outbound mail transport
    pub mailer: Arc<dyn Mailer>,

    /// Prometheus render handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Load the table and build the mail transport from `config`.
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> ServerResult<Self> {
        let doclink = DocLink::from_config(&config.doclink_config())?;
        let mailer = build_mailer(&config.mail)?;
        Ok(Self::with_parts(config, doclink, mailer, metrics))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(
        config: ServerConfig,
        doclink: DocLink,
        mailer: Arc<dyn Mailer>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            doclink: Arc::new(doclink),
            mailer,
            metrics,
        }
    }

    /// Authentication is enforced only when at least one key is configured.
    pub fn auth_enabled(&self) -> bool {
        !self.config.api_keys.is_empty()
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}
