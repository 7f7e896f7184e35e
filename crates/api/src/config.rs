//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// How create and delete requests reach the backend services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Call the services directly and wait for them.
    #[default]
    Sync,
    /// Publish events and return once they are accepted.
    Async,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(WriteMode::Sync),
            "async" => Ok(WriteMode::Async),
            other => Err(format!("unknown write mode: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `7000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `SERVICE_ADDRESS`: address reported in aggregates (default: `"{HOSTNAME}:{PORT}"`)
/// - `PRODUCT_SERVICE_URL`, `REVIEW_SERVICE_URL`, `RECOMMENDATION_SERVICE_URL`
/// - `DOWNSTREAM_TIMEOUT_MS`: per-call timeout (default: `5000`)
/// - `PUBLISH_WORKERS`, `PUBLISH_QUEUE_DEPTH`: event publisher sizing (default: `10`, `100`)
/// - `WRITE_MODE`: `sync` or `async` (default: `sync`)
/// - `REDIS_URL`: event bus; events are only logged when unset
/// - `AUTH_TOKENS`: `token=scope scope;token=scope`; authorization is off when unset
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub service_address: String,
    pub product_service_url: String,
    pub review_service_url: String,
    pub recommendation_service_url: String,
    pub downstream_timeout: Duration,
    pub publish_workers: usize,
    pub publish_queue_depth: usize,
    pub write_mode: WriteMode,
    pub redis_url: Option<String>,
    pub auth_tokens: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = parse_var(&lookup, "PORT").unwrap_or(defaults.port);
        let service_address = lookup("SERVICE_ADDRESS").unwrap_or_else(|| {
            let hostname = lookup("HOSTNAME").unwrap_or_else(|| "localhost".to_string());
            format!("{hostname}:{port}")
        });

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            service_address,
            product_service_url: lookup("PRODUCT_SERVICE_URL")
                .unwrap_or(defaults.product_service_url),
            review_service_url: lookup("REVIEW_SERVICE_URL").unwrap_or(defaults.review_service_url),
            recommendation_service_url: lookup("RECOMMENDATION_SERVICE_URL")
                .unwrap_or(defaults.recommendation_service_url),
            downstream_timeout: parse_var(&lookup, "DOWNSTREAM_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.downstream_timeout),
            publish_workers: parse_var(&lookup, "PUBLISH_WORKERS").unwrap_or(defaults.publish_workers),
            publish_queue_depth: parse_var(&lookup, "PUBLISH_QUEUE_DEPTH")
                .unwrap_or(defaults.publish_queue_depth),
            write_mode: parse_var(&lookup, "WRITE_MODE").unwrap_or(defaults.write_mode),
            redis_url: lookup("REDIS_URL").filter(|v| !v.is_empty()),
            auth_tokens: lookup("AUTH_TOKENS").filter(|v| !v.trim().is_empty()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            service_address: "localhost:7000".to_string(),
            product_service_url: "http://product-service".to_string(),
            review_service_url: "http://review-service".to_string(),
            recommendation_service_url: "http://recommendation-service".to_string(),
            downstream_timeout: Duration::from_millis(5000),
            publish_workers: 10,
            publish_queue_depth: 100,
            write_mode: WriteMode::Sync,
            redis_url: None,
            auth_tokens: None,
        }
    }
}
