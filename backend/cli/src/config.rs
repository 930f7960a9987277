use std::time::Duration;

use labelguard_providers::ProviderKind;

const DEFAULT_RATE_LIMIT: (u32, u64) = (30, 60);

/// LabelGuard runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// SQLite history database path
    pub db_path: String,
    /// Vision provider name (`gemini` or `openai`)
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Model override; the provider default is used when unset
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_upload_mb: usize,
    /// Requests allowed per client per window
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub catalog_url: Option<String>,
    /// Directory for rolling JSON logs; empty disables file logging
    pub log_dir: Option<String>,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            db_path: "labelguard.db".to_string(),
            provider: "gemini".to_string(),
            gemini_api_key: None,
            openai_api_key: None,
            model: None,
            timeout_secs: 60,
            max_upload_mb: 10,
            rate_limit_requests: DEFAULT_RATE_LIMIT.0,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT.1,
            catalog_url: None,
            log_dir: Some("logs".to_string()),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let (rate_limit_requests, rate_limit_window_secs) = non_empty("LABELGUARD_RATE_LIMIT")
            .and_then(|v| parse_rate_limit(&v))
            .unwrap_or(DEFAULT_RATE_LIMIT);

        Self {
            bind_address: non_empty("LABELGUARD_BIND").unwrap_or(defaults.bind_address),
            port: non_empty("LABELGUARD_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            db_path: non_empty("LABELGUARD_DB").unwrap_or(defaults.db_path),
            provider: non_empty("LABELGUARD_PROVIDER").unwrap_or(defaults.provider),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            model: non_empty("LABELGUARD_MODEL"),
            timeout_secs: non_empty("LABELGUARD_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .unwrap_or(defaults.timeout_secs),
            max_upload_mb: non_empty("LABELGUARD_MAX_UPLOAD_MB")
                .and_then(|v| v.parse().ok())
                .filter(|&mb: &usize| mb > 0)
                .unwrap_or(defaults.max_upload_mb),
            rate_limit_requests,
            rate_limit_window_secs,
            catalog_url: non_empty("LABELGUARD_CATALOG_URL"),
            log_dir: match var("LABELGUARD_LOG_DIR") {
                Some(dir) if dir.trim().is_empty() => None,
                Some(dir) => Some(dir.trim().to_string()),
                None => defaults.log_dir,
            },
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Falls back to Gemini when the configured name is unknown.
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to the default vision provider");
            ProviderKind::default()
        })
    }

    /// Key for the selected provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider_kind() {
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// `"N"` or `"N/SECS"`; zero values are rejected.
fn parse_rate_limit(value: &str) -> Option<(u32, u64)> {
    let (requests, window) = match value.split_once('/') {
        Some((requests, window)) => (requests.trim().parse().ok()?, window.trim().parse().ok()?),
        None => (value.trim().parse().ok()?, DEFAULT_RATE_LIMIT.1),
    };
    (requests > 0 && window > 0).then_some((requests, window))
}
