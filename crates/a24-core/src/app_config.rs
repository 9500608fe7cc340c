#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings shared by every sync phase. Built once at startup and passed
/// explicitly into each component.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    /// Enables per-record debug lines for rejected upstream products.
    pub debug: bool,
    pub api_base_url: String,
    pub api_token: String,
    pub merchant_id: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on product listing pages fetched in one pass.
    pub max_pages: u32,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Attribute name that marks the variation axis of a variable product.
    pub variation_attribute: String,
    /// Skip creating products whose upstream category has no shop term yet.
    pub require_category: bool,
    pub image_probe_timeout_secs: u64,
    pub sync_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("debug", &self.debug)
            .field("database_url", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &"[redacted]")
            .field("merchant_id", &self.merchant_id)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_pages", &self.max_pages)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("variation_attribute", &self.variation_attribute)
            .field("require_category", &self.require_category)
            .field("image_probe_timeout_secs", &self.image_probe_timeout_secs)
            .field("sync_cron", &self.sync_cron)
            .finish()
    }
}
