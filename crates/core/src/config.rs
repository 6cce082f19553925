use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `APPDESK__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_store: DataStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Hosted data store connection (PostgREST-compatible endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct DataStoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

// Default functions
fn default_store_url() -> String {
    "http://localhost:54321".to_string()
}
fn default_store_timeout_ms() -> u64 {
    10_000
}
fn default_ttl_secs() -> u64 {
    60
}
fn default_max_entries() -> usize {
    50_000
}
fn default_lookup_timeout_ms() -> u64 {
    5_000
}
fn default_user_agent() -> String {
    concat!("appdesk/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_trend_months() -> u32 {
    6
}
fn default_top_n() -> usize {
    5
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            api_key: String::new(),
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            trend_months: default_trend_months(),
            top_n: default_top_n(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_store: DataStoreConfig::default(),
            cache: CacheConfig::default(),
            integrations: IntegrationsConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, e.g.
    /// `APPDESK__DATA_STORE__URL` or `APPDESK__CACHE__TTL_SECS`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("APPDESK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
