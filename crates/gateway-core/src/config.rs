//! Gateway configuration.
//!
//! Every option enumerated in the external interfaces section, loaded as a
//! `serde`-deserializable struct with `Default` plus env-var overrides via
//! `from_env()`.

use serde::{Deserialize, Serialize};

/// Which backend renders the filter language into a query: the catalogue's
/// own query language, or (not implemented here) the relational database
/// alternative referenced only through the `QueryBuilder` trait boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Catalogue,
    Relational,
}

/// Log levels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Crit,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_tracing(&self) -> tracing::Level {
        match self {
            Self::Crit | Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
        }
    }
}

/// Credentials the gateway uses to log into the catalogue for its own
/// pooled/anonymous identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestUserCredentials {
    pub username: String,
    pub password: String,
}

/// Main application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// LRU size of the authenticator cache (`(mechanism, username) -> session`).
    #[serde(default = "default_client_cache_size")]
    pub client_cache_size: usize,

    /// Number of sessions the pool eagerly authenticates on startup.
    #[serde(default = "default_pool_init_size")]
    pub client_pool_init_size: usize,

    /// Maximum number of sessions the pool will hold concurrently.
    #[serde(default = "default_pool_max_size")]
    pub client_pool_max_size: usize,

    /// Base URL of the catalogue's session/query endpoint.
    #[serde(default = "default_catalogue_url")]
    pub catalogue_url: String,

    /// Verify the catalogue's TLS certificate.
    #[serde(default = "default_true")]
    pub catalogue_check_cert: bool,

    /// Relational-backend connection string (only used when `backend` is
    /// `Relational`; ignored otherwise).
    pub db_url: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Where logs are written; `-` means stdout.
    #[serde(default = "default_log_location")]
    pub log_location: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// URL path prefix both API surfaces are served under.
    #[serde(default)]
    pub extension: String,

    /// Credentials used to eagerly authenticate the pool's anonymous
    /// identity on startup.
    pub test_user_credentials: Option<TestUserCredentials>,

    /// Catalogue authentication mechanism (e.g. "db", "ldap", "anon").
    #[serde(default = "default_test_mechanism")]
    pub test_mechanism: String,

    /// Path to the Search API's projection mapping file.
    #[serde(default = "default_mapping_path")]
    pub search_api_mapping_path: String,

    /// Per-request wall-clock deadline, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Pool-borrow timeout, in milliseconds. Smaller than the request deadline.
    #[serde(default = "default_borrow_timeout_ms")]
    pub borrow_timeout_ms: u64,

    /// Session-refresh timeout, in milliseconds.
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,

    /// Remaining-lifetime threshold (seconds) below which a borrowed session
    /// is refreshed out-of-line before being handed back.
    #[serde(default = "default_refresh_threshold_secs")]
    pub session_refresh_threshold_secs: i64,

    /// Interval, in seconds, between background idle-session refresh sweeps.
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            client_cache_size: default_client_cache_size(),
            client_pool_init_size: default_pool_init_size(),
            client_pool_max_size: default_pool_max_size(),
            catalogue_url: default_catalogue_url(),
            catalogue_check_cert: true,
            db_url: None,
            log_level: default_log_level(),
            log_location: default_log_location(),
            host: default_host(),
            port: default_port(),
            extension: String::new(),
            test_user_credentials: None,
            test_mechanism: default_test_mechanism(),
            search_api_mapping_path: default_mapping_path(),
            request_timeout_ms: default_request_timeout_ms(),
            borrow_timeout_ms: default_borrow_timeout_ms(),
            refresh_timeout_ms: default_refresh_timeout_ms(),
            session_refresh_threshold_secs: default_refresh_threshold_secs(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(backend) = std::env::var("GATEWAY_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "relational" => Backend::Relational,
                _ => Backend::Catalogue,
            };
        }
        if let Ok(v) = std::env::var("GATEWAY_CLIENT_CACHE_SIZE") {
            if let Ok(n) = v.parse() {
                config.client_cache_size = n;
            }
        }
        if let Ok(v) = std::env::var("GATEWAY_CLIENT_POOL_INIT_SIZE") {
            if let Ok(n) = v.parse() {
                config.client_pool_init_size = n;
            }
        }
        if let Ok(v) = std::env::var("GATEWAY_CLIENT_POOL_MAX_SIZE") {
            if let Ok(n) = v.parse() {
                config.client_pool_max_size = n;
            }
        }
        if let Ok(v) = std::env::var("GATEWAY_CATALOGUE_URL") {
            config.catalogue_url = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_CATALOGUE_CHECK_CERT") {
            config.catalogue_check_cert = v != "false" && v != "0";
        }
        if let Ok(v) = std::env::var("GATEWAY_DB_URL") {
            config.db_url = Some(v);
        }
        if let Ok(v) = std::env::var("GATEWAY_HOST") {
            config.host = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_PORT") {
            if let Ok(p) = v.parse() {
                config.port = p;
            }
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(p) = v.parse() {
                config.port = p;
            }
        }
        if let Ok(v) = std::env::var("GATEWAY_EXTENSION") {
            config.extension = v;
        }
        if let Ok(v) = std::env::var("GATEWAY_TEST_MECHANISM") {
            config.test_mechanism = v;
        }
        if let (Ok(username), Ok(password)) = (
            std::env::var("GATEWAY_TEST_USERNAME"),
            std::env::var("GATEWAY_TEST_PASSWORD"),
        ) {
            config.test_user_credentials = Some(TestUserCredentials { username, password });
        }
        if let Ok(v) = std::env::var("GATEWAY_SEARCH_API_MAPPING_PATH") {
            config.search_api_mapping_path = v;
        }

        config
    }
}

fn default_backend() -> Backend {
    Backend::Catalogue
}

fn default_client_cache_size() -> usize {
    100
}

fn default_pool_init_size() -> usize {
    2
}

fn default_pool_max_size() -> usize {
    10
}

fn default_catalogue_url() -> String {
    "https://localhost:8181/ICATService/ICAT".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_location() -> String {
    "-".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_test_mechanism() -> String {
    "anon".to_string()
}

fn default_mapping_path() -> String {
    "search_api_mapping.json".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_borrow_timeout_ms() -> u64 {
    5_000
}

fn default_refresh_timeout_ms() -> u64 {
    2_000
}

fn default_refresh_threshold_secs() -> i64 {
    60
}

fn default_maintenance_interval_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
