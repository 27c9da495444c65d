use std::net::SocketAddr;
use std::path::PathBuf;

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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub youtube_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub videoai_api_key: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub download_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub client_request_timeout_secs: u64,
    pub client_max_retries: u32,
    pub client_retry_backoff_base_secs: u64,
    pub search_channels_per_keyword: u32,
    pub search_recent_video_cap: u32,
    pub search_max_concurrent_candidates: usize,
    pub search_cache_ttl_hours: i64,
    pub videoai_poll_interval_secs: u64,
    pub videoai_poll_max_attempts: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("jwt_secret", &"[redacted]")
            .field("token_ttl_days", &self.token_ttl_days)
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "videoai_api_key",
                &self.videoai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "email_api_key",
                &self.email_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("email_from", &self.email_from)
            .field("download_dir", &self.download_dir)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "client_request_timeout_secs",
                &self.client_request_timeout_secs,
            )
            .field("client_max_retries", &self.client_max_retries)
            .field(
                "client_retry_backoff_base_secs",
                &self.client_retry_backoff_base_secs,
            )
            .field(
                "search_channels_per_keyword",
                &self.search_channels_per_keyword,
            )
            .field("search_recent_video_cap", &self.search_recent_video_cap)
            .field(
                "search_max_concurrent_candidates",
                &self.search_max_concurrent_candidates,
            )
            .field("search_cache_ttl_hours", &self.search_cache_ttl_hours)
            .field(
                "videoai_poll_interval_secs",
                &self.videoai_poll_interval_secs,
            )
            .field("videoai_poll_max_attempts", &self.videoai_poll_max_attempts)
            .finish()
    }
}
