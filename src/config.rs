use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix shared by every environment variable the client reads
pub const ENV_PREFIX: &str = "WATCHDECK_";

/// Client configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Origin of the REST API (e.g. "http://localhost:5000")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Image CDN base; a size segment and the item's path are appended
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Client-side timeout applied to every HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cache entry lifetime; unset means entries live for the whole session
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    /// Where anonymous users are sent when an action needs a session
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Persist the session to this JSON file instead of keeping it in memory
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_login_path() -> String {
    "/login".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            image_base_url: default_image_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: None,
            login_path: default_login_path(),
            session_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_vars(vars(&[("PATH", "/usr/bin")])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_ttl(), None);
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = Config::from_vars(vars(&[
            ("WATCHDECK_API_BASE_URL", "https://media.example.com"),
            ("WATCHDECK_REQUEST_TIMEOUT_SECS", "3"),
            ("WATCHDECK_CACHE_TTL_SECS", "600"),
            ("WATCHDECK_LOGIN_PATH", "/signin"),
            ("WATCHDECK_SESSION_FILE", "/tmp/watchdeck/session.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://media.example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.login_path, "/signin");
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/watchdeck/session.json"))
        );
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Config::from_vars(vars(&[("WATCHDECK_REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }
}
