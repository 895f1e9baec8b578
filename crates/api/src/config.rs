use std::env;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub backend_url: String,
    pub fetch_timeout: Duration,
    pub bind: String,
    pub default_top_k: usize,
    pub chat_top_k: usize,
    pub max_top_k: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            default_top_k: 5,
            chat_top_k: 3,
            max_top_k: 50,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads `DENTAL_*` settings through `lookup`; unset or unparsable
    /// values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let parsed = |key: &str| non_empty(key).and_then(|value| value.parse::<usize>().ok());

        let backend_url = non_empty("DENTAL_BACKEND_URL")
            .or_else(|| non_empty("BACKEND_URL"))
            .unwrap_or(defaults.backend_url);
        let fetch_timeout = non_empty("DENTAL_FETCH_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);
        let bind = non_empty("DENTAL_BIND").unwrap_or_else(|| {
            let port = non_empty("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            format!("0.0.0.0:{port}")
        });

        let max_top_k = parsed("DENTAL_MAX_TOP_K")
            .filter(|value| *value > 0)
            .unwrap_or(defaults.max_top_k);

        Self {
            backend_url,
            fetch_timeout,
            bind,
            default_top_k: parsed("DENTAL_DEFAULT_TOP_K")
                .unwrap_or(defaults.default_top_k)
                .min(max_top_k),
            chat_top_k: parsed("DENTAL_CHAT_TOP_K")
                .unwrap_or(defaults.chat_top_k)
                .min(max_top_k),
            max_top_k,
        }
    }

    pub fn recommend_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_top_k).min(self.max_top_k)
    }

    pub fn chat_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.chat_top_k).min(self.max_top_k)
    }
}
