use std::time::Duration;

use url::Url;

use crate::error::{Result, YtteError};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Environment variable the CLI reads the base URL from
pub const API_URL_ENV: &str = "YTTE_API_URL";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_USER_AGENT: &str = const_str::concat!("ytte/", env!("CARGO_PKG_VERSION"));

/// Where the metadata/download service lives and how to talk to it
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Default config pointed at another service
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of an endpoint such as `info` or `download`
    pub fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| YtteError::InvalidUrl(format!("{}: {}", name, e)))
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    // join() replaces the last segment unless the path ends with '/'
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&normalized)
        .map_err(|e| YtteError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(YtteError::InvalidUrl(format!(
            "unsupported scheme {} in {}",
            scheme, base_url
        ))),
    }
}
