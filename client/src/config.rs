//! Client configuration.
//!
//! The base URL is composed from two fragments: the API root and an optional
//! sub-path prefix. Values come from the environment in deployed builds and
//! from the `with_*` builders in tests and embedding code.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `LEXIS_API_ROOT` | API root URL | required |
//! | `LEXIS_API_PREFIX` | Sub-path under the root | none |
//! | `LEXIS_REQUEST_TIMEOUT_SECS` | Ordinary request timeout | 10 |
//! | `LEXIS_REFRESH_TIMEOUT_SECS` | Refresh call timeout | 30 |
//! | `LEXIS_REFRESH_PATH` | Refresh endpoint path | `auth/refresh-token` |

use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

/// Environment variable holding the API root.
pub const ENV_API_ROOT: &str = "LEXIS_API_ROOT";
/// Environment variable holding the optional sub-path prefix.
pub const ENV_API_PREFIX: &str = "LEXIS_API_PREFIX";
/// Environment variable holding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "LEXIS_REQUEST_TIMEOUT_SECS";
/// Environment variable holding the refresh timeout in seconds.
pub const ENV_REFRESH_TIMEOUT: &str = "LEXIS_REFRESH_TIMEOUT_SECS";
/// Environment variable holding the refresh endpoint path.
pub const ENV_REFRESH_PATH: &str = "LEXIS_REFRESH_PATH";

/// Default timeout for ordinary requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout for the refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);
/// Default refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh-token";
/// Content type every request accepts.
pub const ACCEPT_JSON: &str = "application/json";

/// Admin API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.example.com`
    pub api_root: String,

    /// Optional sub-path appended to the root, e.g. `admin/v1`
    pub api_prefix: Option<String>,

    /// Transport timeout for ordinary requests.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Transport timeout for the refresh call.
    ///
    /// Default: 30 seconds
    pub refresh_timeout: Duration,

    /// Refresh endpoint path relative to the base URL.
    ///
    /// Default: `auth/refresh-token`
    pub refresh_path: String,
}

impl ClientConfig {
    /// Create a configuration for the given API root with default settings.
    #[must_use]
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            api_prefix: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }

    /// Load configuration from `LEXIS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if `LEXIS_API_ROOT` is not set, or
    /// `ConfigError::InvalidValue` if a timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_root = lookup(ENV_API_ROOT).ok_or(ConfigError::MissingVar(ENV_API_ROOT))?;
        let mut config = Self::new(api_root);

        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            config = config.with_api_prefix(prefix);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config = config.with_request_timeout(parse_secs(ENV_REQUEST_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_REFRESH_TIMEOUT) {
            config = config.with_refresh_timeout(parse_secs(ENV_REFRESH_TIMEOUT, &raw)?);
        }
        if let Some(path) = lookup(ENV_REFRESH_PATH) {
            config = config.with_refresh_path(path);
        }

        Ok(config)
    }

    /// Set the sub-path prefix.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    /// Set the ordinary request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the refresh call timeout.
    #[must_use]
    pub const fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Set the refresh endpoint path.
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Compose the base URL: `<api_root>/<api_prefix>/`.
    ///
    /// Always ends with a slash so relative joins stay under the prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the composed text is not a URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let root = self.api_root.trim().trim_end_matches('/');
        let prefix = self
            .api_prefix
            .as_deref()
            .map(|prefix| prefix.trim().trim_matches('/'))
            .filter(|prefix| !prefix.is_empty());

        let joined = match prefix {
            Some(prefix) => format!("{root}/{prefix}/"),
            None => format!("{root}/"),
        };

        let url = Url::parse(&joined).map_err(|e| ConfigError::InvalidUrl {
            value: joined.clone(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                value: joined,
                reason: "not a base URL".to_string(),
            });
        }

        Ok(url)
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the base URL or the path is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        join_endpoint(&self.base_url()?, path)
    }
}

/// Resolve `path` under `base`, treating a leading slash as relative.
pub(crate) fn join_endpoint(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ConfigError::InvalidUrl {
            value: path.to_string(),
            reason: e.to_string(),
        })
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
        })
}
