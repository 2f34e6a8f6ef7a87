//! Error types for the admin API client

use lexis_admin_core::RequestError;
use thiserror::Error;

/// Errors raised while configuring or constructing the client
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is not set
    #[error("Missing {0} environment variable")]
    MissingVar(&'static str),

    /// Environment variable or builder value could not be parsed
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Base URL or endpoint could not be composed
    #[error("Invalid URL {value:?}: {reason}")]
    InvalidUrl {
        /// The offending URL text
        value: String,
        /// Parser message
        reason: String,
    },

    /// The underlying HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    HttpClient(String),
}

/// Map a transport-level `reqwest` failure onto the request taxonomy.
pub(crate) fn transport_error(err: &reqwest::Error) -> RequestError {
    if err.is_timeout() {
        RequestError::Timeout
    } else if err.is_decode() {
        RequestError::Decode(err.to_string())
    } else if err.is_builder() {
        RequestError::InvalidRequest(err.to_string())
    } else {
        RequestError::Network(err.to_string())
    }
}
