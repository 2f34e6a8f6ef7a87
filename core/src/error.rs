//! Error taxonomy for admin API requests.

use thiserror::Error;

/// Result type alias for admin API requests.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Failure of a single admin API request.
///
/// `Clone` so that one refresh failure can be delivered to every request
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Envelope message, or the raw body when there is none
        message: String,
    },

    /// Connection-level failure (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The transport timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// A 2xx response body could not be decoded.
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    /// HTTP 401.
    pub const UNAUTHORIZED: u16 = 401;

    /// Build an HTTP status error.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Status code, for HTTP errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is an authorization failure (HTTP 401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: Self::UNAUTHORIZED,
                ..
            }
        )
    }
}
