//! Error types for the HTTP client.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by [`ShopClient`](crate::ShopClient).
///
/// Transient conditions are retried inside the client; a caller only sees
/// `Connection` or `RateLimited` once the retry budget is spent.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection refused/reset, protocol error or timeout, after all retries.
    #[error("connection failed after {attempts} attempts: {message}")]
    Connection {
        /// Number of attempts made.
        attempts: u32,
        /// Last transport error.
        message: String,
    },

    /// The server kept answering 429.
    #[error("rate limited after {attempts} attempts")]
    RateLimited {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Non-2xx response other than 429.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// A 2xx response whose body was expected to be JSON but was not.
    #[error("invalid response body: {0}")]
    Parse(String),

    /// A response was well-formed JSON but lacked an expected field.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid call argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Request could not be built or sent for a non-transient reason.
    #[error("request error: {0}")]
    Request(String),
}

impl ClientError {
    /// Returns true if the condition is transient.
    ///
    /// The client already retries these; callers can use this to decide
    /// whether a later re-run may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connection { .. } | ClientError::RateLimited { .. }
        )
    }

    /// Returns the HTTP status if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Returns true for an HTTP 404 answer.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
