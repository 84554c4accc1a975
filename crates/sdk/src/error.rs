//! SDK-specific error types.
//!
//! Only genuinely exceptional outcomes are errors: invalid session state,
//! unrenderable queries, schema validation failures, configuration problems,
//! and hard transport faults on the write path. Routine misses (no matching
//! entry, a stale document version, a read that failed in flight) are soft
//! and surface as `None` or an empty list instead.

use snafu::{Location, Snafu};

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types with context-rich error messages.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SdkError {
    /// An operation was invoked on a session or record that cannot serve it.
    #[snafu(display("Invalid state at {location}: {message}"))]
    InvalidState {
        /// What precondition was violated.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// The query builder could not render a valid query.
    #[snafu(display("Invalid query: {reason}"))]
    InvalidQuery {
        /// Why rendering failed.
        reason: String,
    },

    /// A document failed schema validation.
    #[snafu(display("Validation failed for field `{field}`: {reason}"))]
    Validation {
        /// The offending field.
        field: String,
        /// Required-field or type-mismatch description.
        reason: String,
    },

    /// Configuration validation error.
    #[snafu(display("Configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },

    /// URL parsing error.
    #[snafu(display("Invalid URL '{url}': {message}"))]
    InvalidUrl {
        /// The invalid URL.
        url: String,
        /// Parse error description.
        message: String,
    },

    /// The gateway answered with a non-success HTTP status.
    #[snafu(display("Gateway error (status={status}): {message}"))]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Transport-level error (connect, TLS, timeout, body read).
    #[snafu(display("Transport error at {location}: {source}"))]
    Transport {
        /// Underlying HTTP client error.
        source: reqwest::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A response or payload could not be decoded.
    #[snafu(display("Failed to decode {what}: {source}"))]
    Decode {
        /// What was being decoded.
        what: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl SdkError {
    /// Returns true if the error is transient and an idempotent request may
    /// be retried.
    ///
    /// Retryable: transport faults (connection refused, timeouts, interrupted
    /// bodies) and gateway statuses 429/5xx. Everything else reflects a
    /// caller-side or permanent problem.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Gateway { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidState { .. }
            | Self::InvalidQuery { .. }
            | Self::Validation { .. }
            | Self::Config { .. }
            | Self::InvalidUrl { .. }
            | Self::Decode { .. } => false,
        }
    }

    /// Returns the HTTP status if this is a gateway error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error came from the wire rather than the caller.
    ///
    /// Search operations collapse these to an empty result instead of
    /// propagating them; the builder-side kinds always surface.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Gateway { .. } | Self::Decode { .. })
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(source: reqwest::Error) -> Self {
        Self::Transport { source, location: Location::default() }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_gateway_5xx_is_retryable() {
        let err = SdkError::Gateway { status: 503, message: "unavailable".to_owned() };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_gateway_429_is_retryable() {
        let err = SdkError::Gateway { status: 429, message: "rate limited".to_owned() };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_gateway_4xx_not_retryable() {
        let err = SdkError::Gateway { status: 400, message: "bad request".to_owned() };
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_validation_not_retryable() {
        let err = SdkError::Validation {
            field: "age".to_owned(),
            reason: "expected a number".to_owned(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_config_not_retryable() {
        let err = SdkError::Config { message: "invalid config".to_owned() };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_query_not_retryable() {
        let err = SdkError::InvalidQuery { reason: "empty id".to_owned() };
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_decode_not_retryable() {
        let source = serde_json::from_str::<u64>("not json").unwrap_err();
        let err = SdkError::Decode { what: "response envelope".to_owned(), source };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("response envelope"));
    }
}
