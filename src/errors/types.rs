//! Error type definitions for the photo proxy
//!
//! The taxonomy mirrors the failure modes of the orchestrator and the
//! provider adapters. The cache store and rate limiter are pure in-memory
//! components and raise no errors of their own; the limiter reports quota
//! exhaustion through [`ProxyError::RateLimited`] constructed by its caller.

use thiserror::Error;

/// Top-level error type for everything the proxy core can fail with
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Provider name not present in the adapter registry (caller error,
    /// not retryable)
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider exists but is disabled (credentials missing or feature flag
    /// off); a configuration error, not retryable until fixed
    #[error("Provider '{0}' is disabled")]
    ProviderDisabled(String),

    /// Fixed-window quota exhausted for this provider; transient, caller
    /// should back off until the window resets
    #[error("Rate limited: {provider} - retry after {retry_after} seconds")]
    RateLimited { provider: String, retry_after: u64 },

    /// Network or HTTP failure talking to an upstream provider
    #[error("Upstream fetch failed: {provider} - {failure}")]
    UpstreamFetchFailed {
        provider: String,
        failure: UpstreamFailure,
    },

    /// Valid request, but the provider reported zero results; not an outage
    #[error("No results found: {provider} had nothing for '{query}'")]
    NoResultsFound { provider: String, query: String },

    /// Stub provider called directly
    #[error("Provider '{0}' is not implemented")]
    NotImplemented(String),

    /// Required identifying parameter absent from the request (caller
    /// error, not retryable)
    #[error("Missing required parameter '{parameter}' for provider '{provider}'")]
    MissingParameter { provider: String, parameter: String },
}

/// Distinguishes a transport-level failure from a non-2xx upstream response
#[derive(Error, Debug)]
pub enum UpstreamFailure {
    /// Connection, DNS, TLS or timeout failure before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

impl ProxyError {
    /// Create an upstream failure from a transport-level error
    pub fn upstream_transport<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::UpstreamFetchFailed {
            provider: provider.into(),
            failure: UpstreamFailure::Transport(message.into()),
        }
    }

    /// Create an upstream failure from a non-success HTTP status
    pub fn upstream_status<P: Into<String>, M: Into<String>>(
        provider: P,
        status: u16,
        message: M,
    ) -> Self {
        Self::UpstreamFetchFailed {
            provider: provider.into(),
            failure: UpstreamFailure::Status {
                status,
                message: message.into(),
            },
        }
    }

    /// Create a no-results error
    pub fn no_results<P: Into<String>, Q: Into<String>>(provider: P, query: Q) -> Self {
        Self::NoResultsFound {
            provider: provider.into(),
            query: query.into(),
        }
    }

    /// Create a missing-parameter error
    pub fn missing_parameter<P: Into<String>, N: Into<String>>(provider: P, parameter: N) -> Self {
        Self::MissingParameter {
            provider: provider.into(),
            parameter: parameter.into(),
        }
    }

    /// Map a reqwest error into the upstream taxonomy for `provider`
    pub fn from_reqwest(provider: &str, error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            Self::upstream_status(provider, status.as_u16(), error.to_string())
        } else if error.is_timeout() {
            Self::upstream_transport(provider, format!("request timed out: {error}"))
        } else {
            Self::upstream_transport(provider, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_and_transport_are_distinguishable() {
        let status = ProxyError::upstream_status("unsplash", 503, "service unavailable");
        let transport = ProxyError::upstream_transport("unsplash", "connection refused");

        match status {
            ProxyError::UpstreamFetchFailed {
                failure: UpstreamFailure::Status { status, .. },
                ..
            } => assert_eq!(status, 503),
            other => panic!("unexpected error: {other}"),
        }
        match transport {
            ProxyError::UpstreamFetchFailed {
                failure: UpstreamFailure::Transport(_),
                ..
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_messages_name_the_provider() {
        let err = ProxyError::ProviderDisabled("pexels".to_string());
        assert!(err.to_string().contains("pexels"));

        let err = ProxyError::RateLimited {
            provider: "unsplash".to_string(),
            retry_after: 42,
        };
        assert!(err.to_string().contains("42"));
    }
}
