/*!
 * Error types for the narrator application.
 *
 * This module contains custom error types for the speech providers and the
 * article pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling a speech synthesis provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when sending the request fails before a response arrives
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Seconds to wait, when the service says so
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider answered successfully but produced no audio
    #[error("Provider returned empty audio")]
    EmptyAudio,
}

impl ProviderError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) => true,
            Self::RateLimitExceeded { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationError(_) | Self::EmptyAudio => false,
        }
    }
}

/// Reasons a variant is skipped without calling the provider
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Output audio already present
    #[error("exists")]
    AlreadySatisfied,

    /// Source document absent
    #[error("no source")]
    MissingInput,

    /// Extracted narration below the minimum viable length
    #[error("too short")]
    DegenerateContent,
}
