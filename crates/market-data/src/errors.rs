//! Error types for the market data crate.

use thiserror::Error;

/// Errors surfaced by upstream fund data providers.
///
/// These never cross the domain service boundary raw: services degrade to
/// cached or empty-default data and log instead.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Transport-level failure talking to the provider.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The request exceeded its per-call timeout.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// The provider answered with something that could not be parsed.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },
}

impl MarketDataError {
    pub(crate) fn provider(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}
