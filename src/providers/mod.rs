//! External content providers: quote text and background art.
//!
//! Every provider returns strongly typed values. Raw JSON from the network is
//! deserialized into private response structs and validated at the boundary;
//! anything missing or empty becomes [`ProviderError::Malformed`] before it
//! can reach the pipeline.
//!
//! | Role | Trait | Implementations |
//! |---|---|---|
//! | Curated quote | [`QuoteProvider`] | [`ZenQuotes`], [`Quotable`], chained by [`CuratedQuotes`] |
//! | Synthetic quote | [`SyntheticQuoteSource`] | [`AnthropicQuotes`] |
//! | Background art | [`ArtSource`] | [`ImagenArt`], [`FlatArt`] |

pub mod art;
pub mod curated;
pub mod synthetic;

pub use art::{FlatArt, ImagenArt};
pub use curated::{CuratedQuotes, Quotable, ZenQuotes};
pub use synthetic::AnthropicQuotes;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("{provider} returned malformed data: {message}")]
    Malformed { provider: String, message: String },
}

impl ProviderError {
    pub(crate) fn request(provider: &str, err: impl std::fmt::Display) -> Self {
        ProviderError::Request {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        ProviderError::Malformed {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// A curated quote and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
    pub author: Option<String>,
    /// Provider name, or `"fallback"` for the built-in default.
    pub provenance: String,
}

/// A generated, unattributed quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticQuote {
    pub text: String,
    pub theme: String,
}

/// Raw background image plus the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub bytes: Vec<u8>,
    pub prompt: String,
}

/// One link in the curated quote chain.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Quote, ProviderError>;
}

#[async_trait]
pub trait SyntheticQuoteSource: Send + Sync {
    /// Whether the source can be called at all (e.g. an API key is present).
    fn is_available(&self) -> bool;

    async fn generate(&self) -> Result<SyntheticQuote, ProviderError>;
}

#[async_trait]
pub trait ArtSource: Send + Sync {
    /// Produce a background image. With no hint the source picks a style itself.
    async fn generate(&self, prompt_hint: Option<&str>) -> Result<Artwork, ProviderError>;
}

/// Shared HTTP client for all providers. Request timeouts live here, not in
/// the scheduler.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("quotecard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::request("http client", e))
}

/// Read a non-success response into a [`ProviderError::Status`].
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Status {
        provider: provider.to_string(),
        status,
        body,
    }
}
