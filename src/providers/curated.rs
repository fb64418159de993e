//! Curated quotes from public quote APIs, with a fallback chain.
//!
//! [`CuratedQuotes`] tries each provider in order and never fails: when the
//! whole chain is down it returns a built-in default quote.

use super::{ProviderError, Quote, QuoteProvider, status_error};
use crate::config::CuratedConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_QUOTE: &str = "The only way to do great work is to love what you do.";
const DEFAULT_AUTHOR: &str = "Steve Jobs";

/// Build a [`Quote`] from raw provider fields, rejecting empty text.
fn validated(provider: &str, text: &str, author: Option<&str>) -> Result<Quote, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::malformed(provider, "empty quote text"));
    }
    let author = author
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    Ok(Quote {
        text: text.to_string(),
        author,
        provenance: provider.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ZenQuotesEntry {
    q: Option<String>,
    a: Option<String>,
}

fn zenquotes_quote(entries: Vec<ZenQuotesEntry>) -> Result<Quote, ProviderError> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed(ZenQuotes::NAME, "empty response array"))?;
    validated(
        ZenQuotes::NAME,
        entry.q.as_deref().unwrap_or_default(),
        entry.a.as_deref(),
    )
}

/// `GET https://zenquotes.io/api/random` → `[{"q": "...", "a": "..."}]`
pub struct ZenQuotes {
    client: reqwest::Client,
    url: String,
}

impl ZenQuotes {
    pub const NAME: &'static str = "zenquotes";

    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteProvider for ZenQuotes {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self) -> Result<Quote, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProviderError::request(Self::NAME, e))?;
        if !response.status().is_success() {
            return Err(status_error(Self::NAME, response).await);
        }
        let entries: Vec<ZenQuotesEntry> = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(Self::NAME, e.to_string()))?;
        zenquotes_quote(entries)
    }
}

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    content: Option<String>,
    author: Option<String>,
}

fn quotable_quote(response: QuotableResponse) -> Result<Quote, ProviderError> {
    validated(
        Quotable::NAME,
        response.content.as_deref().unwrap_or_default(),
        response.author.as_deref(),
    )
}

/// `GET https://api.quotable.io/random?tags=…` → `{"content": "...", "author": "..."}`
pub struct Quotable {
    client: reqwest::Client,
    url: String,
}

impl Quotable {
    pub const NAME: &'static str = "quotable";

    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteProvider for Quotable {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self) -> Result<Quote, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProviderError::request(Self::NAME, e))?;
        if !response.status().is_success() {
            return Err(status_error(Self::NAME, response).await);
        }
        let body: QuotableResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(Self::NAME, e.to_string()))?;
        quotable_quote(body)
    }
}

/// Ordered provider chain ending in a hardcoded default quote.
#[derive(Clone)]
pub struct CuratedQuotes {
    providers: Vec<Arc<dyn QuoteProvider>>,
    fallback: Quote,
}

impl CuratedQuotes {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self {
            providers,
            fallback: Quote {
                text: DEFAULT_QUOTE.to_string(),
                author: Some(DEFAULT_AUTHOR.to_string()),
                provenance: "fallback".to_string(),
            },
        }
    }

    /// ZenQuotes first, then Quotable.
    pub fn from_config(client: reqwest::Client, config: &CuratedConfig) -> Self {
        Self::new(vec![
            Arc::new(ZenQuotes::new(client.clone(), &config.zenquotes_url)),
            Arc::new(Quotable::new(client, &config.quotable_url)),
        ])
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First successful provider wins; failures are logged and skipped.
    pub async fn fetch(&self) -> Quote {
        for provider in &self.providers {
            match provider.fetch().await {
                Ok(quote) => {
                    debug!(provider = provider.name(), "fetched curated quote");
                    return quote;
                }
                Err(error) => {
                    warn!(provider = provider.name(), %error, "quote provider failed, trying next");
                }
            }
        }
        warn!("all quote providers failed, using default quote");
        self.fallback.clone()
    }
}
