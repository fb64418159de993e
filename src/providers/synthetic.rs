//! Generated quotes from the Anthropic Messages API.

use super::{ProviderError, SyntheticQuote, SyntheticQuoteSource, status_error};
use crate::config::SyntheticConfig;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

pub const THEMES: &[&str] = &[
    "mindfulness and being present in the moment",
    "gratitude and appreciation for life",
    "resilience and overcoming challenges",
    "growth mindset and continuous improvement",
    "inner peace and tranquility",
    "self-love and acceptance",
    "courage and taking action",
    "hope and optimism for the future",
    "wisdom and learning from experience",
    "kindness and compassion for others",
];

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Debug, Serialize)]
struct MessageParam {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

fn quote_prompt(theme: &str, max_chars: usize) -> String {
    format!(
        "Generate a single original inspirational quote about {theme}.

Requirements:
- Must be under {max_chars} characters
- Should be profound yet accessible
- Do not attribute it to anyone (it's original)
- Do not use quotation marks
- Just return the quote text, nothing else
- Make it suitable for an Instagram inspirational post

Example style:
\"Every sunrise is an invitation to brighten someone's day\"
\"The path to peace begins with a single mindful breath\"

Now generate one original quote:"
    )
}

/// Strip wrapping quotation marks, trim, and cap the length at `max_chars`
/// (truncating to `max_chars - 3` plus an ellipsis).
pub fn clean_generated_quote(raw: &str, max_chars: usize) -> String {
    const MARKS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(MARKS).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(MARKS).unwrap_or(trimmed);
    let quote = trimmed.trim();

    if quote.chars().count() > max_chars {
        let cut: String = quote.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        quote.to_string()
    }
}

fn first_text(response: MessagesResponse) -> Option<String> {
    response.content.into_iter().find_map(|block| match block {
        ContentBlock::Text { text } => Some(text),
        ContentBlock::Other => None,
    })
}

pub struct AnthropicQuotes {
    client: reqwest::Client,
    api_key: Option<String>,
    config: SyntheticConfig,
}

impl AnthropicQuotes {
    pub fn new(client: reqwest::Client, api_key: Option<String>, config: SyntheticConfig) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            config,
        }
    }

    /// Reads the key from `ANTHROPIC_API_KEY`.
    pub fn from_env(client: reqwest::Client, config: SyntheticConfig) -> Self {
        Self::new(client, std::env::var("ANTHROPIC_API_KEY").ok(), config)
    }
}

#[async_trait]
impl SyntheticQuoteSource for AnthropicQuotes {
    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self) -> Result<SyntheticQuote, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("ANTHROPIC_API_KEY".to_string()))?;

        let theme = THEMES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(THEMES[0])
            .to_string();

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![MessageParam {
                role: "user",
                content: quote_prompt(&theme, self.config.max_chars),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.api_url.trim_end_matches('/')))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;
        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response).await);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;
        let raw = first_text(parsed)
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no text block in response"))?;
        let text = clean_generated_quote(&raw, self.config.max_chars);
        if text.is_empty() {
            return Err(ProviderError::malformed(PROVIDER, "empty quote text"));
        }

        info!(%theme, chars = text.chars().count(), "generated synthetic quote");
        Ok(SyntheticQuote { text, theme })
    }
}
