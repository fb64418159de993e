//! Single-item content generation.
//!
//! One run is a strict sequence: choose a quote, fetch background art,
//! render the card, resolve a schedule date, persist a pending item. Any
//! failure before the insert aborts the run and nothing is written (unless
//! failure recording is enabled, in which case a `failed` row is stored for
//! diagnosis).

use crate::calendar::{Clock, assign_next_date};
use crate::imaging::{BackendError, QuoteCardRenderer};
use crate::providers::{ArtSource, CuratedQuotes, ProviderError, SyntheticQuoteSource};
use crate::store::{ItemStore, StoreError};
use crate::types::{ContentItem, ContentSource, ContentStatus, NewContentItem};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Layout failed: {0}")]
    Layout(#[from] BackendError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Quote text chosen for one run, before any art or rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDraft {
    pub text: String,
    pub author: Option<String>,
    pub source: ContentSource,
}

impl QuoteDraft {
    /// Trim and check the draft before anything external is called.
    pub fn validated(self) -> Result<Self, PipelineError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::Validation("quote text is empty".to_string()));
        }
        let author = match self.source {
            ContentSource::Synthetic => None,
            ContentSource::Curated => self
                .author
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        };
        Ok(Self {
            text,
            author,
            source: self.source,
        })
    }
}

/// Everything a pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ItemStore>,
    pub curated: CuratedQuotes,
    pub synthetic: Arc<dyn SyntheticQuoteSource>,
    pub art: Arc<dyn ArtSource>,
    pub renderer: QuoteCardRenderer,
    pub clock: Arc<dyn Clock>,
}

pub struct ContentPipeline {
    parts: Collaborators,
    record_failures: bool,
}

impl ContentPipeline {
    pub fn new(parts: Collaborators) -> Self {
        Self {
            parts,
            record_failures: false,
        }
    }

    /// Persist a `failed` row when a run fails after the quote was chosen.
    pub fn record_failures(mut self, enabled: bool) -> Self {
        self.record_failures = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.parts.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.parts.clock
    }

    pub fn synthetic_available(&self) -> bool {
        self.parts.synthetic.is_available()
    }

    /// Run the whole pipeline with a quote from `source`.
    pub async fn generate(&self, source: ContentSource) -> Result<ContentItem, PipelineError> {
        let draft = self.choose_quote(source).await?;
        self.complete(draft).await
    }

    /// Run the pipeline for a caller-supplied quote. The quote is validated
    /// before any provider is called.
    pub async fn generate_with_quote(&self, draft: QuoteDraft) -> Result<ContentItem, PipelineError> {
        let draft = draft.validated()?;
        self.complete(draft).await
    }

    async fn choose_quote(&self, source: ContentSource) -> Result<QuoteDraft, PipelineError> {
        let draft = match source {
            ContentSource::Synthetic => {
                let quote = self.parts.synthetic.generate().await?;
                debug!(theme = %quote.theme, "using synthetic quote");
                QuoteDraft {
                    text: quote.text,
                    author: None,
                    source,
                }
            }
            ContentSource::Curated => {
                let quote = self.parts.curated.fetch().await;
                debug!(provenance = %quote.provenance, "using curated quote");
                QuoteDraft {
                    text: quote.text,
                    author: quote.author,
                    source,
                }
            }
        };
        draft.validated()
    }

    async fn complete(&self, draft: QuoteDraft) -> Result<ContentItem, PipelineError> {
        match self.build(&draft).await {
            Ok(new_item) => {
                let item = self.parts.store.insert(new_item).await?;
                info!(
                    item_id = %item.id,
                    source = %item.source,
                    scheduled = ?item.scheduled_date,
                    "generated content item"
                );
                Ok(item)
            }
            Err(error) => {
                if self.record_failures && !matches!(error, PipelineError::Store(_)) {
                    self.record_failure(&draft, &error).await;
                }
                Err(error)
            }
        }
    }

    /// Art, render and date resolution. Nothing is written here.
    async fn build(&self, draft: &QuoteDraft) -> Result<NewContentItem, PipelineError> {
        let artwork = self.parts.art.generate(None).await?;
        let image = self
            .parts
            .renderer
            .render_blocking(artwork.bytes, draft.text.clone(), draft.author.clone())
            .await?;
        let date = assign_next_date(self.parts.store.as_ref(), self.parts.clock.as_ref()).await?;

        let mut item = NewContentItem::pending(
            draft.text.clone(),
            draft.author.clone(),
            draft.source,
            self.parts.clock.now(),
        );
        item.image_payload = image;
        item.scheduled_date = Some(date);
        item.prompt_used = Some(artwork.prompt);
        Ok(item)
    }

    async fn record_failure(&self, draft: &QuoteDraft, error: &PipelineError) {
        let mut failed = NewContentItem::pending(
            draft.text.clone(),
            draft.author.clone(),
            draft.source,
            self.parts.clock.now(),
        );
        failed.status = ContentStatus::Failed;
        failed.error_message = Some(error.to_string());
        match self.parts.store.insert(failed).await {
            Ok(item) => debug!(item_id = %item.id, "recorded failed run"),
            Err(store_error) => warn!(%store_error, "could not record failed run"),
        }
    }
}
