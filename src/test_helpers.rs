//! Shared test utilities.
//!
//! Fixed clock values, item fixtures, fake providers and a pipeline harness
//! wired to in-memory collaborators.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let harness = PipelineHarness::new();
//! let item = harness.pipeline().generate(ContentSource::Curated).await.unwrap();
//! assert_eq!(item.scheduled_date, Some(date(2026, 3, 1)));
//! ```

use crate::calendar::FixedClock;
use crate::imaging::backend::tests::MockBackend;
use crate::imaging::{LayoutParams, QuoteCardRenderer};
use crate::pipeline::{Collaborators, ContentPipeline};
use crate::providers::{
    ArtSource, Artwork, CuratedQuotes, ProviderError, Quote, QuoteProvider, SyntheticQuote,
    SyntheticQuoteSource,
};
use crate::store::MemoryStore;
use crate::types::{ContentItem, ContentSource, ContentStatus, NewContentItem};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

// =========================================================================
// Time and item fixtures
// =========================================================================

/// The instant every test treats as "now": 2026-03-01 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A curated item created `age_days` before [`now`].
pub fn item_with(status: ContentStatus, scheduled: Option<NaiveDate>, age_days: i64) -> ContentItem {
    let mut new = NewContentItem::pending(
        "Fixture quote.".to_string(),
        Some("Fixture".to_string()),
        ContentSource::Curated,
        now() - Duration::days(age_days),
    );
    new.status = status;
    new.scheduled_date = scheduled;
    new.into_item(Uuid::new_v4())
}

/// PNG of the given size filled with rgb(60, 100, 140).
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([60, 100, 140]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

// =========================================================================
// Fake providers
// =========================================================================

pub struct FixedQuotes(Quote);

impl FixedQuotes {
    pub fn new(text: &str, author: Option<&str>) -> Self {
        Self(Quote {
            text: text.to_string(),
            author: author.map(str::to_string),
            provenance: "fixed".to_string(),
        })
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self) -> Result<Quote, ProviderError> {
        Ok(self.0.clone())
    }
}

pub struct FailingQuotes;

#[async_trait]
impl QuoteProvider for FailingQuotes {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self) -> Result<Quote, ProviderError> {
        Err(ProviderError::request("failing", "connection refused"))
    }
}

/// Synthetic source with a switchable key and optional failure.
#[derive(Default)]
pub struct FakeSynthetic {
    pub unavailable: bool,
    pub failing: bool,
    pub calls: AtomicUsize,
}

impl FakeSynthetic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyntheticQuoteSource for FakeSynthetic {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn generate(&self) -> Result<SyntheticQuote, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ProviderError::NotConfigured("ANTHROPIC_API_KEY".to_string()));
        }
        if self.failing {
            return Err(ProviderError::request("fake synthetic", "rate limited"));
        }
        Ok(SyntheticQuote {
            text: "A generated thought.".to_string(),
            theme: "testing".to_string(),
        })
    }
}

/// Art source that succeeds except on the listed (1-based) calls.
#[derive(Default)]
pub struct FakeArt {
    pub fail_on: HashSet<usize>,
    pub calls: AtomicUsize,
}

impl FakeArt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtSource for FakeArt {
    async fn generate(&self, _prompt_hint: Option<&str>) -> Result<Artwork, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(ProviderError::request("fake art", "art unavailable"));
        }
        Ok(Artwork {
            bytes: vec![0x89, b'P', b'N', b'G'],
            prompt: "fake art prompt".to_string(),
        })
    }
}

pub struct FailingArt;

#[async_trait]
impl ArtSource for FailingArt {
    async fn generate(&self, _prompt_hint: Option<&str>) -> Result<Artwork, ProviderError> {
        Err(ProviderError::request("fake art", "art unavailable"))
    }
}

// =========================================================================
// Pipeline harness
// =========================================================================

/// In-memory collaborators for a [`ContentPipeline`]. Swap any field before
/// calling [`pipeline`](Self::pipeline).
pub struct PipelineHarness {
    pub store: Arc<MemoryStore>,
    pub curated: CuratedQuotes,
    pub synthetic: Arc<dyn SyntheticQuoteSource>,
    pub art: Arc<dyn ArtSource>,
    pub backend: Arc<MockBackend>,
    pub clock: FixedClock,
}

impl PipelineHarness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            curated: CuratedQuotes::new(vec![Arc::new(FixedQuotes::new(
                "Fixed curated quote.",
                Some("Tester"),
            ))]),
            synthetic: Arc::new(FakeSynthetic::new()),
            art: Arc::new(FakeArt::new()),
            backend: Arc::new(MockBackend::new()),
            clock: FixedClock::at(now()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.store.clone(),
            curated: self.curated.clone(),
            synthetic: self.synthetic.clone(),
            art: self.art.clone(),
            renderer: QuoteCardRenderer::new(self.backend.clone(), LayoutParams::default()),
            clock: Arc::new(self.clock),
        }
    }

    pub fn pipeline(&self) -> ContentPipeline {
        ContentPipeline::new(self.collaborators())
    }
}
