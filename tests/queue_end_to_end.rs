//! End-to-end run of the public API with real rendering.
//!
//! Quotes come from in-process fakes and backgrounds from `FlatArt`, so no
//! network is touched. Everything else is the production path: the
//! `RustBackend` composites real JPEGs and items land in a `JsonFileStore`.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use quotecard::calendar::FixedClock;
use quotecard::config::QueueConfig;
use quotecard::imaging::{LayoutParams, QuoteCardRenderer, RustBackend};
use quotecard::pacing::NoDelay;
use quotecard::pipeline::{Collaborators, ContentPipeline};
use quotecard::providers::{
    CuratedQuotes, FlatArt, ProviderError, Quote, QuoteProvider, SyntheticQuote,
    SyntheticQuoteSource,
};
use quotecard::queue::QueueScheduler;
use quotecard::review::{ReviewError, Reviewer};
use quotecard::store::{ItemStore, JsonFileStore};
use quotecard::types::{ContentSource, ContentStatus, ItemFilter};
use std::sync::Arc;

struct StaticQuote;

#[async_trait]
impl QuoteProvider for StaticQuote {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Quote, ProviderError> {
        Ok(Quote {
            text: "Well begun is half done.".to_string(),
            author: Some("Aristotle".to_string()),
            provenance: "static".to_string(),
        })
    }
}

struct StaticSynthetic;

#[async_trait]
impl SyntheticQuoteSource for StaticSynthetic {
    fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self) -> Result<SyntheticQuote, ProviderError> {
        Ok(SyntheticQuote {
            text: "Small steps still move you forward.".to_string(),
            theme: "persistence".to_string(),
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn pipeline(store: Arc<JsonFileStore>) -> Arc<ContentPipeline> {
    let params = LayoutParams::default();
    Arc::new(ContentPipeline::new(Collaborators {
        store,
        curated: CuratedQuotes::new(vec![Arc::new(StaticQuote)]),
        synthetic: Arc::new(StaticSynthetic),
        art: Arc::new(FlatArt::new(params.width, params.height)),
        renderer: QuoteCardRenderer::new(Arc::new(RustBackend::new().unwrap()), params),
        clock: Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )),
    }))
}

#[tokio::test]
async fn fill_review_and_reload() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("store.json");
    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let pipeline = pipeline(store.clone());
    let queue = QueueScheduler::new(
        pipeline.clone(),
        Arc::new(NoDelay),
        QueueConfig {
            target_size: 3,
            synthetic_ratio: 0.4,
            ..QueueConfig::default()
        },
    );

    // round(3 × 0.4) = 1 synthetic item, produced first
    let report = queue.fill().await.unwrap();
    assert_eq!(report.generated, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(report.synthetic, 1);

    let items = store.list(&ItemFilter::any()).await.unwrap();
    let dates: Vec<_> = items.iter().map(|i| i.scheduled_date).collect();
    assert_eq!(
        dates,
        vec![
            Some(date(2026, 3, 1)),
            Some(date(2026, 3, 2)),
            Some(date(2026, 3, 3))
        ]
    );
    assert_eq!(items[0].source, ContentSource::Synthetic);
    assert_eq!(items[0].author, None);
    assert_eq!(items[1].author.as_deref(), Some("Aristotle"));

    for item in &items {
        assert_eq!(item.status, ContentStatus::Pending);
        assert_eq!(&item.image_payload[..2], &[0xFF, 0xD8]);
        let card = image::load_from_memory(&item.image_payload).unwrap();
        assert_eq!((card.width(), card.height()), (1080, 1350));
        // White quote text over the darkened flat background
        let text_pixels = card
            .to_rgb8()
            .pixels()
            .filter(|px| px.0.iter().all(|&c| c > 200))
            .count();
        assert!(text_pixels > 500, "card {} has no visible text", item.id);
    }

    // Queue is full now
    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.needs_generation, 0);
    assert_eq!(queue.fill().await.unwrap().attempted, 0);

    // Review: approve the first, reject and regenerate the second
    let reviewer = Reviewer::new(pipeline);
    reviewer.approve(items[0].id).await.unwrap();
    reviewer.reject(items[1].id).await.unwrap();
    let replacement = reviewer.regenerate(items[1].id).await.unwrap();
    assert_eq!(replacement.source, ContentSource::Curated);
    assert_eq!(replacement.scheduled_date, Some(date(2026, 3, 4)));
    assert!(matches!(
        reviewer.get(items[1].id).await,
        Err(ReviewError::NotFound(_))
    ));

    // Everything survives a reopen of the file
    let reopened = JsonFileStore::open(&path).await.unwrap();
    let stored = reopened.list(&ItemFilter::any()).await.unwrap();
    assert_eq!(stored.len(), 3);
    let approved = stored.iter().find(|i| i.id == items[0].id).unwrap();
    assert_eq!(approved.status, ContentStatus::Approved);
    assert_eq!(approved.image_payload, items[0].image_payload);
}
