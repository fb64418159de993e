//! Queue scheduler: keeps the backlog at its target size.
//!
//! ## Fill
//!
//! ```text
//! needs = max(0, target − |pending ∪ approved|)
//! for i in 1..=needs:
//!     source = synthetic while produced_synthetic < round(needs × ratio)
//!              and the synthetic source is available, else curated
//!     pipeline.generate(source)      // failures counted, never abort
//!     pause (except after the last item)
//! ```
//!
//! Runs are strictly sequential. Two concurrent fills can both see the same
//! deficit and over-produce; nothing here coordinates across processes.

use crate::calendar::{Clock, assign_next_date};
use crate::config::QueueConfig;
use crate::pacing::{PaceState, Pacing};
use crate::pipeline::{ContentPipeline, PipelineError};
use crate::store::{ItemStore, StoreError};
use crate::types::{ContentItem, ContentSource, ContentStatus, DateRange, ItemFilter};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Backlog counts against the target. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub target_size: usize,
    pub needs_generation: usize,
}

/// Outcome of one fill batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub attempted: usize,
    pub generated: usize,
    pub errors: usize,
    pub synthetic: usize,
}

/// Deterministic source choice for a batch.
///
/// Synthetic items are front-loaded: every item uses the synthetic source
/// until the target count has been produced, then the rest are curated. The
/// counter only moves on success, so a failed synthetic run is retried by
/// the next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMix {
    pub target_synthetic: usize,
    pub produced_synthetic: usize,
    pub synthetic_available: bool,
}

impl SourceMix {
    pub fn new(needs: usize, ratio: f64, synthetic_available: bool) -> Self {
        Self {
            target_synthetic: (needs as f64 * ratio).round() as usize,
            produced_synthetic: 0,
            synthetic_available,
        }
    }

    pub fn next_source(&self) -> ContentSource {
        if self.synthetic_available && self.produced_synthetic < self.target_synthetic {
            ContentSource::Synthetic
        } else {
            ContentSource::Curated
        }
    }

    pub fn record_success(&mut self, source: ContentSource) {
        if source == ContentSource::Synthetic {
            self.produced_synthetic += 1;
        }
    }
}

pub struct QueueScheduler {
    pipeline: Arc<ContentPipeline>,
    pacing: Arc<dyn Pacing>,
    settings: QueueConfig,
}

impl QueueScheduler {
    pub fn new(pipeline: Arc<ContentPipeline>, pacing: Arc<dyn Pacing>, settings: QueueConfig) -> Self {
        Self {
            pipeline,
            pacing,
            settings,
        }
    }

    fn store(&self) -> &dyn ItemStore {
        self.pipeline.store().as_ref()
    }

    fn clock(&self) -> &dyn Clock {
        self.pipeline.clock().as_ref()
    }

    pub fn settings(&self) -> &QueueConfig {
        &self.settings
    }

    pub fn pipeline(&self) -> &Arc<ContentPipeline> {
        &self.pipeline
    }

    /// Count the backlog. Read-only.
    pub async fn stats(&self) -> Result<QueueStats, StoreError> {
        let backlog = self.store().list(&ItemFilter::backlog()).await?;
        let pending = backlog
            .iter()
            .filter(|item| item.status == ContentStatus::Pending)
            .count();
        let approved = backlog.len() - pending;
        Ok(QueueStats {
            total: backlog.len(),
            pending,
            approved,
            target_size: self.settings.target_size,
            needs_generation: self.settings.target_size.saturating_sub(backlog.len()),
        })
    }

    /// Generate exactly `needs_generation` items, one at a time.
    ///
    /// Per-item failures are logged and counted; only failing to read the
    /// stats up front is an error.
    pub async fn fill(&self) -> Result<FillReport, QueueError> {
        let stats = self.stats().await?;
        let needs = stats.needs_generation;
        if needs == 0 {
            info!(total = stats.total, "queue is full, nothing to generate");
            return Ok(FillReport::default());
        }

        let mut mix = SourceMix::new(
            needs,
            self.settings.synthetic_ratio,
            self.pipeline.synthetic_available(),
        );
        info!(
            needs,
            target_synthetic = mix.target_synthetic,
            synthetic_available = mix.synthetic_available,
            "filling queue"
        );

        let mut report = FillReport::default();
        let mut pace = PaceState::default();
        for attempt in 1..=needs {
            let source = mix.next_source();
            report.attempted += 1;
            match self.pipeline.generate(source).await {
                Ok(item) => {
                    mix.record_success(source);
                    report.generated += 1;
                    if source == ContentSource::Synthetic {
                        report.synthetic += 1;
                    }
                    pace.consecutive_failures = 0;
                    debug!(attempt, item_id = %item.id, %source, "queue item generated");
                }
                Err(error) => {
                    report.errors += 1;
                    pace.consecutive_failures += 1;
                    warn!(attempt, of = needs, %source, %error, "queue item failed");
                }
            }
            if attempt < needs {
                self.pacing.pause(pace).await;
            }
        }

        info!(
            generated = report.generated,
            errors = report.errors,
            synthetic = report.synthetic,
            "queue fill finished"
        );
        Ok(report)
    }

    /// Next free publishing date given the current backlog.
    pub async fn assign_next_date(&self) -> Result<NaiveDate, StoreError> {
        assign_next_date(self.store(), self.clock()).await
    }

    /// Delete rejected and published items created more than
    /// `retention_days` ago. Store failures abort the call.
    pub async fn cleanup(&self, retention_days: u32) -> Result<usize, StoreError> {
        let cutoff = self.clock().now() - chrono::Duration::days(i64::from(retention_days));
        let filter = ItemFilter::with_statuses(&ContentStatus::RETAINED).created_before(cutoff);
        let deleted = self.store().delete_matching(&filter).await?;
        info!(deleted, retention_days, %cutoff, "cleanup finished");
        Ok(deleted)
    }

    /// Generate one item on demand, outside the backlog arithmetic.
    pub async fn generate_single(&self, use_synthetic: bool) -> Result<ContentItem, QueueError> {
        let source = if use_synthetic {
            ContentSource::Synthetic
        } else {
            ContentSource::Curated
        };
        Ok(self.pipeline.generate(source).await?)
    }

    /// Backlog items scheduled from today through `today + days`.
    pub async fn upcoming(&self, days: u32) -> Result<Vec<ContentItem>, StoreError> {
        let today = self.clock().today();
        let end = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let filter = ItemFilter::backlog().scheduled_within(DateRange { start: today, end });
        self.store().list(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{FixedDelay, NoDelay};
    use crate::store::MemoryStore;
    use crate::calendar::FixedClock;
    use crate::test_helpers::{FakeArt, FakeSynthetic, PipelineHarness, date, item_with, now};
    use crate::types::ItemUpdate;
    use std::time::Duration;

    fn scheduler(harness: &PipelineHarness, target_size: usize) -> QueueScheduler {
        QueueScheduler::new(
            Arc::new(harness.pipeline()),
            Arc::new(NoDelay),
            QueueConfig {
                target_size,
                ..QueueConfig::default()
            },
        )
    }

    fn backlog(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| {
                let status = if i % 2 == 0 {
                    ContentStatus::Pending
                } else {
                    ContentStatus::Approved
                };
                item_with(status, Some(date(2026, 3, 1 + i as u32)), 1)
            })
            .collect()
    }

    // =========================================================================
    // SourceMix
    // =========================================================================

    #[test]
    fn mix_targets_rounded_share() {
        assert_eq!(SourceMix::new(10, 0.4, true).target_synthetic, 4);
        assert_eq!(SourceMix::new(4, 0.4, true).target_synthetic, 2);
        assert_eq!(SourceMix::new(7, 0.4, true).target_synthetic, 3);
        assert_eq!(SourceMix::new(1, 0.4, true).target_synthetic, 0);
    }

    #[test]
    fn mix_front_loads_synthetic() {
        let mut mix = SourceMix::new(5, 0.4, true);
        let mut sources = Vec::new();
        for _ in 0..5 {
            let source = mix.next_source();
            mix.record_success(source);
            sources.push(source);
        }
        use ContentSource::*;
        assert_eq!(sources, vec![Synthetic, Synthetic, Curated, Curated, Curated]);
    }

    #[test]
    fn mix_without_synthetic_source_is_all_curated() {
        let mix = SourceMix::new(10, 0.4, false);
        assert_eq!(mix.target_synthetic, 4);
        assert_eq!(mix.next_source(), ContentSource::Curated);
    }

    // =========================================================================
    // stats
    // =========================================================================

    #[tokio::test]
    async fn stats_count_only_backlog() {
        let mut items = backlog(3);
        items.push(item_with(ContentStatus::Rejected, None, 1));
        items.push(item_with(ContentStatus::Published, None, 1));
        items.push(item_with(ContentStatus::Failed, None, 1));
        let harness = PipelineHarness::with_store(MemoryStore::with_items(items));
        let queue = scheduler(&harness, 7);

        let stats = queue.stats().await.unwrap();
        assert_eq!(
            stats,
            QueueStats {
                total: 3,
                pending: 2,
                approved: 1,
                target_size: 7,
                needs_generation: 4,
            }
        );
        // No side effects
        assert_eq!(queue.stats().await.unwrap(), stats);
    }

    #[tokio::test]
    async fn stats_never_go_negative() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(backlog(9)));
        let stats = scheduler(&harness, 7).stats().await.unwrap();
        assert_eq!(stats.needs_generation, 0);
    }

    // =========================================================================
    // fill
    // =========================================================================

    #[tokio::test]
    async fn full_queue_generates_nothing() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(backlog(7)));
        let report = scheduler(&harness, 7).fill().await.unwrap();
        assert_eq!(report, FillReport::default());
        assert_eq!(harness.store.len(), 7);
    }

    #[tokio::test]
    async fn fill_tops_up_to_target() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(backlog(3)));
        let queue = scheduler(&harness, 7);

        let report = queue.fill().await.unwrap();
        assert_eq!(report.attempted, 4);
        assert_eq!(report.generated, 4);
        assert_eq!(report.errors, 0);
        // round(4 × 0.4) = 2
        assert_eq!(report.synthetic, 2);
        assert_eq!(queue.stats().await.unwrap().needs_generation, 0);
    }

    #[tokio::test]
    async fn fill_attempts_every_item_despite_failures() {
        let mut harness = PipelineHarness::with_store(MemoryStore::with_items(backlog(3)));
        let art = Arc::new(FakeArt::failing_on(&[1, 3]));
        harness.art = art.clone();
        let queue = scheduler(&harness, 7);

        let report = queue.fill().await.unwrap();
        assert_eq!(art.calls(), 4);
        assert_eq!(report.attempted, 4);
        assert_eq!(report.generated, 2);
        assert_eq!(report.errors, 2);
        assert_eq!(harness.store.len(), 5);
    }

    #[tokio::test]
    async fn unavailable_synthetic_source_is_never_called() {
        let mut harness = PipelineHarness::new();
        let synthetic = Arc::new(FakeSynthetic::unavailable());
        harness.synthetic = synthetic.clone();
        let queue = scheduler(&harness, 10);

        let report = queue.fill().await.unwrap();
        assert_eq!(report.generated, 10);
        assert_eq!(report.synthetic, 0);
        assert_eq!(synthetic.calls(), 0);
    }

    #[tokio::test]
    async fn failed_synthetic_runs_do_not_count_toward_mix() {
        let mut harness = PipelineHarness::new();
        let synthetic = Arc::new(FakeSynthetic::failing());
        harness.synthetic = synthetic.clone();
        let queue = scheduler(&harness, 5);

        let report = queue.fill().await.unwrap();
        // Target is 2 synthetic; every attempt keeps trying synthetic and fails
        assert_eq!(synthetic.calls(), 5);
        assert_eq!(report.errors, 5);
        assert_eq!(report.generated, 0);
    }

    #[tokio::test]
    async fn batch_dates_are_consecutive_from_today() {
        let harness = PipelineHarness::new();
        scheduler(&harness, 4).fill().await.unwrap();

        let mut dates: Vec<NaiveDate> = harness
            .store
            .list(&ItemFilter::backlog())
            .await
            .unwrap()
            .iter()
            .filter_map(|item| item.scheduled_date)
            .collect();
        dates.sort();
        assert_eq!(
            dates,
            vec![
                date(2026, 3, 1),
                date(2026, 3, 2),
                date(2026, 3, 3),
                date(2026, 3, 4)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_pauses_between_items_only() {
        let harness = PipelineHarness::new();
        let queue = QueueScheduler::new(
            Arc::new(harness.pipeline()),
            Arc::new(FixedDelay(Duration::from_secs(2))),
            QueueConfig {
                target_size: 3,
                ..QueueConfig::default()
            },
        );

        let start = tokio::time::Instant::now();
        let report = queue.fill().await.unwrap();
        assert_eq!(report.generated, 3);
        // Two pauses for three items
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    // =========================================================================
    // assign_next_date
    // =========================================================================

    #[tokio::test]
    async fn next_date_clamps_stale_backlog_to_today() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(vec![item_with(
            ContentStatus::Pending,
            Some(date(2026, 2, 28)),
            3,
        )]));
        let queue = scheduler(&harness, 7);
        assert_eq!(queue.assign_next_date().await.unwrap(), date(2026, 3, 1));
    }

    #[tokio::test]
    async fn next_date_follows_future_backlog() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(vec![item_with(
            ContentStatus::Approved,
            Some(date(2026, 3, 3)),
            1,
        )]));
        let queue = scheduler(&harness, 7);
        assert_eq!(queue.assign_next_date().await.unwrap(), date(2026, 3, 4));
    }

    // =========================================================================
    // cleanup
    // =========================================================================

    #[tokio::test]
    async fn cleanup_purges_only_old_terminal_items() {
        let old_published = item_with(ContentStatus::Published, None, 31);
        let old_rejected = item_with(ContentStatus::Rejected, None, 45);
        let old_pending = item_with(ContentStatus::Pending, None, 31);
        let old_failed = item_with(ContentStatus::Failed, None, 90);
        let recent_rejected = item_with(ContentStatus::Rejected, None, 5);
        let harness = PipelineHarness::with_store(MemoryStore::with_items(vec![
            old_published.clone(),
            old_rejected.clone(),
            old_pending.clone(),
            old_failed.clone(),
            recent_rejected.clone(),
        ]));
        let queue = scheduler(&harness, 7);

        assert_eq!(queue.cleanup(30).await.unwrap(), 2);

        let remaining: Vec<_> = harness
            .store
            .list(&ItemFilter::any())
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert!(!remaining.contains(&old_published.id));
        assert!(!remaining.contains(&old_rejected.id));
        assert!(remaining.contains(&old_pending.id));
        assert!(remaining.contains(&old_failed.id));
        assert!(remaining.contains(&recent_rejected.id));
    }

    #[tokio::test]
    async fn cleanup_ages_generated_items_by_the_pipeline_clock() {
        let mut harness = PipelineHarness::new();
        let item = harness.pipeline().generate(ContentSource::Curated).await.unwrap();
        assert_eq!(item.created_at, now());
        harness
            .store
            .update(
                item.id,
                ItemUpdate {
                    status: Some(ContentStatus::Rejected),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap();

        harness.clock = FixedClock::at(now() + chrono::Duration::days(30));
        assert_eq!(scheduler(&harness, 7).cleanup(30).await.unwrap(), 0);

        harness.clock = FixedClock::at(now() + chrono::Duration::days(31));
        assert_eq!(scheduler(&harness, 7).cleanup(30).await.unwrap(), 1);
        assert!(harness.store.is_empty());
    }

    // =========================================================================
    // generate_single / upcoming
    // =========================================================================

    #[tokio::test]
    async fn generate_single_honours_source_flag() {
        let harness = PipelineHarness::new();
        let queue = scheduler(&harness, 7);
        let synthetic = queue.generate_single(true).await.unwrap();
        let curated = queue.generate_single(false).await.unwrap();
        assert_eq!(synthetic.source, ContentSource::Synthetic);
        assert_eq!(curated.source, ContentSource::Curated);
    }

    #[tokio::test]
    async fn generate_single_surfaces_typed_errors() {
        let mut harness = PipelineHarness::new();
        harness.synthetic = Arc::new(FakeSynthetic::unavailable());
        let queue = scheduler(&harness, 7);
        let error = queue.generate_single(true).await.unwrap_err();
        assert!(matches!(error, QueueError::Pipeline(PipelineError::Provider(_))));
        assert!(error.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[tokio::test]
    async fn upcoming_lists_backlog_in_window() {
        let harness = PipelineHarness::with_store(MemoryStore::with_items(vec![
            item_with(ContentStatus::Pending, Some(date(2026, 2, 27)), 5),
            item_with(ContentStatus::Approved, Some(date(2026, 3, 4)), 1),
            item_with(ContentStatus::Pending, Some(date(2026, 3, 2)), 1),
            item_with(ContentStatus::Pending, Some(date(2026, 3, 20)), 1),
            item_with(ContentStatus::Rejected, Some(date(2026, 3, 3)), 1),
        ]));
        let upcoming = scheduler(&harness, 7).upcoming(7).await.unwrap();
        let dates: Vec<_> = upcoming.iter().filter_map(|i| i.scheduled_date).collect();
        assert_eq!(dates, vec![date(2026, 3, 2), date(2026, 3, 4)]);
    }
}
