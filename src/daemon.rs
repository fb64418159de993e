//! Long-running job runner.
//!
//! | Job | When (local time) |
//! |---|---|
//! | Queue fill | every day at `fill_hour`:00 |
//! | Retention cleanup | every `cleanup_weekday` at `cleanup_hour`:00 |
//! | Stats log | every `stats_interval_minutes` |
//!
//! Job failures are logged and the loop keeps going. Next-fire times are
//! computed on naive local time, so a DST jump can shift one run by an hour.

use crate::config::DaemonConfig;
use crate::queue::QueueScheduler;
use chrono::{Datelike, Days, Local, NaiveDateTime, NaiveTime, Weekday};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

fn at_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Next `hour`:00 strictly after `now`.
pub fn next_daily(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let today = now.date().and_time(at_hour(hour));
    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

/// Next `weekday` at `hour`:00 strictly after `now`.
pub fn next_weekly(now: NaiveDateTime, weekday: Weekday, hour: u32) -> NaiveDateTime {
    let ahead = (7 + weekday.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let candidate = (now.date() + Days::new(u64::from(ahead))).and_time(at_hour(hour));
    if candidate > now {
        candidate
    } else {
        candidate + Days::new(7)
    }
}

fn until(now: NaiveDateTime, at: NaiveDateTime) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}

pub struct Daemon {
    queue: Arc<QueueScheduler>,
    schedule: DaemonConfig,
}

impl Daemon {
    pub fn new(queue: Arc<QueueScheduler>, schedule: DaemonConfig) -> Self {
        Self { queue, schedule }
    }

    /// Run until `shutdown` resolves. With `fill_now`, fills once on start.
    pub async fn run<F>(&self, fill_now: bool, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            fill_hour = self.schedule.fill_hour,
            cleanup_weekday = %self.schedule.cleanup_weekday,
            cleanup_hour = self.schedule.cleanup_hour,
            "daemon started"
        );
        if fill_now {
            self.fill().await;
        }

        let mut stats_tick = tokio::time::interval(Duration::from_secs(
            self.schedule.stats_interval_minutes.max(1) * 60,
        ));
        tokio::pin!(shutdown);

        loop {
            let now = Local::now().naive_local();
            let fill_in = until(now, next_daily(now, self.schedule.fill_hour));
            let cleanup_in = until(
                now,
                next_weekly(now, self.schedule.cleanup_weekday, self.schedule.cleanup_hour),
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("daemon stopping");
                    return;
                }
                _ = tokio::time::sleep(fill_in) => self.fill().await,
                _ = tokio::time::sleep(cleanup_in) => self.cleanup().await,
                _ = stats_tick.tick() => self.log_stats().await,
            }
        }
    }

    async fn fill(&self) {
        match self.queue.fill().await {
            Ok(report) => info!(
                generated = report.generated,
                errors = report.errors,
                "scheduled fill complete"
            ),
            Err(error) => error!(%error, "scheduled fill failed"),
        }
    }

    async fn cleanup(&self) {
        let days = self.queue.settings().retention_days;
        match self.queue.cleanup(days).await {
            Ok(deleted) => info!(deleted, "scheduled cleanup complete"),
            Err(error) => error!(%error, "scheduled cleanup failed"),
        }
    }

    async fn log_stats(&self) {
        match self.queue.stats().await {
            Ok(stats) => info!(
                total = stats.total,
                pending = stats.pending,
                approved = stats.approved,
                needs_generation = stats.needs_generation,
                "queue stats"
            ),
            Err(error) => error!(%error, "could not read queue stats"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::pacing::NoDelay;
    use crate::test_helpers::{PipelineHarness, date};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn daily_fires_later_today_or_tomorrow() {
        assert_eq!(next_daily(at(2026, 3, 2, 5, 30), 6), at(2026, 3, 2, 6, 0));
        assert_eq!(next_daily(at(2026, 3, 2, 6, 0), 6), at(2026, 3, 3, 6, 0));
        assert_eq!(next_daily(at(2026, 3, 31, 23, 0), 6), at(2026, 4, 1, 6, 0));
    }

    #[test]
    fn weekly_fires_on_requested_weekday() {
        // 2026-03-02 is a Monday
        assert_eq!(
            next_weekly(at(2026, 3, 2, 12, 0), Weekday::Sun, 3),
            at(2026, 3, 8, 3, 0)
        );
        // Sunday before the hour: same day
        assert_eq!(
            next_weekly(at(2026, 3, 8, 1, 0), Weekday::Sun, 3),
            at(2026, 3, 8, 3, 0)
        );
        // Sunday after the hour: a week later
        assert_eq!(
            next_weekly(at(2026, 3, 8, 3, 0), Weekday::Sun, 3),
            at(2026, 3, 15, 3, 0)
        );
    }

    #[test]
    fn until_never_negative() {
        assert_eq!(until(at(2026, 3, 2, 7, 0), at(2026, 3, 2, 6, 0)), Duration::ZERO);
        assert_eq!(
            until(at(2026, 3, 2, 5, 0), at(2026, 3, 2, 6, 0)),
            Duration::from_secs(3600)
        );
    }

    #[tokio::test]
    async fn fill_now_runs_before_shutdown() {
        let harness = PipelineHarness::new();
        let queue = Arc::new(QueueScheduler::new(
            Arc::new(harness.pipeline()),
            Arc::new(NoDelay),
            QueueConfig {
                target_size: 2,
                ..QueueConfig::default()
            },
        ));
        Daemon::new(queue, DaemonConfig::default())
            .run(true, async {})
            .await;
        assert_eq!(harness.store.len(), 2);
    }
}
