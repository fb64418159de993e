//! Clock abstraction and schedule date arithmetic.
//!
//! Scheduling decisions depend on "today" and "now". Both come from a
//! [`Clock`] so tests can pin them with [`FixedClock`].

use crate::store::{ItemStore, StoreError};
use crate::types::ItemFilter;
use chrono::{DateTime, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current instant, for timestamps and retention cutoffs.
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date, time-of-day discarded.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that never moves.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl FixedClock {
    /// Pinned at `now`, with `today` taken from its UTC date.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: now.date_naive(),
        }
    }

    /// Override the local date independently of the instant.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// The next free publishing date.
///
/// With nothing scheduled this is `today`. Otherwise it is the day after the
/// latest scheduled date, clamped so it is never in the past.
pub fn next_available_date(latest: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match latest {
        None => today,
        Some(last) => last.succ_opt().unwrap_or(last).max(today),
    }
}

/// Latest `scheduled_date` among items occupying a backlog slot.
pub async fn latest_scheduled_date(store: &dyn ItemStore) -> Result<Option<NaiveDate>, StoreError> {
    let backlog = store.list(&ItemFilter::backlog()).await?;
    Ok(backlog.iter().filter_map(|item| item.scheduled_date).max())
}

/// Resolve the date for the next generated item from the current store
/// contents. Called once per item, so a batch gets non-decreasing dates.
pub async fn assign_next_date(
    store: &dyn ItemStore,
    clock: &dyn Clock,
) -> Result<NaiveDate, StoreError> {
    let latest = latest_scheduled_date(store).await?;
    Ok(next_available_date(latest, clock.today()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_helpers::{date, item_with, now};
    use crate::types::ContentStatus;

    #[test]
    fn nothing_scheduled_means_today() {
        assert_eq!(next_available_date(None, date(2026, 3, 1)), date(2026, 3, 1));
    }

    #[test]
    fn past_backlog_is_clamped_to_today() {
        let today = date(2026, 3, 1);
        assert_eq!(next_available_date(Some(date(2026, 2, 28)), today), today);
        assert_eq!(next_available_date(Some(date(2025, 12, 1)), today), today);
    }

    #[test]
    fn future_backlog_continues_the_day_after() {
        let today = date(2026, 3, 1);
        assert_eq!(
            next_available_date(Some(date(2026, 3, 3)), today),
            date(2026, 3, 4)
        );
        // Scheduled for today already: tomorrow
        assert_eq!(next_available_date(Some(today), today), date(2026, 3, 2));
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let today = date(2026, 1, 1);
        assert_eq!(
            next_available_date(Some(date(2026, 2, 28)), today),
            date(2026, 3, 1)
        );
        assert_eq!(
            next_available_date(Some(date(2026, 12, 31)), today),
            date(2027, 1, 1)
        );
    }

    #[test]
    fn fixed_clock_is_pinned() {
        let clock = FixedClock::at(now());
        assert_eq!(clock.now(), now());
        assert_eq!(clock.today(), date(2026, 3, 1));

        let shifted = clock.with_today(date(2026, 3, 2));
        assert_eq!(shifted.today(), date(2026, 3, 2));
        assert_eq!(shifted.now(), now());
    }

    #[tokio::test]
    async fn assignment_reads_only_backlog_items() {
        let clock = FixedClock::at(now());
        let store = MemoryStore::with_items(vec![
            item_with(ContentStatus::Approved, Some(date(2026, 3, 3)), 1),
            item_with(ContentStatus::Pending, None, 0),
            // Terminal items never hold a slot
            item_with(ContentStatus::Published, Some(date(2026, 3, 20)), 1),
            item_with(ContentStatus::Rejected, Some(date(2026, 3, 10)), 1),
        ]);
        assert_eq!(
            assign_next_date(&store, &clock).await.unwrap(),
            date(2026, 3, 4)
        );
    }

    #[tokio::test]
    async fn assignment_on_empty_store_is_today() {
        let clock = FixedClock::at(now());
        let store = MemoryStore::new();
        assert_eq!(latest_scheduled_date(&store).await.unwrap(), None);
        assert_eq!(assign_next_date(&store, &clock).await.unwrap(), date(2026, 3, 1));
    }
}
