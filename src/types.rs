//! Shared types used across the store, pipeline, scheduler and review layers.
//!
//! [`ContentItem`] is the one persisted entity. Everything the queue knows
//! about the backlog is derived from a collection of these, so the filter
//! and ordering rules the stores must honour live here too.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a content item.
///
/// ```text
/// pending ──approve──▶ approved ──publish──▶ published
///    │  ▲                  │
///  reject└──reopen──┐    reject
///    ▼              │      ▼
/// rejected ─────────┴── rejected
/// ```
///
/// `failed` is only written when the pipeline is configured to record
/// failed runs; nothing transitions out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Pending,
    Approved,
    Rejected,
    Published,
    Failed,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 5] = [
        ContentStatus::Pending,
        ContentStatus::Approved,
        ContentStatus::Rejected,
        ContentStatus::Published,
        ContentStatus::Failed,
    ];

    /// Statuses that occupy a backlog slot.
    pub const BACKLOG: [ContentStatus; 2] = [ContentStatus::Pending, ContentStatus::Approved];

    /// Statuses purged by retention cleanup once old enough.
    pub const RETAINED: [ContentStatus; 2] = [ContentStatus::Rejected, ContentStatus::Published];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Published => "published",
            ContentStatus::Failed => "failed",
        }
    }

    pub fn counts_toward_backlog(self) -> bool {
        Self::BACKLOG.contains(&self)
    }

    /// Whether a reviewer (or the publisher) may move an item from `self` to `to`.
    pub fn can_transition_to(self, to: ContentStatus) -> bool {
        use ContentStatus::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Rejected)
                | (Approved, Published)
                | (Rejected, Pending)
        )
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("invalid status '{s}', expected one of: {}", valid.join(", "))
            })
    }
}

/// Provenance of an item's quote text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// Third-party quote provider, usually attributed.
    Curated,
    /// Text-generation provider, never attributed.
    #[serde(alias = "ai_generated")]
    Synthetic,
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Curated => f.write_str("curated"),
            ContentSource::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// One planned or published post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub quote_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub source: ContentSource,
    /// Final composited JPEG, stored inline.
    #[serde(with = "payload_base64", default)]
    pub image_payload: Vec<u8>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_time: Option<NaiveTime>,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Everything a caller supplies when creating an item. The store mints
/// `id`; `created_at` comes from the caller's clock so retention cleanup and
/// the rows it inspects agree on what "now" is.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentItem {
    pub quote_text: String,
    pub author: Option<String>,
    pub source: ContentSource,
    pub image_payload: Vec<u8>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub prompt_used: Option<String>,
    pub status: ContentStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewContentItem {
    /// A pending item, as the pipeline writes on success.
    pub fn pending(
        quote_text: String,
        author: Option<String>,
        source: ContentSource,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            quote_text,
            author,
            source,
            image_payload: Vec::new(),
            scheduled_date: None,
            scheduled_time: None,
            prompt_used: None,
            status: ContentStatus::Pending,
            error_message: None,
            created_at,
        }
    }

    pub fn into_item(self, id: Uuid) -> ContentItem {
        ContentItem {
            id,
            quote_text: self.quote_text,
            author: self.author,
            source: self.source,
            image_payload: self.image_payload,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            status: self.status,
            external_post_id: None,
            caption: None,
            hashtags: Vec::new(),
            prompt_used: self.prompt_used,
            created_at: self.created_at,
            approved_at: None,
            published_at: None,
            error_message: self.error_message,
        }
    }
}

/// Sparse field update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub status: Option<ContentStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub external_post_id: Option<String>,
    pub caption: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ItemUpdate {
    pub fn apply(self, item: &mut ContentItem) {
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(date) = self.scheduled_date {
            item.scheduled_date = Some(date);
        }
        if let Some(time) = self.scheduled_time {
            item.scheduled_time = Some(time);
        }
        if let Some(post_id) = self.external_post_id {
            item.external_post_id = Some(post_id);
        }
        if let Some(caption) = self.caption {
            item.caption = Some(caption);
        }
        if let Some(hashtags) = self.hashtags {
            item.hashtags = hashtags;
        }
        if let Some(at) = self.approved_at {
            item.approved_at = Some(at);
        }
        if let Some(at) = self.published_at {
            item.published_at = Some(at);
        }
        if let Some(message) = self.error_message {
            item.error_message = Some(message);
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Query over the item collection. Empty `statuses` means any status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub statuses: Vec<ContentStatus>,
    /// Only items whose `scheduled_date` falls inside the range.
    pub scheduled: Option<DateRange>,
    /// Only items created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl ItemFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_statuses(statuses: &[ContentStatus]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Self::default()
        }
    }

    /// Items occupying a backlog slot.
    pub fn backlog() -> Self {
        Self::with_statuses(&ContentStatus::BACKLOG)
    }

    pub fn scheduled_within(mut self, range: DateRange) -> Self {
        self.scheduled = Some(range);
        self
    }

    pub fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&item.status) {
            return false;
        }
        if let Some(range) = self.scheduled {
            match item.scheduled_date {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }
        if let Some(cutoff) = self.created_before
            && item.created_at >= cutoff
        {
            return false;
        }
        true
    }
}

/// Listing order shared by every store: scheduled date ascending with
/// unscheduled items last, then newest first.
pub fn listing_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    let by_date = match (a.scheduled_date, b.scheduled_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| b.created_at.cmp(&a.created_at))
}

/// Serde adapter storing the image payload as standard base64 text.
mod payload_base64 {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
