//! Reviewer actions on stored items.
//!
//! Every status change is checked against
//! [`ContentStatus::can_transition_to`] before anything is written.
//! `regenerate` is two separate steps (delete, then a fresh pipeline run);
//! if the second step fails the old item is gone and its slot stays empty
//! until the next fill.

use crate::pipeline::{ContentPipeline, PipelineError};
use crate::store::{ItemStore, StoreError};
use crate::types::{ContentItem, ContentStatus, ItemUpdate};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Content item not found: {0}")]
    NotFound(Uuid),
    #[error("Cannot move item {id} from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: ContentStatus,
        to: ContentStatus,
    },
    #[error("Cannot {action} item {id} while it is {status}")]
    InvalidState {
        id: Uuid,
        status: ContentStatus,
        action: &'static str,
    },
    #[error("Invalid schedule date {date}: must not be before {today}")]
    DateInPast { date: NaiveDate, today: NaiveDate },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Regeneration failed after deleting {deleted}: {source}")]
    Regenerate {
        deleted: Uuid,
        #[source]
        source: PipelineError,
    },
}

pub struct Reviewer {
    pipeline: Arc<ContentPipeline>,
}

impl Reviewer {
    pub fn new(pipeline: Arc<ContentPipeline>) -> Self {
        Self { pipeline }
    }

    fn store(&self) -> &dyn ItemStore {
        self.pipeline.store().as_ref()
    }

    pub async fn get(&self, id: Uuid) -> Result<ContentItem, ReviewError> {
        self.store().get(id).await?.ok_or(ReviewError::NotFound(id))
    }

    async fn transition(
        &self,
        id: Uuid,
        to: ContentStatus,
        mut update: ItemUpdate,
    ) -> Result<ContentItem, ReviewError> {
        let item = self.get(id).await?;
        if !item.status.can_transition_to(to) {
            return Err(ReviewError::InvalidTransition {
                id,
                from: item.status,
                to,
            });
        }
        update.status = Some(to);
        let updated = self.store().update(id, update).await?;
        info!(item_id = %id, from = %item.status, %to, "item status changed");
        Ok(updated)
    }

    pub async fn approve(&self, id: Uuid) -> Result<ContentItem, ReviewError> {
        let approved_at = Some(self.pipeline.clock().now());
        self.transition(
            id,
            ContentStatus::Approved,
            ItemUpdate {
                approved_at,
                ..ItemUpdate::default()
            },
        )
        .await
    }

    pub async fn reject(&self, id: Uuid) -> Result<ContentItem, ReviewError> {
        self.transition(id, ContentStatus::Rejected, ItemUpdate::default())
            .await
    }

    /// Undo a rejection, returning the item to the review queue.
    pub async fn reopen(&self, id: Uuid) -> Result<ContentItem, ReviewError> {
        self.transition(id, ContentStatus::Pending, ItemUpdate::default())
            .await
    }

    /// Record the external publish step.
    pub async fn mark_published(&self, id: Uuid, post_id: &str) -> Result<ContentItem, ReviewError> {
        let published_at = Some(self.pipeline.clock().now());
        self.transition(
            id,
            ContentStatus::Published,
            ItemUpdate {
                published_at,
                external_post_id: Some(post_id.to_string()),
                ..ItemUpdate::default()
            },
        )
        .await
    }

    /// Move a backlog item to another day. Past dates are refused.
    pub async fn reschedule(&self, id: Uuid, date: NaiveDate) -> Result<ContentItem, ReviewError> {
        let item = self.get(id).await?;
        if !item.status.counts_toward_backlog() {
            return Err(ReviewError::InvalidState {
                id,
                status: item.status,
                action: "reschedule",
            });
        }
        let today = self.pipeline.clock().today();
        if date < today {
            return Err(ReviewError::DateInPast { date, today });
        }
        let updated = self
            .store()
            .update(
                id,
                ItemUpdate {
                    scheduled_date: Some(date),
                    ..ItemUpdate::default()
                },
            )
            .await?;
        info!(item_id = %id, %date, "item rescheduled");
        Ok(updated)
    }

    /// Set caption and/or hashtags. `None` leaves a field unchanged.
    pub async fn annotate(
        &self,
        id: Uuid,
        caption: Option<String>,
        hashtags: Option<Vec<String>>,
    ) -> Result<ContentItem, ReviewError> {
        self.get(id).await?;
        Ok(self
            .store()
            .update(
                id,
                ItemUpdate {
                    caption,
                    hashtags,
                    ..ItemUpdate::default()
                },
            )
            .await?)
    }

    /// Remove an item. Published items are kept for the record.
    pub async fn delete(&self, id: Uuid) -> Result<(), ReviewError> {
        let item = self.get(id).await?;
        if item.status == ContentStatus::Published {
            return Err(ReviewError::InvalidState {
                id,
                status: item.status,
                action: "delete",
            });
        }
        self.store().delete(id).await?;
        info!(item_id = %id, status = %item.status, "item deleted");
        Ok(())
    }

    /// Replace a rejected item with a fresh one from the same source.
    pub async fn regenerate(&self, id: Uuid) -> Result<ContentItem, ReviewError> {
        let item = self.get(id).await?;
        if item.status != ContentStatus::Rejected {
            return Err(ReviewError::InvalidState {
                id,
                status: item.status,
                action: "regenerate",
            });
        }

        self.store().delete(id).await?;
        match self.pipeline.generate(item.source).await {
            Ok(replacement) => {
                info!(deleted = %id, item_id = %replacement.id, "item regenerated");
                Ok(replacement)
            }
            Err(source) => {
                warn!(
                    deleted = %id,
                    error = %source,
                    "item deleted but replacement failed; slot stays empty until next fill"
                );
                Err(ReviewError::Regenerate {
                    deleted: id,
                    source,
                })
            }
        }
    }
}
