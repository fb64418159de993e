//! Durable collection of content items.
//!
//! The core never talks to a concrete database: the pipeline, scheduler and
//! review layer all go through the [`ItemStore`] trait. Two implementations
//! ship with the crate:
//!
//! | Store | Use |
//! |---|---|
//! | [`MemoryStore`] | tests and throwaway runs |
//! | [`JsonFileStore`] | default; one JSON document on disk, rewritten atomically |
//!
//! Both share [`Collection`], which owns the filter and ordering rules so
//! every backend answers queries identically.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::types::{ContentItem, ItemFilter, ItemUpdate, NewContentItem, listing_order};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Content item not found: {0}")]
    NotFound(Uuid),
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store data is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported store format: {0}")]
    Format(String),
}

/// Persistence interface consumed by the core.
///
/// Every call is independent; there are no transactions. `list` always
/// returns items in [`listing_order`].
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new item, minting its id. `created_at` is taken as given.
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, StoreError>;

    /// Apply a sparse update. Fails with [`StoreError::NotFound`] for unknown ids.
    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<ContentItem, StoreError>;

    /// Remove an item. Fails with [`StoreError::NotFound`] for unknown ids.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, StoreError>;

    /// Remove every matching item in one step, returning how many went.
    async fn delete_matching(&self, filter: &ItemFilter) -> Result<usize, StoreError>;
}

/// In-memory item collection with the query semantics every store shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    items: Vec<ContentItem>,
}

impl Collection {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn insert(&mut self, new: NewContentItem) -> ContentItem {
        let item = new.into_item(Uuid::new_v4());
        self.items.push(item.clone());
        item
    }

    pub fn get(&self, id: Uuid) -> Option<ContentItem> {
        self.items.iter().find(|item| item.id == id).cloned()
    }

    pub fn update(&mut self, id: Uuid, update: ItemUpdate) -> Result<ContentItem, StoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        update.apply(item);
        Ok(item.clone())
    }

    pub fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub fn list(&self, filter: &ItemFilter) -> Vec<ContentItem> {
        let mut matched: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        matched.sort_by(listing_order);
        matched
    }

    pub fn delete_matching(&mut self, filter: &ItemFilter) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !filter.matches(item));
        before - self.items.len()
    }
}
