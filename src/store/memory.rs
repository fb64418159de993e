use super::{Collection, ItemStore, StoreError};
use crate::types::{ContentItem, ItemFilter, ItemUpdate, NewContentItem};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

/// Non-durable store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: Mutex<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of items (ids and timestamps kept as given).
    pub fn with_items(items: Vec<ContentItem>) -> Self {
        Self {
            collection: Mutex::new(Collection::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        self.collection.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.lock().is_empty()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem, StoreError> {
        Ok(self.collection.lock().insert(item))
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.collection.lock().get(id))
    }

    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<ContentItem, StoreError> {
        self.collection.lock().update(id, update)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.collection.lock().delete(id)
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.collection.lock().list(filter))
    }

    async fn delete_matching(&self, filter: &ItemFilter) -> Result<usize, StoreError> {
        Ok(self.collection.lock().delete_matching(filter))
    }
}
