//! Single-document JSON store.
//!
//! The whole collection lives in one file:
//!
//! ```json
//! { "version": 1, "items": [ { "id": "…", "quote_text": "…", "image_payload": "<base64>", … } ] }
//! ```
//!
//! Every mutation rewrites the document through a sibling temp file followed
//! by a rename, so a crash mid-write leaves the previous version intact. The
//! lock is held across the write; two mutations never interleave on disk.

use super::{Collection, ItemStore, StoreError};
use crate::types::{ContentItem, ItemFilter, ItemUpdate, NewContentItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Version of the on-disk document. Bump when the item schema changes
/// incompatibly.
const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    items: Vec<ContentItem>,
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    collection: Mutex<Collection>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// Unlike a cache, an unreadable document is an error: silently starting
    /// over would drop the backlog.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collection = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let document: StoreDocument = serde_json::from_str(&content)?;
                if document.version != DOCUMENT_VERSION {
                    return Err(StoreError::Format(format!(
                        "{} has version {}, expected {}",
                        path.display(),
                        document.version,
                        DOCUMENT_VERSION
                    )));
                }
                Collection::new(document.items)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collection::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        debug!(path = %path.display(), items = collection.len(), "opened item store");
        Ok(Self {
            path,
            collection: Mutex::new(collection),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, collection: &Collection) -> Result<(), StoreError> {
        let document = StoreDocument {
            version: DOCUMENT_VERSION,
            items: collection.items().to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemStore for JsonFileStore {
    async fn insert(&self, item: NewContentItem) -> Result<ContentItem, StoreError> {
        let mut collection = self.collection.lock().await;
        let mut next = collection.clone();
        let inserted = next.insert(item);
        self.persist(&next).await?;
        *collection = next;
        Ok(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.collection.lock().await.get(id))
    }

    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<ContentItem, StoreError> {
        let mut collection = self.collection.lock().await;
        let mut next = collection.clone();
        let updated = next.update(id, update)?;
        self.persist(&next).await?;
        *collection = next;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut collection = self.collection.lock().await;
        let mut next = collection.clone();
        next.delete(id)?;
        self.persist(&next).await?;
        *collection = next;
        Ok(())
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.collection.lock().await.list(filter))
    }

    async fn delete_matching(&self, filter: &ItemFilter) -> Result<usize, StoreError> {
        let mut collection = self.collection.lock().await;
        let mut next = collection.clone();
        let removed = next.delete_matching(filter);
        if removed > 0 {
            self.persist(&next).await?;
            *collection = next;
        }
        Ok(removed)
    }
}
