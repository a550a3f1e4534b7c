//! Client-side document and query-history store.
//!
//! [`ClientStore`] owns the in-memory document list and query history and
//! mirrors each of them into one slot of an injected [`KeyValueStore`]. Every
//! mutation re-serializes the whole list and overwrites its slot; there is no
//! incremental update and no version tag on the stored shape.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::kv::{KeyValueStore, SqliteKv};
use crate::models::{Document, QueryRecord};

/// Slot holding the serialized document list.
pub const DOCUMENTS_KEY: &str = "documents";
/// Slot holding the serialized query history.
pub const HISTORY_KEY: &str = "query_history";

pub struct ClientStore {
    kv: Arc<dyn KeyValueStore>,
    documents: Vec<Document>,
    history: Vec<QueryRecord>,
}

impl ClientStore {
    /// Load both lists from `kv`. A missing slot is an empty list; a slot that
    /// does not parse is logged and treated as empty.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self> {
        let documents = load_slot(kv.as_ref(), DOCUMENTS_KEY).await?;
        let history = load_slot(kv.as_ref(), HISTORY_KEY).await?;
        debug!(
            documents = documents.len(),
            queries = history.len(),
            "client store loaded"
        );
        Ok(Self {
            kv,
            documents,
            history,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn history(&self) -> &[QueryRecord] {
        &self.history
    }

    pub fn find_document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Append a batch of documents and persist the list.
    ///
    /// In-memory state only changes once the write has succeeded.
    pub async fn add_documents(&mut self, docs: Vec<Document>) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let mut next = self.documents.clone();
        next.extend(docs);
        save_slot(self.kv.as_ref(), DOCUMENTS_KEY, &next).await?;
        self.documents = next;
        Ok(())
    }

    /// Remove one document by id. Returns `false` if no such document exists.
    pub async fn remove_document(&mut self, id: &str) -> Result<bool> {
        if self.find_document(id).is_none() {
            return Ok(false);
        }
        let next: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| d.id != id)
            .cloned()
            .collect();
        save_slot(self.kv.as_ref(), DOCUMENTS_KEY, &next).await?;
        self.documents = next;
        Ok(true)
    }

    /// Append a completed query to the history and persist it.
    pub async fn record_query(&mut self, record: QueryRecord) -> Result<()> {
        let mut next = self.history.clone();
        next.push(record);
        save_slot(self.kv.as_ref(), HISTORY_KEY, &next).await?;
        self.history = next;
        Ok(())
    }

    /// Empty both lists and delete both slots.
    pub async fn clear_all(&mut self) -> Result<()> {
        self.kv.delete(DOCUMENTS_KEY).await?;
        self.documents.clear();
        self.kv.delete(HISTORY_KEY).await?;
        self.history.clear();
        Ok(())
    }

    /// Every stored document as a `Document: <name>` block followed by its
    /// content, blocks separated by a blank line.
    pub fn corpus(&self) -> String {
        self.documents
            .iter()
            .map(|d| format!("Document: {}\n{}", d.name, d.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Open the SQLite-backed store configured under `[storage]`.
pub async fn open(config: &Config) -> Result<ClientStore> {
    let kv = SqliteKv::open(&config.storage.path)
        .await
        .with_context(|| format!("Failed to open store: {}", config.storage.path.display()))?;
    ClientStore::load(Arc::new(kv)).await
}

async fn load_slot<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Result<Vec<T>> {
    let Some(raw) = kv
        .get(key)
        .await
        .with_context(|| format!("Failed to read stored {}", key))?
    else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(items) => Ok(items),
        Err(e) => {
            warn!(key, error = %e, "stored slot is not readable; starting empty");
            Ok(Vec::new())
        }
    }
}

async fn save_slot<T: Serialize>(kv: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    kv.set(key, &raw)
        .await
        .with_context(|| format!("Failed to write stored {}", key))
}
