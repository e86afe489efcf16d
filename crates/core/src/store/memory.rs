use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{DocumentStore, DocumentUpdate, Filter, StoreError, SwapOutcome, SwapTarget};
use crate::document::{DocumentId, NewDocument, SiteContentDocument};

/// In-process store keeping documents in insertion order.
///
/// Unlike the PostgreSQL table it has no unique-active constraint, so it can
/// hold the inconsistent states the reconciler has to repair.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: String,
    documents: Mutex<Vec<SiteContentDocument>>,
    rejected: Mutex<HashSet<DocumentId>>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Insert a document as-is, bypassing every invariant. Returns its id.
    pub fn seed(&self, payload: Value, is_active: bool) -> DocumentId {
        let doc = self.new_document(payload, is_active);
        let id = doc.id;
        self.documents().push(doc);
        id
    }

    fn new_document(&self, payload: Value, is_active: bool) -> SiteContentDocument {
        let now = Utc::now();
        SiteContentDocument {
            id: DocumentId::generate(),
            collection: self.collection.clone(),
            payload,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Make every later `update_one` on `id` fail, as a store would on a
    /// document it refuses to write.
    pub fn reject_writes_to(&self, id: DocumentId) {
        self.rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id);
    }

    /// Copy of the current contents, in insertion order.
    pub fn snapshot(&self) -> Vec<SiteContentDocument> {
        self.documents().clone()
    }

    fn documents(&self) -> MutexGuard<'_, Vec<SiteContentDocument>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_rejected(&self, id: DocumentId) -> bool {
        self.rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&id)
    }
}

fn apply(doc: &mut SiteContentDocument, update: &DocumentUpdate) {
    if let Some(active) = update.is_active {
        doc.is_active = active;
    }
    if let Some(payload) = &update.payload {
        doc.payload = payload.clone();
    }
    doc.updated_at = Utc::now();
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn find_all(&self) -> Result<Vec<SiteContentDocument>, StoreError> {
        Ok(self.snapshot())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<SiteContentDocument>, StoreError> {
        Ok(self.documents().iter().find(|d| filter.matches(d)).cloned())
    }

    async fn update_many(
        &self,
        filter: &Filter,
        update: &DocumentUpdate,
    ) -> Result<u64, StoreError> {
        if update.is_empty() {
            return Ok(0);
        }
        let mut touched = 0;
        for doc in self.documents().iter_mut().filter(|d| filter.matches(d)) {
            apply(doc, update);
            touched += 1;
        }
        Ok(touched)
    }

    async fn update_one(
        &self,
        id: DocumentId,
        update: &DocumentUpdate,
    ) -> Result<bool, StoreError> {
        if self.is_rejected(id) {
            return Err(StoreError::Rejected {
                id,
                reason: "document is write-protected".into(),
            });
        }
        match self.documents().iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                if !update.is_empty() {
                    apply(doc, update);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_one(&self, doc: NewDocument) -> Result<SiteContentDocument, StoreError> {
        let id = self.seed(doc.payload, doc.is_active);
        self.documents()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut documents = self.documents();
        let before = documents.len();
        documents.retain(|d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }

    /// Atomic: the whole swap runs under one lock of the document list.
    async fn swap_active(
        &self,
        target: SwapTarget,
        payload: &Value,
    ) -> Result<SwapOutcome, StoreError> {
        let mut documents = self.documents();

        let keep = match target {
            SwapTarget::Existing(id) => {
                if !documents.iter().any(|d| d.id == id) {
                    return Err(StoreError::NotFound(id));
                }
                if self.is_rejected(id) {
                    return Err(StoreError::Rejected {
                        id,
                        reason: "document is write-protected".into(),
                    });
                }
                Some(id)
            }
            SwapTarget::Insert => documents
                .iter()
                .find(|d| d.is_active && d.payload == *payload)
                .map(|d| d.id),
        };

        let mut deactivated = 0;
        for doc in documents.iter_mut().filter(|d| d.is_active) {
            apply(doc, &DocumentUpdate::deactivate());
            deactivated += 1;
        }

        match keep {
            Some(id) => {
                let update = DocumentUpdate::activate_with(payload.clone());
                if let Some(doc) = documents.iter_mut().find(|d| d.id == id) {
                    apply(doc, &update);
                }
                Ok(SwapOutcome {
                    id,
                    inserted: false,
                    deactivated,
                })
            }
            None => {
                let doc = self.new_document(payload.clone(), true);
                let id = doc.id;
                documents.push(doc);
                Ok(SwapOutcome {
                    id,
                    inserted: true,
                    deactivated,
                })
            }
        }
    }

    async fn replace_all(
        &self,
        payload: &Value,
    ) -> Result<(u64, SiteContentDocument), StoreError> {
        let mut documents = self.documents();
        let deleted = documents.len() as u64;
        let created = self.new_document(payload.clone(), true);
        documents.clear();
        documents.push(created.clone());
        Ok((deleted, created))
    }
}
