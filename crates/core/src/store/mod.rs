//! Document store protocol.
//!
//! A store handle is scoped to one collection. Operations mirror what the
//! maintenance tooling needs: find-all, find-one-by-filter, update-many,
//! update-one, insert-one, delete-many, plus the atomic active swap.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::document::{DocumentId, NewDocument, SiteContentDocument};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("write to document {id} rejected: {reason}")]
    Rejected { id: DocumentId, reason: String },
}

impl StoreError {
    /// Whether the failure concerns the connection rather than one document.
    /// Batch operations abort on these and continue past everything else.
    pub fn is_connection(&self) -> bool {
        match self {
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

/// Document selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Active,
    Id(DocumentId),
}

impl Filter {
    pub fn matches(&self, doc: &SiteContentDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => doc.is_active,
            Filter::Id(id) => doc.id == *id,
        }
    }

    pub(crate) fn id(&self) -> Option<DocumentId> {
        match self {
            Filter::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn only_active(&self) -> bool {
        matches!(self, Filter::Active)
    }
}

/// Fields to set on matched documents. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub is_active: Option<bool>,
    pub payload: Option<Value>,
}

impl DocumentUpdate {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            payload: None,
        }
    }

    pub fn payload(payload: Value) -> Self {
        Self {
            is_active: None,
            payload: Some(payload),
        }
    }

    pub fn activate_with(payload: Value) -> Self {
        Self {
            is_active: Some(true),
            payload: Some(payload),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_active.is_none() && self.payload.is_none()
    }
}

/// Which document ends up active after a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTarget {
    Existing(DocumentId),
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub id: DocumentId,
    pub inserted: bool,
    /// Documents whose active flag was cleared, the target included.
    pub deactivated: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn collection(&self) -> &str;

    /// All documents of the collection in creation order.
    async fn find_all(&self) -> Result<Vec<SiteContentDocument>, StoreError>;

    /// First matching document in creation order.
    async fn find_one(&self, filter: &Filter) -> Result<Option<SiteContentDocument>, StoreError>;

    async fn update_many(&self, filter: &Filter, update: &DocumentUpdate)
        -> Result<u64, StoreError>;

    /// Returns `false` when no document has that id.
    async fn update_one(&self, id: DocumentId, update: &DocumentUpdate)
        -> Result<bool, StoreError>;

    async fn insert_one(&self, doc: NewDocument) -> Result<SiteContentDocument, StoreError>;

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Deactivate every document, then activate `target` with `payload`
    /// (or insert a new active document), as one atomic step.
    ///
    /// An existing target that is missing fails with [`StoreError::NotFound`]
    /// before anything is written. An insert first re-checks, under the same
    /// exclusion, for an active document already carrying `payload`; when a
    /// concurrent run has inserted one, that document is kept instead.
    async fn swap_active(&self, target: SwapTarget, payload: &Value)
        -> Result<SwapOutcome, StoreError>;

    /// Delete every document and insert one active document with `payload`,
    /// atomically. On failure the collection is left as it was.
    async fn replace_all(&self, payload: &Value) -> Result<(u64, SiteContentDocument), StoreError>;
}
