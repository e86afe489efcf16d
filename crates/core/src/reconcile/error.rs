use std::time::Duration;

use thiserror::Error;

use crate::document::DocumentId;
use crate::schema::UnknownReason;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(StoreError),

    #[error("store operation `{op}` timed out after {timeout:?}")]
    Timeout { op: &'static str, timeout: Duration },

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("document {id} has an unrecognised shape: {reason}")]
    ClassificationUnknown { id: DocumentId, reason: UnknownReason },

    #[error("{} documents are active: {}", .ids.len(), join_ids(.ids))]
    MultipleActiveDocuments { ids: Vec<DocumentId> },

    #[error("no document is active")]
    NoActiveDocument,

    #[error("failed to build canonical payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Errors after which a batch must stop instead of moving to the next document.
    pub fn is_fatal(&self) -> bool {
        match self {
            ReconcileError::Store(err) => err.is_connection(),
            ReconcileError::Timeout { .. } | ReconcileError::Payload(_) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ReconcileError::NotFound(id),
            other => ReconcileError::Store(other),
        }
    }
}

fn join_ids(ids: &[DocumentId]) -> String {
    ids.iter()
        .map(DocumentId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
