use crate::document::DocumentId;

use super::plan::ScannedDocument;

/// A document a batch could not process. The batch carried on without it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub id: DocumentId,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub collection: String,
    pub scanned: Vec<ScannedDocument>,
    /// The document that is active after the run.
    pub active: DocumentId,
    pub inserted: bool,
    /// Nothing was written: the target was already the sole active canonical document.
    pub unchanged: bool,
    pub deactivated: u64,
    /// Active documents found before the run when there was more than one.
    /// The run repaired them, but the state indicates a race or earlier bug.
    pub prior_active_conflict: Vec<DocumentId>,
    /// Unknown-shape documents left alone for operator review.
    pub needs_review: Vec<DocumentFailure>,
}

impl ReconcileReport {
    pub fn had_conflict(&self) -> bool {
        self.prior_active_conflict.len() > 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub migrated: Vec<DocumentId>,
    pub already_canonical: usize,
    pub needs_review: Vec<DocumentFailure>,
    pub failed: Vec<DocumentFailure>,
}

#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub deleted: u64,
    pub created: DocumentId,
}
