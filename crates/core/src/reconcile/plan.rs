use chrono::{DateTime, Utc};
use serde_json::Value;
use similar::TextDiff;

use crate::document::{DocumentId, SiteContentDocument};
use crate::schema::{classify_payload, link_keys, Shape};
use crate::store::SwapTarget;

/// One document as seen by a scan: classified once, never re-classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedDocument {
    pub id: DocumentId,
    pub is_active: bool,
    pub shape: Shape,
    pub link_keys: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl ScannedDocument {
    pub fn from_document(doc: &SiteContentDocument) -> Self {
        Self {
            id: doc.id,
            is_active: doc.is_active,
            shape: classify_payload(&doc.payload),
            link_keys: link_keys(&doc.payload),
            updated_at: doc.updated_at,
        }
    }
}

pub fn scan_documents(docs: &[SiteContentDocument]) -> Vec<ScannedDocument> {
    docs.iter().map(ScannedDocument::from_document).collect()
}

/// Pick the document a reconciliation run rewrites, in scan order:
/// an active document of known shape, else the first legacy one, else the
/// first canonical one. Unknown shapes are never picked.
pub fn choose_target(scanned: &[ScannedDocument]) -> Option<DocumentId> {
    let known = |d: &&ScannedDocument| !matches!(d.shape, Shape::Unknown(_));
    scanned
        .iter()
        .filter(known)
        .find(|d| d.is_active)
        .or_else(|| {
            scanned
                .iter()
                .find(|d| matches!(d.shape, Shape::Legacy { .. }))
        })
        .or_else(|| scanned.iter().find(|d| d.shape.is_canonical()))
        .map(|d| d.id)
}

/// What a reconciliation would do, computed without writing.
#[derive(Debug, Clone)]
pub struct Plan {
    pub scanned: Vec<ScannedDocument>,
    pub target: SwapTarget,
    /// Current payload of the target; `None` when a document will be inserted.
    pub current_payload: Option<Value>,
    pub canonical: Value,
}

impl Plan {
    pub fn build(docs: &[SiteContentDocument], target: SwapTarget, canonical: Value) -> Self {
        let current_payload = match target {
            SwapTarget::Existing(id) => docs.iter().find(|d| d.id == id).map(|d| d.payload.clone()),
            SwapTarget::Insert => None,
        };
        Self {
            scanned: scan_documents(docs),
            target,
            current_payload,
            canonical,
        }
    }

    pub fn active_ids(&self) -> Vec<DocumentId> {
        self.scanned
            .iter()
            .filter(|d| d.is_active)
            .map(|d| d.id)
            .collect()
    }

    /// Active documents other than the target; these get deactivated.
    pub fn to_deactivate(&self) -> Vec<DocumentId> {
        let keep = match self.target {
            SwapTarget::Existing(id) => Some(id),
            SwapTarget::Insert => None,
        };
        self.active_ids()
            .into_iter()
            .filter(|id| Some(*id) != keep)
            .collect()
    }

    /// The target is already the sole active document and already canonical.
    pub fn is_noop(&self) -> bool {
        match self.target {
            SwapTarget::Existing(id) => {
                self.active_ids() == [id] && self.current_payload.as_ref() == Some(&self.canonical)
            }
            SwapTarget::Insert => false,
        }
    }

    /// Unified line diff of the target payload against the canonical one.
    pub fn payload_diff(&self) -> String {
        let before = self
            .current_payload
            .as_ref()
            .map(pretty)
            .unwrap_or_default();
        let after = pretty(&self.canonical);
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .context_radius(2)
            .header("stored", "canonical")
            .to_string()
    }
}

fn pretty(value: &Value) -> String {
    let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    out.push('\n');
    out
}
