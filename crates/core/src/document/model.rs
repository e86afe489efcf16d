use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::id::DocumentId;

/// A singleton content document (footer, banner, ...) as seen by the tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContentDocument {
    pub id: DocumentId,
    pub collection: String,
    /// Nested content stored as JSONB. Its shape is inferred, never stored.
    pub payload: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the caller when inserting. Id and timestamps come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub payload: Value,
    pub is_active: bool,
}

/// Database row representation of a document.
/// Maps to the `site_content_documents` PostgreSQL table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub collection: String,
    pub payload: sqlx::types::Json<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for SiteContentDocument {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: DocumentId::from_uuid(row.id),
            collection: row.collection,
            payload: row.payload.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
