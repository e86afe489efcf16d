use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{DocumentStore, DocumentUpdate, Filter, StoreError, SwapOutcome, SwapTarget};
use crate::document::model::DocumentRow;
use crate::document::{DocumentId, NewDocument, SiteContentDocument};

const COLUMNS: &str = "id, collection, payload, is_active, created_at, updated_at";

/// Matches [`Filter`] through two binds: `$2` (optional id) and `$3` (active only).
const FILTER_CLAUSE: &str =
    "collection = $1 AND ($2::uuid IS NULL OR id = $2) AND (NOT $3::boolean OR is_active)";

/// PostgreSQL-backed store. Documents of every collection share the
/// `site_content_documents` table; this handle only sees its own collection.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    collection: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Serialize writers of this collection until `tx` ends.
    async fn lock_collection(&self, tx: &mut Transaction<'_, Postgres>) -> Result<(), StoreError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(&self.collection)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Release every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn find_all(&self) -> Result<Vec<SiteContentDocument>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM site_content_documents \
             WHERE collection = $1 ORDER BY created_at, id"
        ))
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SiteContentDocument::from).collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<SiteContentDocument>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM site_content_documents \
             WHERE {FILTER_CLAUSE} ORDER BY created_at, id LIMIT 1"
        ))
        .bind(&self.collection)
        .bind(filter.id().map(|id| id.as_uuid()))
        .bind(filter.only_active())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SiteContentDocument::from))
    }

    async fn update_many(
        &self,
        filter: &Filter,
        update: &DocumentUpdate,
    ) -> Result<u64, StoreError> {
        if update.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(&format!(
            "UPDATE site_content_documents \
             SET is_active = COALESCE($4, is_active), \
                 payload = COALESCE($5, payload), \
                 updated_at = now() \
             WHERE {FILTER_CLAUSE}"
        ))
        .bind(&self.collection)
        .bind(filter.id().map(|id| id.as_uuid()))
        .bind(filter.only_active())
        .bind(update.is_active)
        .bind(update.payload.clone().map(Json))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_one(
        &self,
        id: DocumentId,
        update: &DocumentUpdate,
    ) -> Result<bool, StoreError> {
        if update.is_empty() {
            return Ok(self.find_one(&Filter::Id(id)).await?.is_some());
        }
        let touched = self.update_many(&Filter::Id(id), update).await?;
        Ok(touched > 0)
    }

    async fn insert_one(&self, doc: NewDocument) -> Result<SiteContentDocument, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO site_content_documents (id, collection, payload, is_active) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(DocumentId::generate().as_uuid())
        .bind(&self.collection)
        .bind(Json(doc.payload))
        .bind(doc.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!(
            "DELETE FROM site_content_documents WHERE {FILTER_CLAUSE}"
        ))
        .bind(&self.collection)
        .bind(filter.id().map(|id| id.as_uuid()))
        .bind(filter.only_active())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Runs both steps in one transaction under a collection-scoped advisory
    /// lock, so concurrent runs serialize instead of double-activating or
    /// double-inserting.
    async fn swap_active(
        &self,
        target: SwapTarget,
        payload: &Value,
    ) -> Result<SwapOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        self.lock_collection(&mut tx).await?;

        let keep = match target {
            SwapTarget::Existing(id) => {
                let exists: Option<(Uuid,)> = sqlx::query_as(
                    "SELECT id FROM site_content_documents \
                     WHERE collection = $1 AND id = $2 FOR UPDATE",
                )
                .bind(&self.collection)
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
                if exists.is_none() {
                    tx.rollback().await?;
                    return Err(StoreError::NotFound(id));
                }
                Some(id)
            }
            SwapTarget::Insert => {
                let live: Option<(Uuid,)> = sqlx::query_as(
                    "SELECT id FROM site_content_documents \
                     WHERE collection = $1 AND is_active AND payload = $2 \
                     ORDER BY created_at, id LIMIT 1",
                )
                .bind(&self.collection)
                .bind(Json(payload))
                .fetch_optional(&mut *tx)
                .await?;
                live.map(|(id,)| DocumentId::from_uuid(id))
            }
        };

        let deactivated = sqlx::query(
            "UPDATE site_content_documents SET is_active = FALSE, updated_at = now() \
             WHERE collection = $1 AND is_active",
        )
        .bind(&self.collection)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let outcome = match keep {
            Some(id) => {
                sqlx::query(
                    "UPDATE site_content_documents \
                     SET is_active = TRUE, payload = $3, updated_at = now() \
                     WHERE collection = $1 AND id = $2",
                )
                .bind(&self.collection)
                .bind(id.as_uuid())
                .bind(Json(payload))
                .execute(&mut *tx)
                .await?;
                SwapOutcome {
                    id,
                    inserted: false,
                    deactivated,
                }
            }
            None => {
                let id = DocumentId::generate();
                sqlx::query(
                    "INSERT INTO site_content_documents (id, collection, payload, is_active) \
                     VALUES ($1, $2, $3, TRUE)",
                )
                .bind(id.as_uuid())
                .bind(&self.collection)
                .bind(Json(payload))
                .execute(&mut *tx)
                .await?;
                SwapOutcome {
                    id,
                    inserted: true,
                    deactivated,
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Delete and insert share one transaction; a failed insert rolls the
    /// delete back.
    async fn replace_all(
        &self,
        payload: &Value,
    ) -> Result<(u64, SiteContentDocument), StoreError> {
        let mut tx = self.pool.begin().await?;
        self.lock_collection(&mut tx).await?;

        let deleted = sqlx::query("DELETE FROM site_content_documents WHERE collection = $1")
            .bind(&self.collection)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO site_content_documents (id, collection, payload, is_active) \
             VALUES ($1, $2, $3, TRUE) RETURNING {COLUMNS}"
        ))
        .bind(DocumentId::generate().as_uuid())
        .bind(&self.collection)
        .bind(Json(payload))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((deleted, row.into()))
    }
}
