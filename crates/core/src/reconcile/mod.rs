//! Single-active reconciliation of a content collection.
//!
//! A run scans the collection, classifies every document, rewrites the
//! chosen target with the canonical payload while deactivating the rest,
//! and finally re-reads the collection to verify exactly one document is
//! active.

pub mod error;
pub mod plan;
pub mod report;

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::content::CanonicalBuilder;
use crate::document::{DocumentId, SiteContentDocument};
use crate::schema::Shape;
use crate::store::{DocumentStore, DocumentUpdate, StoreError, SwapTarget};

pub use error::ReconcileError;
pub use plan::{choose_target, scan_documents, Plan, ScannedDocument};
pub use report::{CleanupReport, DocumentFailure, MigrationReport, ReconcileReport};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Reconciler<'a> {
    store: &'a dyn DocumentStore,
    builder: &'a CanonicalBuilder,
    timeout: Duration,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn DocumentStore, builder: &'a CanonicalBuilder) -> Self {
        Self {
            store,
            builder,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound every store operation by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ReconcileError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(ReconcileError::from),
            Err(_) => Err(ReconcileError::Timeout {
                op,
                timeout: self.timeout,
            }),
        }
    }

    async fn load(&self) -> Result<Vec<SiteContentDocument>, ReconcileError> {
        let docs = self.bounded("find_all", self.store.find_all()).await?;
        tracing::debug!(
            collection = self.store.collection(),
            documents = docs.len(),
            "scanned collection"
        );
        Ok(docs)
    }

    /// Classify every document in the collection.
    pub async fn scan(&self) -> Result<Vec<ScannedDocument>, ReconcileError> {
        Ok(scan_documents(&self.load().await?))
    }

    /// Work out what [`Reconciler::enforce_single_active`] would do, without writing.
    pub async fn plan(&self, target: Option<DocumentId>) -> Result<Plan, ReconcileError> {
        let docs = self.load().await?;
        self.plan_for(&docs, target)
    }

    fn plan_for(
        &self,
        docs: &[SiteContentDocument],
        target: Option<DocumentId>,
    ) -> Result<Plan, ReconcileError> {
        let swap_target = match target {
            Some(id) if docs.iter().any(|d| d.id == id) => SwapTarget::Existing(id),
            Some(id) => return Err(ReconcileError::NotFound(id)),
            None => match choose_target(&scan_documents(docs)) {
                Some(id) => SwapTarget::Existing(id),
                None => SwapTarget::Insert,
            },
        };
        Ok(Plan::build(docs, swap_target, self.builder.build_payload()?))
    }

    /// Full reconciliation with automatic target selection.
    pub async fn run(&self) -> Result<ReconcileReport, ReconcileError> {
        self.enforce_single_active(None).await
    }

    /// Make `target` (or the automatically chosen document, or a freshly
    /// inserted one) the only active document, carrying the canonical payload.
    ///
    /// A missing explicit target fails with [`ReconcileError::NotFound`]
    /// before anything is written.
    pub async fn enforce_single_active(
        &self,
        target: Option<DocumentId>,
    ) -> Result<ReconcileReport, ReconcileError> {
        let collection = self.store.collection().to_string();
        let docs = self.load().await?;
        let plan = self.plan_for(&docs, target)?;

        let needs_review = review_unknown(&collection, &plan.scanned);

        let prior_active = plan.active_ids();
        if prior_active.len() > 1 {
            let conflict = ReconcileError::MultipleActiveDocuments {
                ids: prior_active.clone(),
            };
            tracing::error!(
                collection = %collection,
                error = %conflict,
                "collection violated the single-active invariant before this run"
            );
        }

        let (active, inserted, deactivated, unchanged) = match plan.target {
            SwapTarget::Existing(id) if plan.is_noop() => {
                tracing::info!(collection = %collection, document = %id, "already reconciled");
                (id, false, 0, true)
            }
            _ => {
                let outcome = self
                    .bounded("swap_active", self.store.swap_active(plan.target, &plan.canonical))
                    .await?;
                tracing::info!(
                    collection = %collection,
                    document = %outcome.id,
                    inserted = outcome.inserted,
                    deactivated = outcome.deactivated,
                    "activated canonical document"
                );
                (outcome.id, outcome.inserted, outcome.deactivated, false)
            }
        };

        self.verify().await?;

        Ok(ReconcileReport {
            collection,
            scanned: plan.scanned,
            active,
            inserted,
            unchanged,
            deactivated,
            prior_active_conflict: if prior_active.len() > 1 {
                prior_active
            } else {
                Vec::new()
            },
            needs_review,
        })
    }

    /// Re-read the collection and require exactly one active document.
    pub async fn verify(&self) -> Result<DocumentId, ReconcileError> {
        let active: Vec<DocumentId> = self
            .load()
            .await?
            .into_iter()
            .filter(|d| d.is_active)
            .map(|d| d.id)
            .collect();
        match active.as_slice() {
            [id] => Ok(*id),
            [] => Err(ReconcileError::NoActiveDocument),
            _ => Err(ReconcileError::MultipleActiveDocuments { ids: active }),
        }
    }

    /// Rewrite every legacy document to the canonical payload without
    /// touching active flags.
    ///
    /// Per-document failures are recorded and the batch continues; connection
    /// failures and timeouts abort it.
    pub async fn migrate_legacy(&self) -> Result<MigrationReport, ReconcileError> {
        let collection = self.store.collection().to_string();
        let canonical = self.builder.build_payload()?;
        let docs = self.load().await?;
        let scanned = scan_documents(&docs);

        let mut report = MigrationReport {
            needs_review: review_unknown(&collection, &scanned),
            ..MigrationReport::default()
        };

        for doc in &scanned {
            match &doc.shape {
                Shape::Canonical => report.already_canonical += 1,
                Shape::Unknown(_) => {}
                Shape::Legacy { deprecated_keys } => {
                    match self.rewrite(doc.id, canonical.clone()).await {
                        Ok(()) => {
                            tracing::info!(
                                collection = %collection,
                                document = %doc.id,
                                deprecated_keys = ?deprecated_keys,
                                "migrated legacy document"
                            );
                            report.migrated.push(doc.id);
                        }
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(err) => {
                            tracing::warn!(
                                collection = %collection,
                                document = %doc.id,
                                error = %err,
                                "failed to migrate document, continuing"
                            );
                            report.failed.push(DocumentFailure {
                                id: doc.id,
                                reason: err.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    async fn rewrite(&self, id: DocumentId, payload: Value) -> Result<(), ReconcileError> {
        let found = self
            .bounded(
                "update_one",
                self.store.update_one(id, &DocumentUpdate::payload(payload)),
            )
            .await?;
        if found {
            Ok(())
        } else {
            Err(ReconcileError::NotFound(id))
        }
    }

    /// Delete the whole collection and recreate one canonical active document.
    ///
    /// Runs as one atomic store operation, so a failure leaves the collection as it was.
    pub async fn cleanup(&self) -> Result<CleanupReport, ReconcileError> {
        let canonical = self.builder.build_payload()?;
        let (deleted, created) = self
            .bounded("replace_all", self.store.replace_all(&canonical))
            .await?;
        tracing::info!(
            collection = self.store.collection(),
            deleted,
            document = %created.id,
            "recreated collection"
        );
        self.verify().await?;
        Ok(CleanupReport {
            deleted,
            created: created.id,
        })
    }
}

fn review_unknown(collection: &str, scanned: &[ScannedDocument]) -> Vec<DocumentFailure> {
    scanned
        .iter()
        .filter_map(|doc| match &doc.shape {
            Shape::Unknown(reason) => {
                let err = ReconcileError::ClassificationUnknown {
                    id: doc.id,
                    reason: reason.clone(),
                };
                tracing::warn!(collection, document = %doc.id, error = %err, "skipping document");
                Some(DocumentFailure {
                    id: doc.id,
                    reason: err.to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn verify_reports_each_violation() {
        let store = MemoryStore::new("footers");
        let builder = CanonicalBuilder::default();
        let reconciler = Reconciler::new(&store, &builder);

        assert!(matches!(
            reconciler.verify().await,
            Err(ReconcileError::NoActiveDocument)
        ));

        let a = store.seed(json!({}), true);
        assert_eq!(reconciler.verify().await.unwrap(), a);

        let b = store.seed(json!({}), true);
        match reconciler.verify().await {
            Err(ReconcileError::MultipleActiveDocuments { ids }) => assert_eq!(ids, vec![a, b]),
            other => panic!("expected MultipleActiveDocuments, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plan_does_not_write() {
        let store = MemoryStore::new("footers");
        let legacy = store.seed(json!({ "footerLinks": { "courses": [] } }), false);
        let builder = CanonicalBuilder::default();
        let before = store.snapshot();

        let plan = Reconciler::new(&store, &builder).plan(None).await.unwrap();
        assert_eq!(plan.target, SwapTarget::Existing(legacy));
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn migrate_legacy_continues_past_rejected_document() {
        let store = MemoryStore::new("footers");
        let legacy = json!({ "footerLinks": { "courses": [], "resources": [] } });
        let first = store.seed(legacy.clone(), false);
        let stuck = store.seed(legacy.clone(), true);
        let last = store.seed(legacy, false);
        let odd = store.seed(json!({ "footerLinks": { "randomKey": [] } }), false);
        store.reject_writes_to(stuck);

        let builder = CanonicalBuilder::default();
        let report = Reconciler::new(&store, &builder)
            .migrate_legacy()
            .await
            .unwrap();

        assert_eq!(report.migrated, vec![first, last]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, stuck);
        assert_eq!(report.needs_review.len(), 1);
        assert_eq!(report.needs_review[0].id, odd);

        let docs = store.snapshot();
        assert!(docs[1].is_active, "active flags are left alone");
        assert_eq!(docs[0].payload, builder.build_payload().unwrap());
    }

    #[tokio::test]
    async fn cleanup_leaves_one_canonical_document() {
        let store = MemoryStore::new("footers");
        store.seed(json!({ "footerLinks": { "courses": [] } }), true);
        store.seed(json!({}), true);
        store.seed(json!({}), false);

        let builder = CanonicalBuilder::default();
        let report = Reconciler::new(&store, &builder).cleanup().await.unwrap();

        assert_eq!(report.deleted, 3);
        let docs = store.snapshot();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, report.created);
        assert!(docs[0].is_active);
        assert!(crate::schema::classify_payload(&docs[0].payload).is_canonical());
    }

    #[test]
    fn fatal_errors_are_connection_level_or_timeouts() {
        let timeout = ReconcileError::Timeout {
            op: "find_all",
            timeout: DEFAULT_STORE_TIMEOUT,
        };
        assert!(timeout.is_fatal());
        assert!(ReconcileError::Store(StoreError::Database(sqlx::Error::PoolClosed)).is_fatal());
        assert!(!ReconcileError::NotFound(DocumentId::generate()).is_fatal());
        assert!(!ReconcileError::Store(StoreError::Rejected {
            id: DocumentId::generate(),
            reason: "read-only".into(),
        })
        .is_fatal());
    }
}
