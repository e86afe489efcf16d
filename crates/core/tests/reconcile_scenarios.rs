use serde_json::{json, Value};
use site_content_core::content::CanonicalBuilder;
use site_content_core::document::{DocumentId, SiteContentDocument};
use site_content_core::reconcile::{ReconcileError, Reconciler};
use site_content_core::schema::{classify, classify_payload, Shape};
use site_content_core::store::{DocumentStore, MemoryStore};

fn legacy_payload() -> Value {
    json!({
        "companyInfo": { "name": "IICPA" },
        "footerLinks": {
            "courses": [
                { "name": "CPA US", "href": "/courses/cpa-us" },
                { "name": "ACCA", "href": "/courses/acca" }
            ],
            "resources": [
                { "name": "Blog", "href": "/blog" }
            ]
        }
    })
}

fn link_list(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({ "name": format!("Link {i}"), "href": format!("/link-{i}") }))
            .collect(),
    )
}

/// Everything that matters about a collection, timestamps aside.
fn state(store: &MemoryStore) -> Vec<(DocumentId, bool, Value)> {
    store
        .snapshot()
        .into_iter()
        .map(|d: SiteContentDocument| (d.id, d.is_active, d.payload))
        .collect()
}

fn active_count(store: &MemoryStore) -> usize {
    store.snapshot().iter().filter(|d| d.is_active).count()
}

#[tokio::test]
async fn scenario_a_legacy_document_becomes_canonical_and_active() {
    let store = MemoryStore::new("footers");
    let first = store.seed(json!({ "companyInfo": {} }), false);
    let legacy = store.seed(legacy_payload(), false);
    let last = store.seed(json!({ "footerLinks": { "randomKey": [] } }), false);

    let builder = CanonicalBuilder::default();
    let report = Reconciler::new(&store, &builder).run().await.unwrap();

    assert_eq!(report.active, legacy);
    assert!(!report.inserted);
    assert!(!report.had_conflict());

    let docs = store.snapshot();
    let rewritten = docs.iter().find(|d| d.id == legacy).unwrap();
    assert!(rewritten.is_active);
    assert_eq!(classify_payload(&rewritten.payload), Shape::Canonical);
    let links = &rewritten.payload["footerLinks"];
    assert_eq!(links["companyPolicies"].as_array().unwrap().len(), 4);
    assert_eq!(links["generalLinks"].as_array().unwrap().len(), 6);

    for other in [first, last] {
        let doc = docs.iter().find(|d| d.id == other).unwrap();
        assert!(!doc.is_active);
    }
    // Both untouched documents are of unknown shape and get flagged.
    assert_eq!(report.needs_review.len(), 2);
}

#[tokio::test]
async fn scenario_b_multiple_active_is_reported_then_repaired() {
    let store = MemoryStore::new("footers");
    let a = store.seed(legacy_payload(), true);
    let b = store.seed(legacy_payload(), true);

    let builder = CanonicalBuilder::default();
    let reconciler = Reconciler::new(&store, &builder);

    assert!(matches!(
        reconciler.verify().await,
        Err(ReconcileError::MultipleActiveDocuments { ref ids }) if ids == &vec![a, b]
    ));

    let report = reconciler.run().await.unwrap();
    assert!(report.had_conflict());
    assert_eq!(report.prior_active_conflict, vec![a, b]);
    assert_eq!(report.active, a);
    assert_eq!(active_count(&store), 1);

    let rerun = reconciler.run().await.unwrap();
    assert!(!rerun.had_conflict());
    assert!(rerun.unchanged);
    assert_eq!(reconciler.verify().await.unwrap(), a);
}

#[tokio::test]
async fn scenario_c_empty_collection_gets_one_canonical_document() {
    let store = MemoryStore::new("footers");
    let builder = CanonicalBuilder::default();

    let report = Reconciler::new(&store, &builder).run().await.unwrap();

    assert!(report.inserted);
    let docs = store.snapshot();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, report.active);
    assert!(docs[0].is_active);
    assert_eq!(docs[0].payload, builder.build_payload().unwrap());
}

#[test]
fn scenario_d_classification() {
    let canonical = json!({ "companyPolicies": link_list(4), "generalLinks": link_list(6) });
    assert_eq!(classify(&canonical), Shape::Canonical);

    let legacy = json!({ "courses": link_list(2) });
    assert!(matches!(classify(&legacy), Shape::Legacy { .. }));

    let random = json!({ "randomKey": [] });
    assert!(matches!(classify(&random), Shape::Unknown(_)));
}

#[tokio::test]
async fn running_twice_matches_running_once() {
    let starts: Vec<Vec<(Value, bool)>> = vec![
        vec![],
        vec![(legacy_payload(), false)],
        vec![(legacy_payload(), true), (legacy_payload(), true)],
        vec![
            (json!({ "footerLinks": { "randomKey": [] } }), true),
            (legacy_payload(), false),
        ],
        vec![(json!({ "footerLinks": { "randomKey": [] } }), false)],
    ];
    let builder = CanonicalBuilder::default();

    for start in starts {
        let store = MemoryStore::new("footers");
        for (payload, active) in &start {
            store.seed(payload.clone(), *active);
        }
        let reconciler = Reconciler::new(&store, &builder);

        reconciler.run().await.unwrap();
        let once = state(&store);
        let timestamps: Vec<_> = store.snapshot().iter().map(|d| d.updated_at).collect();

        let second = reconciler.run().await.unwrap();
        assert!(second.unchanged);
        assert_eq!(state(&store), once);
        let after: Vec<_> = store.snapshot().iter().map(|d| d.updated_at).collect();
        assert_eq!(after, timestamps, "a rerun writes nothing");
        assert_eq!(active_count(&store), 1);
    }
}

#[tokio::test]
async fn explicit_missing_target_fails_without_writing() {
    let store = MemoryStore::new("footers");
    store.seed(legacy_payload(), true);
    let before = store.snapshot();

    let builder = CanonicalBuilder::default();
    let missing = DocumentId::generate();
    let err = Reconciler::new(&store, &builder)
        .enforce_single_active(Some(missing))
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(id) if id == missing));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn explicit_target_is_activated_even_if_another_is_live() {
    let store = MemoryStore::new("footers");
    let live = store.seed(legacy_payload(), true);
    let chosen = store.seed(json!({ "footerLinks": { "randomKey": [] } }), false);

    let builder = CanonicalBuilder::default();
    let report = Reconciler::new(&store, &builder)
        .enforce_single_active(Some(chosen))
        .await
        .unwrap();

    assert_eq!(report.active, chosen);
    assert_eq!(report.deactivated, 1);
    let live_doc = store.find_one(&site_content_core::store::Filter::Id(live)).await.unwrap().unwrap();
    assert!(!live_doc.is_active);
    assert_eq!(live_doc.payload, legacy_payload());
}
