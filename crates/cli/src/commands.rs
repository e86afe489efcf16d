use std::fmt::Write;

use site_content_core::document::DocumentId;
use site_content_core::reconcile::{
    CleanupReport, DocumentFailure, MigrationReport, Plan, ReconcileReport, ScannedDocument,
};
use site_content_core::store::SwapTarget;

use crate::error::{CliError, CliResult};
use crate::session::Session;

/// Default command: pick a target automatically, or use `target`.
pub async fn reconcile(
    session: &Session,
    target: Option<DocumentId>,
    dry_run: bool,
) -> CliResult<()> {
    let reconciler = session.reconciler();
    if dry_run {
        let plan = reconciler.plan(target).await?;
        print!("{}", render_plan(session.collection(), &plan));
        return Ok(());
    }

    let report = reconciler.enforce_single_active(target).await?;
    print!("{}", render_reconcile(&report));
    if report.had_conflict() {
        return Err(CliError::ActiveConflict {
            collection: report.collection,
            count: report.prior_active_conflict.len(),
        });
    }
    Ok(())
}

pub async fn inspect(session: &Session) -> CliResult<()> {
    let scanned = session.reconciler().scan().await?;
    print!("{}", render_scan(session.collection(), &scanned));
    Ok(())
}

pub async fn migrate_legacy(session: &Session) -> CliResult<()> {
    let report = session.reconciler().migrate_legacy().await?;
    print!("{}", render_migration(session.collection(), &report));
    Ok(())
}

pub async fn cleanup(session: &Session, confirmed: bool) -> CliResult<()> {
    let reconciler = session.reconciler();
    if !confirmed {
        let scanned = reconciler.scan().await?;
        println!(
            "cleanup would delete {} document(s) from `{}` and create one canonical active document",
            scanned.len(),
            session.collection()
        );
        println!("rerun with --yes to proceed");
        return Ok(());
    }
    let report = reconciler.cleanup().await?;
    print!("{}", render_cleanup(session.collection(), &report));
    Ok(())
}

pub async fn verify(session: &Session) -> CliResult<()> {
    let active = session.reconciler().verify().await?;
    println!("`{}`: exactly one active document ({active})", session.collection());
    Ok(())
}

pub fn render_scan(collection: &str, scanned: &[ScannedDocument]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "`{collection}`: {} document(s)", scanned.len());
    for doc in scanned {
        let keys = if doc.link_keys.is_empty() {
            "-".to_string()
        } else {
            doc.link_keys.join(", ")
        };
        let _ = writeln!(
            out,
            "  {}  {:<8}  {:<9}  keys: {keys}  updated {}",
            doc.id,
            if doc.is_active { "active" } else { "inactive" },
            doc.shape.label(),
            doc.updated_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    out
}

pub fn render_plan(collection: &str, plan: &Plan) -> String {
    let mut out = render_scan(collection, &plan.scanned);
    if plan.is_noop() {
        let _ = writeln!(out, "nothing to do: target is already the only active canonical document");
        return out;
    }
    match plan.target {
        SwapTarget::Existing(id) => {
            let _ = writeln!(out, "would rewrite and activate {id}");
        }
        SwapTarget::Insert => {
            let _ = writeln!(out, "would insert a new canonical active document");
        }
    }
    for id in plan.to_deactivate() {
        let _ = writeln!(out, "would deactivate {id}");
    }
    let diff = plan.payload_diff();
    if !diff.is_empty() {
        out.push_str(&diff);
    }
    out
}

pub fn render_reconcile(report: &ReconcileReport) -> String {
    let mut out = render_scan(&report.collection, &report.scanned);
    if report.unchanged {
        let _ = writeln!(
            out,
            "already reconciled: {} is the only active canonical document",
            report.active
        );
    } else if report.inserted {
        let _ = writeln!(
            out,
            "inserted canonical document {} and activated it ({} deactivated)",
            report.active, report.deactivated
        );
    } else {
        let _ = writeln!(
            out,
            "rewrote {} with the canonical payload and activated it ({} deactivated)",
            report.active, report.deactivated
        );
    }
    if report.had_conflict() {
        let _ = writeln!(
            out,
            "WARNING: {} documents were active before this run",
            report.prior_active_conflict.len()
        );
    }
    write_failures(&mut out, "needs review", &report.needs_review);
    out
}

pub fn render_migration(collection: &str, report: &MigrationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "`{collection}`: migrated {}, already canonical {}, needs review {}, failed {}",
        report.migrated.len(),
        report.already_canonical,
        report.needs_review.len(),
        report.failed.len()
    );
    for id in &report.migrated {
        let _ = writeln!(out, "  migrated {id}");
    }
    write_failures(&mut out, "needs review", &report.needs_review);
    write_failures(&mut out, "failed", &report.failed);
    out
}

pub fn render_cleanup(collection: &str, report: &CleanupReport) -> String {
    format!(
        "`{collection}`: deleted {} document(s), created canonical active document {}\n",
        report.deleted, report.created
    )
}

fn write_failures(out: &mut String, label: &str, failures: &[DocumentFailure]) {
    for failure in failures {
        let _ = writeln!(out, "  {label}: {}", failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use site_content_core::content::CanonicalBuilder;
    use site_content_core::reconcile::Reconciler;
    use site_content_core::store::MemoryStore;

    #[tokio::test]
    async fn reconcile_summary_names_target_and_review_items() {
        let store = MemoryStore::new("footers");
        let legacy = store.seed(json!({ "footerLinks": { "courses": [] } }), false);
        store.seed(json!({ "footerLinks": { "randomKey": [] } }), false);
        let builder = CanonicalBuilder::default();

        let report = Reconciler::new(&store, &builder).run().await.unwrap();
        let text = render_reconcile(&report);

        assert!(text.starts_with("`footers`: 2 document(s)\n"));
        assert!(text.contains(&format!("rewrote {legacy} with the canonical payload")));
        assert!(text.contains("needs review: document"));
        assert!(!text.contains("WARNING"));
    }

    #[tokio::test]
    async fn scan_lists_shape_and_keys() {
        let store = MemoryStore::new("footers");
        store.seed(json!({ "footerLinks": { "courses": [], "resources": [] } }), true);
        let builder = CanonicalBuilder::default();

        let scanned = Reconciler::new(&store, &builder).scan().await.unwrap();
        let text = render_scan("footers", &scanned);
        assert!(text.contains("active    legacy"));
        assert!(text.contains("keys: courses, resources"));
    }

    #[tokio::test]
    async fn dry_run_plan_shows_diff_and_deactivations() {
        let store = MemoryStore::new("footers");
        let legacy = store.seed(json!({ "footerLinks": { "courses": [] } }), true);
        let other = store.seed(json!({ "footerLinks": { "resources": [] } }), true);
        let builder = CanonicalBuilder::default();

        let plan = Reconciler::new(&store, &builder).plan(None).await.unwrap();
        let text = render_plan("footers", &plan);
        assert!(text.contains(&format!("would rewrite and activate {legacy}")));
        assert!(text.contains(&format!("would deactivate {other}")));
        assert!(text.contains("+++ canonical"));
    }

    #[test]
    fn migration_summary_counts() {
        let report = MigrationReport {
            migrated: vec![DocumentId::generate()],
            already_canonical: 2,
            needs_review: Vec::new(),
            failed: vec![DocumentFailure {
                id: DocumentId::generate(),
                reason: "write rejected".into(),
            }],
        };
        let text = render_migration("footers", &report);
        assert!(text.starts_with(
            "`footers`: migrated 1, already canonical 2, needs review 0, failed 1\n"
        ));
        assert!(text.contains("  failed: write rejected"));
    }
}
