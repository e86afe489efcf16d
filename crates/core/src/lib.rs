//! Reconciliation of singleton site-content documents.
//!
//! - [`schema`] classifies a stored document's link structure.
//! - [`content`] builds the canonical payload from an institute profile.
//! - [`reconcile`] enforces that exactly one document is active and canonical.
//! - [`store`] is the document store protocol and its implementations.

pub mod content;
pub mod document;
pub mod reconcile;
pub mod schema;
pub mod store;
