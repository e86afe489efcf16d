use site_content_core::reconcile::ReconcileError;
use site_content_core::store::StoreError;

use crate::config::ConfigError;

/// Failure of a CLI invocation. Every variant exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to database `{database}`: {source}")]
    Connection {
        database: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(
        "collection `{collection}` had {count} active documents before this run; \
         it was repaired, but the cause needs investigating"
    )]
    ActiveConflict { collection: String, count: usize },
}

impl CliError {
    /// Short tag printed in front of the message.
    pub fn error_type(&self) -> &'static str {
        match self {
            CliError::Config(_) => "config",
            CliError::Connection { .. } => "connection",
            CliError::Store(_) => "store",
            CliError::Reconcile(err) => match err {
                ReconcileError::NotFound(_) => "notFound",
                ReconcileError::Timeout { .. } => "timeout",
                ReconcileError::MultipleActiveDocuments { .. } => "multipleActiveDocuments",
                ReconcileError::NoActiveDocument => "noActiveDocument",
                ReconcileError::ClassificationUnknown { .. } => "classificationUnknown",
                ReconcileError::Store(_) => "store",
                ReconcileError::Payload(_) => "payload",
            },
            CliError::ActiveConflict { .. } => "multipleActiveDocuments",
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
