use site_content_core::content::{CanonicalBuilder, ProfileError};
use site_content_core::reconcile::Reconciler;
use site_content_core::store::{PgDocumentStore, StoreError};
use sqlx::postgres::PgPoolOptions;

use crate::config::{AppConfig, ConfigError};
use crate::error::{CliError, CliResult};

/// Store handle and builder for one invocation.
///
/// Opened once at start-up; [`Session::close`] must run on every exit path.
pub struct Session {
    store: PgDocumentStore,
    builder: CanonicalBuilder,
    config: AppConfig,
}

impl Session {
    /// Validate the profile, connect, and apply migrations.
    pub async fn open(config: AppConfig) -> CliResult<Self> {
        let builder = CanonicalBuilder::new(config.load_profile()?)
            .map_err(|err| ConfigError::from(ProfileError::Invalid(err)))?;

        let connection_error = |source: StoreError| CliError::Connection {
            database: config.database_name.clone(),
            source,
        };

        let options = config
            .connect_options()
            .map_err(|err| connection_error(err.into()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.store_timeout)
            .connect_with(options)
            .await
            .map_err(|err| connection_error(err.into()))?;

        tracing::info!(
            database = %config.database_name,
            collection = %config.collection,
            "connected to PostgreSQL"
        );

        let store = PgDocumentStore::new(pool, config.collection.clone());
        if let Err(err) = store.migrate().await {
            store.close().await;
            return Err(err.into());
        }

        Ok(Self {
            store,
            builder,
            config,
        })
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.store, &self.builder).with_timeout(self.config.store_timeout)
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub async fn close(self) {
        self.store.close().await;
        tracing::debug!("store connection closed");
    }
}
