use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use site_content_core::content::{InstituteProfile, ProfileError};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// Used when `DATABASE_URL` is unset. Deliberately names no database.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432";
pub const DEFAULT_COLLECTION: &str = "footers";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("DATABASE_URL is not a valid PostgreSQL URL: {0}")]
    InvalidDatabaseUrl(#[source] sqlx::Error),

    #[error("DATABASE_NAME must be set when DATABASE_URL does not name a database")]
    MissingDatabaseName,

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Tool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Target database. Always explicit: from `DATABASE_NAME` or the URL path.
    pub database_name: String,
    /// Collection the tool operates on.
    pub collection: String,
    /// Optional JSON institute profile; the reference profile otherwise.
    pub profile_path: Option<PathBuf>,
    /// Upper bound for each store operation and for acquiring a connection.
    pub store_timeout: Duration,
    pub db_max_connections: u32,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let url_options =
            PgConnectOptions::from_str(&database_url).map_err(ConfigError::InvalidDatabaseUrl)?;
        let database_name = lookup("DATABASE_NAME")
            .filter(|name| !name.trim().is_empty())
            .or_else(|| url_options.get_database().map(str::to_string))
            .ok_or(ConfigError::MissingDatabaseName)?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "`text` or `json`",
                })
            }
        };

        Ok(Self {
            database_url,
            database_name,
            collection: lookup("CONTENT_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            profile_path: lookup("INSTITUTE_PROFILE").map(PathBuf::from),
            store_timeout: Duration::from_secs(parse_var(
                &lookup,
                "STORE_TIMEOUT_SECS",
                10,
                "a whole number of seconds",
            )?),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 2, "a valid u32")?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }

    /// Connection options with the target database applied.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        Ok(PgConnectOptions::from_str(&self.database_url)?.database(&self.database_name))
    }

    pub fn load_profile(&self) -> Result<InstituteProfile, ConfigError> {
        match &self.profile_path {
            Some(path) => Ok(InstituteProfile::from_json_file(path)?),
            None => Ok(InstituteProfile::reference()),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}
