//! Catalog Store: Postgres persistence for products and the read-only
//! category collaborator.
//!
//! All queries are runtime-bound (`query_as`/`QueryBuilder`); the
//! schema lives in `<workspace-root>/migrations/` and is embedded via
//! `sqlx::migrate!`.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use thiserror::Error;

mod categories;
mod products;

pub use categories::{list_categories, search_category_ids, upsert_category, CategoryRow};
pub use products::{
    clear_brochure, create_product, delete_product, get_product, get_product_row, list_products,
    set_brochure, update_product, IdOrSlug, ProductRecord, ProductRow,
};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/herbcat-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &herbcat_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

/// Domain error taxonomy for store operations. Postgres error codes
/// are translated here so callers never match on raw SQLSTATEs.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("duplicate value for unique field '{field}'")]
    UniqueViolation { field: String },
    #[error("reference to missing {field}")]
    InvalidReference { field: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Translate constraint violations raised by a write into the domain
/// taxonomy. Unique violations (23505) surface the offending field via
/// the constraint name; foreign-key violations (23503) currently only
/// involve the category reference.
fn translate_write_error(error: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = error {
        match db_err.code().as_deref() {
            Some("23505") => {
                let field = match db_err.constraint() {
                    Some("products_slug_key") => "slug",
                    Some("categories_name_key") => "name",
                    Some("categories_slug_key") => "slug",
                    _ => "unknown",
                };
                return DbError::UniqueViolation {
                    field: field.to_string(),
                };
            }
            Some("23503") => {
                return DbError::InvalidReference {
                    field: "category".to_string(),
                }
            }
            _ => {}
        }
    }
    DbError::Sqlx(error)
}

/// Escape LIKE metacharacters so a search term is matched literally.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` from env.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if `DATABASE_URL` is unset, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    connect_pool(&database_url, PoolConfig::default())
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database;
    // treat absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(applied_before);

    Ok(usize::try_from(applied_after - applied_before).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("100%_pure\\"), "100\\%\\_pure\\\\");
        assert_eq!(escape_like("tulsi"), "tulsi");
    }
}
