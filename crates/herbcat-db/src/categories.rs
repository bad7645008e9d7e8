//! Database operations for the `categories` table.
//!
//! Categories are managed elsewhere; the catalog reads them for
//! reference resolution and search, and the CLI seeds them.

use chrono::{DateTime, Utc};
use herbcat_core::categories::CategoryConfig;
use sqlx::PgPool;

use crate::{escape_like, translate_write_error, DbError};

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Returns all categories, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the ids of categories whose name contains the search term
/// (case-insensitive). Used by the product list search to OR category
/// matches into a single-collection filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_category_ids(pool: &PgPool, term: &str) -> Result<Vec<i64>, DbError> {
    let pattern = format!("%{}%", escape_like(term));
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name ILIKE $1")
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Insert or refresh a category from the seed taxonomy, keyed by name.
///
/// Returns the category id.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the derived slug collides
/// with a differently named category, or [`DbError::Sqlx`] otherwise.
pub async fn upsert_category(pool: &PgPool, category: &CategoryConfig) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, slug, description) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (name) DO UPDATE SET \
             slug = EXCLUDED.slug, \
             description = EXCLUDED.description \
         RETURNING id",
    )
    .bind(&category.name)
    .bind(category.slug())
    .bind(&category.description)
    .fetch_one(pool)
    .await
    .map_err(translate_write_error)?;

    Ok(id)
}
