//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use herbcat_core::product::{Faq, NormalizedProduct, UsageStep};
use herbcat_core::query::{Direction, ProductQuery, PublishFilter};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{categories, escape_like, translate_write_error, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table, as stored.
///
/// This is the mutable hydrate used by write paths; read responses use
/// [`ProductRecord`], which flattens the category reference in.
#[derive(Debug, Clone, sqlx::FromRow)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: String,
    pub category_id: i64,
    pub brand_or_formulator: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub net_quantity: Decimal,
    pub shelf_life: String,
    /// Stored and served as TEXT; `Form` constrains the value on the
    /// write path only.
    pub form: String,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub preview_video: Option<String>,
    pub usage_guide: Json<Vec<UsageStep>>,
    pub ingredients: Vec<String>,
    pub health_benefits: Vec<String>,
    pub precautions: Vec<String>,
    pub target_audience: Vec<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub faqs: Json<Vec<Faq>>,
    pub is_published: bool,
    pub show_on_home: bool,
    pub is_featured: bool,
    pub prescription_required: bool,
    pub enrollment_count: i32,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub brochure_url: Option<String>,
    pub brochure_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flattened read-only projection: the product row plus the referenced
/// category's display fields, joined in a single query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRecord {
    #[sqlx(flatten)]
    pub product: ProductRow,
    pub category_name: String,
    pub category_slug: String,
}

/// A path identifier that may be a numeric store id or a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrSlug {
    Id(i64),
    Slug(String),
}

impl IdOrSlug {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>()
            .map_or_else(|_| Self::Slug(raw.to_string()), Self::Id)
    }
}

const PRODUCT_RECORD_COLUMNS: &str = "p.id, p.title, p.slug, p.short_description, p.description, \
     p.category_id, p.brand_or_formulator, p.price, p.original_price, p.is_free, \
     p.net_quantity, p.shelf_life, p.form, p.image, p.thumbnail, p.preview_video, \
     p.usage_guide, p.ingredients, p.health_benefits, p.precautions, p.target_audience, \
     p.tags, p.keywords, p.faqs, p.is_published, p.show_on_home, p.is_featured, \
     p.prescription_required, p.enrollment_count, p.average_rating, p.total_reviews, \
     p.meta_title, p.meta_description, p.brochure_url, p.brochure_generated_at, \
     p.created_at, p.updated_at, c.name AS category_name, c.slug AS category_slug";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert a normalized product and return the stored record.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] on a slug collision,
/// [`DbError::InvalidReference`] when the category id does not exist,
/// or [`DbError::Sqlx`] on other failures.
pub async fn create_product(
    pool: &PgPool,
    product: &NormalizedProduct,
) -> Result<ProductRecord, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (title, slug, short_description, description, category_id, \
              brand_or_formulator, price, original_price, is_free, net_quantity, \
              shelf_life, form, image, thumbnail, preview_video, usage_guide, \
              ingredients, health_benefits, precautions, target_audience, tags, \
              keywords, faqs, is_published, show_on_home, is_featured, \
              prescription_required, meta_title, meta_description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                 $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, \
                 $21, $22, $23, $24, $25, $26, $27, $28, $29) \
         RETURNING id",
    )
    .bind(&product.title)
    .bind(&product.slug)
    .bind(&product.short_description)
    .bind(&product.description)
    .bind(product.category_id)
    .bind(&product.brand_or_formulator)
    .bind(product.price)
    .bind(product.original_price)
    .bind(product.is_free)
    .bind(product.net_quantity)
    .bind(&product.shelf_life)
    .bind(product.form.as_str())
    .bind(&product.image)
    .bind(&product.thumbnail)
    .bind(&product.preview_video)
    .bind(Json(&product.usage_guide))
    .bind(&product.ingredients)
    .bind(&product.health_benefits)
    .bind(&product.precautions)
    .bind(&product.target_audience)
    .bind(&product.tags)
    .bind(&product.keywords)
    .bind(Json(&product.faqs))
    .bind(product.is_published)
    .bind(product.show_on_home)
    .bind(product.is_featured)
    .bind(product.prescription_required)
    .bind(&product.meta_title)
    .bind(&product.meta_description)
    .fetch_one(pool)
    .await
    .map_err(translate_write_error)?;

    get_product(pool, &IdOrSlug::Id(id))
        .await?
        .ok_or(DbError::NotFound)
}

/// Replace all normalized fields of an existing product.
///
/// The slug arrives recomputed from the (possibly changed) title, so
/// the derive-on-write invariant holds without any ORM-style hook.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the id misses, plus the same
/// constraint translations as [`create_product`].
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    product: &NormalizedProduct,
) -> Result<ProductRecord, DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             title = $1, slug = $2, short_description = $3, description = $4, \
             category_id = $5, brand_or_formulator = $6, price = $7, \
             original_price = $8, is_free = $9, net_quantity = $10, \
             shelf_life = $11, form = $12, image = $13, thumbnail = $14, \
             preview_video = $15, usage_guide = $16, ingredients = $17, \
             health_benefits = $18, precautions = $19, target_audience = $20, \
             tags = $21, keywords = $22, faqs = $23, is_published = $24, \
             show_on_home = $25, is_featured = $26, prescription_required = $27, \
             meta_title = $28, meta_description = $29, updated_at = NOW() \
         WHERE id = $30",
    )
    .bind(&product.title)
    .bind(&product.slug)
    .bind(&product.short_description)
    .bind(&product.description)
    .bind(product.category_id)
    .bind(&product.brand_or_formulator)
    .bind(product.price)
    .bind(product.original_price)
    .bind(product.is_free)
    .bind(product.net_quantity)
    .bind(&product.shelf_life)
    .bind(product.form.as_str())
    .bind(&product.image)
    .bind(&product.thumbnail)
    .bind(&product.preview_video)
    .bind(Json(&product.usage_guide))
    .bind(&product.ingredients)
    .bind(&product.health_benefits)
    .bind(&product.precautions)
    .bind(&product.target_audience)
    .bind(&product.tags)
    .bind(&product.keywords)
    .bind(Json(&product.faqs))
    .bind(product.is_published)
    .bind(product.show_on_home)
    .bind(product.is_featured)
    .bind(product.prescription_required)
    .bind(&product.meta_title)
    .bind(&product.meta_description)
    .bind(id)
    .execute(pool)
    .await
    .map_err(translate_write_error)?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    get_product(pool, &IdOrSlug::Id(id))
        .await?
        .ok_or(DbError::NotFound)
}

/// Delete a product row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no row matches.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Set the brochure metadata fields together.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the id misses.
pub async fn set_brochure(
    pool: &PgPool,
    id: i64,
    brochure_url: &str,
    generated_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE products SET brochure_url = $1, brochure_generated_at = $2 WHERE id = $3")
            .bind(brochure_url)
            .bind(generated_at)
            .bind(id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Clear both brochure metadata fields in one statement, so a deleted
/// file never leaves a dangling reference behind.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the id misses.
pub async fn clear_brochure(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET brochure_url = NULL, brochure_generated_at = NULL WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch the bare product row by id (no category join). Write paths
/// use this before mutating.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_row(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch the flattened product record by store id or slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(
    pool: &PgPool,
    id_or_slug: &IdOrSlug,
) -> Result<Option<ProductRecord>, DbError> {
    let record = match id_or_slug {
        IdOrSlug::Id(id) => {
            let sql = product_record_sql("p.id = $1");
            sqlx::query_as::<_, ProductRecord>(&sql)
                .bind(*id)
                .fetch_optional(pool)
                .await?
        }
        IdOrSlug::Slug(slug) => {
            let sql = product_record_sql("p.slug = $1");
            sqlx::query_as::<_, ProductRecord>(&sql)
                .bind(slug)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(record)
}

/// SQL for a single flattened record fetch with the given WHERE filter.
fn product_record_sql(filter: &str) -> String {
    format!(
        "SELECT {PRODUCT_RECORD_COLUMNS} \
         FROM products p JOIN categories c ON c.id = p.category_id \
         WHERE {filter}"
    )
}

/// List products for the given store query.
///
/// The free-text search cannot match the referenced category's name
/// from the products table alone, so matching category ids are
/// resolved in a first pass and OR'd into the filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn list_products(
    pool: &PgPool,
    query: &ProductQuery,
) -> Result<Vec<ProductRecord>, DbError> {
    let search_category_ids = match &query.search {
        Some(term) => categories::search_category_ids(pool, term).await?,
        None => Vec::new(),
    };

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {PRODUCT_RECORD_COLUMNS} \
         FROM products p JOIN categories c ON c.id = p.category_id \
         WHERE TRUE"
    ));

    match query.publish {
        PublishFilter::PublishedOnly => {
            qb.push(" AND p.is_published = TRUE");
        }
        PublishFilter::Only(state) => {
            qb.push(" AND p.is_published = ");
            qb.push_bind(state);
        }
        PublishFilter::Any => {}
    }

    if let Some(category_id) = query.category_id {
        qb.push(" AND p.category_id = ");
        qb.push_bind(category_id);
    }

    if let Some(price) = query.price {
        qb.push(" AND p.price = ");
        qb.push_bind(price);
    }

    if let Some(show_on_home) = query.show_on_home {
        qb.push(" AND p.show_on_home = ");
        qb.push_bind(show_on_home);
    }

    if let Some(ref term) = query.search {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (p.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.brand_or_formulator ILIKE ");
        qb.push_bind(pattern);
        if !search_category_ids.is_empty() {
            qb.push(" OR p.category_id = ANY(");
            qb.push_bind(search_category_ids);
            qb.push(")");
        }
        qb.push(")");
    }

    qb.push(" ORDER BY ");
    for (index, (field, direction)) in query.sort.iter().enumerate() {
        if index > 0 {
            qb.push(", ");
        }
        // Column names come from the SortField allow-list, never from input.
        qb.push("p.");
        qb.push(field.column());
        qb.push(match direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    let rows = qb
        .build_query_as::<ProductRecord>()
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
