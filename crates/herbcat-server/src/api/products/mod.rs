//! Catalog API handlers, mounted at `/collections` (path kept from the
//! original storefront for client compatibility):
//!
//! - `POST   /collections`                         — create (admin)
//! - `GET    /collections`                         — list (visibility-filtered)
//! - `GET    /collections/:idOrSlug`               — detail
//! - `PUT    /collections/:id`                     — update (admin)
//! - `DELETE /collections/:id`                     — delete (admin)
//! - `POST   /collections/:id/upload-image`        — image upload (admin)
//! - `POST   /collections/:id/generate-pdf`        — brochure generation (admin)
//! - `DELETE /collections/:id/pdf`                 — brochure deletion (admin)
//! - `GET    /collections/:id/download-brochure`   — brochure download

mod brochure;
mod detail;
mod list;
mod upload;
mod write;

use std::collections::BTreeSet;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use herbcat_core::product::{Faq, UsageStep};
use herbcat_core::query::apply_projection;
use herbcat_db::ProductRecord;

use super::AppState;

pub(super) fn router(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list::list).post(write::create))
        .route(
            "/{id_or_slug}",
            get(detail::detail).put(write::update).delete(write::delete),
        )
        .route(
            "/{id}/upload-image",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_max_bytes)),
        )
        .route("/{id}/generate-pdf", post(brochure::generate))
        .route("/{id}/pdf", delete(brochure::delete_brochure))
        .route("/{id}/download-brochure", get(brochure::download))
}

/// Parse a path id that must be numeric (routes that do not accept a
/// slug).
fn numeric_id(raw: &str) -> Result<i64, super::ApiError> {
    raw.parse::<i64>()
        .map_err(|_| super::ApiError::bad_request("product id must be numeric"))
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CategoryBody {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Wire form of a stored product: the flattened record with the
/// category reference expanded into its display fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub(super) struct ProductBody {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub description: String,
    pub category: CategoryBody,
    pub brand_or_formulator: String,
    pub price: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub net_quantity: Decimal,
    pub shelf_life: String,
    pub form: String,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub preview_video: Option<String>,
    pub usage_guide: Vec<UsageStep>,
    pub ingredients: Vec<String>,
    pub health_benefits: Vec<String>,
    pub precautions: Vec<String>,
    pub target_audience: Vec<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub faqs: Vec<Faq>,
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

impl From<ProductRecord> for ProductBody {
    fn from(record: ProductRecord) -> Self {
        let product = record.product;
        Self {
            id: product.id,
            title: product.title,
            slug: product.slug,
            short_description: product.short_description,
            description: product.description,
            category: CategoryBody {
                id: product.category_id,
                name: record.category_name,
                slug: record.category_slug,
            },
            brand_or_formulator: product.brand_or_formulator,
            price: product.price,
            original_price: product.original_price,
            is_free: product.is_free,
            net_quantity: product.net_quantity,
            shelf_life: product.shelf_life,
            form: product.form,
            image: product.image,
            thumbnail: product.thumbnail,
            preview_video: product.preview_video,
            usage_guide: product.usage_guide.0,
            ingredients: product.ingredients,
            health_benefits: product.health_benefits,
            precautions: product.precautions,
            target_audience: product.target_audience,
            tags: product.tags,
            keywords: product.keywords,
            faqs: product.faqs.0,
            is_published: product.is_published,
            show_on_home: product.show_on_home,
            is_featured: product.is_featured,
            prescription_required: product.prescription_required,
            enrollment_count: product.enrollment_count,
            average_rating: product.average_rating,
            total_reviews: product.total_reviews,
            meta_title: product.meta_title,
            meta_description: product.meta_description,
            brochure_url: product.brochure_url,
            brochure_generated_at: product.brochure_generated_at,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Serialize a record for the wire, optionally restricted to a
/// projected field set (`id` always survives).
pub(super) fn product_json(record: ProductRecord, projection: Option<&BTreeSet<String>>) -> Value {
    let mut value = serde_json::to_value(ProductBody::from(record)).unwrap_or(Value::Null);
    if let Some(fields) = projection {
        apply_projection(&mut value, fields);
    }
    value
}
