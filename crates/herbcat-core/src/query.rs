//! Visibility & Query Builder: turns list/detail request parameters
//! into a store-level filter, sort order, field projection, and limit.
//!
//! No I/O happens here; `herbcat-db` consumes the resulting
//! [`ProductQuery`] and the server applies projections to serialized
//! records.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_LIMIT_CAP: i64 = 200;

/// Fields every detail response must carry regardless of the caller's
/// `fields` selection. Reconciled by union, so a caller can widen but
/// never narrow below this set.
const DETAIL_REQUIRED_FIELDS: &[&str] = &[
    "id",
    "title",
    "slug",
    "price",
    "originalPrice",
    "isFree",
    "image",
    "thumbnail",
    "category",
    "isPublished",
];

/// Raw query-string parameters of `GET /collections`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub category: Option<i64>,
    /// Legacy alias for `isPublished`: `active` / `draft`.
    pub status: Option<String>,
    pub fields: Option<String>,
    pub all: Option<bool>,
    pub search: Option<String>,
    pub show_on_home: Option<bool>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub is_published: Option<bool>,
    pub price: Option<Decimal>,
}

/// Publish-state constraint applied to a read query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishFilter {
    /// Non-admin callers are always pinned here.
    PublishedOnly,
    /// Admin asked for an explicit publish state.
    Only(bool),
    /// Admin asked for everything.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sortable fields, allow-listed so arbitrary column names never reach
/// the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Price,
    NetQuantity,
    EnrollmentCount,
    AverageRating,
    TotalReviews,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "price" => Some(Self::Price),
            "netQuantity" => Some(Self::NetQuantity),
            "enrollmentCount" => Some(Self::EnrollmentCount),
            "averageRating" => Some(Self::AverageRating),
            "totalReviews" => Some(Self::TotalReviews),
            _ => None,
        }
    }

    /// Postgres column backing this sort field.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Price => "price",
            Self::NetQuantity => "net_quantity",
            Self::EnrollmentCount => "enrollment_count",
            Self::AverageRating => "average_rating",
            Self::TotalReviews => "total_reviews",
        }
    }
}

/// Store-level read query produced by [`build_product_query`].
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub publish: PublishFilter,
    pub category_id: Option<i64>,
    /// Exact price match, kept for source compatibility.
    pub price: Option<Decimal>,
    pub show_on_home: Option<bool>,
    pub search: Option<String>,
    pub sort: Vec<(SortField, Direction)>,
    pub projection: Option<BTreeSet<String>>,
    pub limit: Option<i64>,
}

/// Build the store query for a list request.
///
/// The visibility rule is the only part that consults the caller:
/// a non-admin can never see unpublished products, whatever other
/// parameters say.
#[must_use]
pub fn build_product_query(params: &ListParams, caller_is_admin: bool) -> ProductQuery {
    let requested_publish = params.is_published.or_else(|| status_alias(params));

    let publish = visibility(requested_publish, params.all.unwrap_or(false), caller_is_admin);

    ProductQuery {
        publish,
        category_id: params.category,
        price: params.price,
        show_on_home: params.show_on_home,
        search: params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string),
        sort: parse_sort(params.sort.as_deref()),
        projection: parse_fields(params.fields.as_deref()),
        limit: params.limit.map(|l| l.clamp(1, DEFAULT_LIMIT_CAP)),
    }
}

/// Resolve the publish filter from the explicit request and the
/// caller's capability.
#[must_use]
pub fn visibility(
    requested_publish: Option<bool>,
    all: bool,
    caller_is_admin: bool,
) -> PublishFilter {
    if caller_is_admin {
        if let Some(wanted) = requested_publish {
            return PublishFilter::Only(wanted);
        }
        if all {
            return PublishFilter::Any;
        }
    }
    PublishFilter::PublishedOnly
}

fn status_alias(params: &ListParams) -> Option<bool> {
    match params.status.as_deref().map(str::trim) {
        Some("active") => Some(true),
        Some("draft") => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated sort spec (`"-price,title"`) into ordered
/// field/direction pairs. Unknown field names are ignored; an empty
/// result falls back to `createdAt` descending.
#[must_use]
pub fn parse_sort(spec: Option<&str>) -> Vec<(SortField, Direction)> {
    let mut sorts = Vec::new();
    for entry in spec.unwrap_or_default().split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, direction) = entry
            .strip_prefix('-')
            .map_or((entry, Direction::Asc), |n| (n, Direction::Desc));
        if let Some(field) = SortField::parse(name) {
            sorts.push((field, direction));
        }
    }
    if sorts.is_empty() {
        sorts.push((SortField::CreatedAt, Direction::Desc));
    }
    sorts
}

/// Parse a comma-separated field list into a projection set.
/// Blank input yields `None` (full record).
#[must_use]
pub fn parse_fields(spec: Option<&str>) -> Option<BTreeSet<String>> {
    let fields: BTreeSet<String> = spec
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Projection for the single-item detail fetch: the caller's requested
/// fields unioned with the curated required set. `None` (no `fields`
/// param) keeps the full record.
#[must_use]
pub fn detail_projection(requested: Option<BTreeSet<String>>) -> Option<BTreeSet<String>> {
    requested.map(|mut fields| {
        fields.extend(DETAIL_REQUIRED_FIELDS.iter().map(ToString::to_string));
        fields
    })
}

/// Restrict a serialized record to the projected fields. `id` is
/// always retained even when omitted from the selection.
pub fn apply_projection(record: &mut Value, fields: &BTreeSet<String>) {
    if let Value::Object(map) = record {
        map.retain(|key, _| key == "id" || fields.contains(key));
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
