//! GET /collections/:idOrSlug — single product fetch.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use herbcat_core::query::{detail_projection, parse_fields};
use herbcat_db::IdOrSlug;

use crate::middleware::{Caller, RequestId};

use super::super::{map_db_error, ApiError, ApiResponse, AppState};
use super::product_json;

#[derive(Debug, Deserialize)]
pub(in crate::api) struct DetailParams {
    pub fields: Option<String>,
}

pub(in crate::api) async fn detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(id_or_slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let lookup = IdOrSlug::parse(&id_or_slug);

    let record = herbcat_db::get_product(&state.pool, &lookup)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    // Unpublished products are invisible to public callers; a 404 keeps
    // their existence unknowable.
    if !record.product.is_published && !caller.is_admin {
        return Err(ApiError::not_found("product not found"));
    }

    let projection = detail_projection(parse_fields(params.fields.as_deref()));

    Ok(Json(ApiResponse::ok(
        "product fetched",
        product_json(record, projection.as_ref()),
    )))
}
