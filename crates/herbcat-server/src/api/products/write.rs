//! Product write handlers: create, update, delete.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;

use herbcat_core::{normalize, NormalizeMode, RawProductPayload};
use herbcat_db::IdOrSlug;

use crate::brochure;
use crate::middleware::{Caller, RequestId};

use super::super::{ensure_admin, map_db_error, ApiError, ApiResponse, AppState};
use super::{numeric_id, product_json};

/// POST /collections — create a product from a raw admin payload.
pub(in crate::api) async fn create(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<RawProductPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ApiError> {
    ensure_admin(caller)?;

    let product =
        normalize(&payload, NormalizeMode::Create).map_err(|errors| ApiError::validation(&errors))?;

    let record = herbcat_db::create_product(&state.pool, &product)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    tracing::info!(request_id = %req_id.0, product_id = record.product.id, slug = %record.product.slug, "product created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "product created",
            product_json(record, None),
        )),
    ))
}

/// PUT /collections/:id — full replace of the normalized fields.
///
/// The slug is re-derived from the submitted title inside the
/// normalizer, so a title change can never leave a stale slug.
pub(in crate::api) async fn update(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    Json(payload): Json<RawProductPayload>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    ensure_admin(caller)?;
    let id = numeric_id(&raw_id)?;

    let product =
        normalize(&payload, NormalizeMode::Update).map_err(|errors| ApiError::validation(&errors))?;

    let record = herbcat_db::update_product(&state.pool, id, &product)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    tracing::info!(request_id = %req_id.0, product_id = id, "product updated");

    Ok(Json(ApiResponse::ok(
        "product updated",
        product_json(record, None),
    )))
}

/// DELETE /collections/:id — remove a product and its brochure file.
pub(in crate::api) async fn delete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    ensure_admin(caller)?;
    let id = numeric_id(&raw_id)?;

    let record = herbcat_db::get_product(&state.pool, &IdOrSlug::Id(id))
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    herbcat_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    // The row is gone; the file cleanup is best-effort.
    if let Some(ref url) = record.product.brochure_url {
        brochure::remove_file_best_effort(&state.config, url).await;
    }

    tracing::info!(request_id = %req_id.0, product_id = id, "product deleted");

    Ok(Json(ApiResponse::ok("product deleted", Value::Null)))
}
