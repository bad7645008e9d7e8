//! GET /collections — visibility-filtered product listing.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde_json::Value;

use herbcat_core::query::{build_product_query, ListParams};

use crate::middleware::{Caller, RequestId};

use super::super::{map_db_error, ApiError, ApiResponse, AppState};
use super::product_json;

pub(in crate::api) async fn list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Value>>>, ApiError> {
    let query = build_product_query(&params, caller.is_admin);

    let records = herbcat_db::list_products(&state.pool, &query)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    let projection = query.projection.as_ref();
    let data: Vec<Value> = records
        .into_iter()
        .map(|record| product_json(record, projection))
        .collect();

    Ok(Json(ApiResponse::ok("products fetched", data)))
}
