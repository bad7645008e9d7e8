//! GET /categories — read-only taxonomy listing, used by the admin UI
//! to resolve category ids for product payloads.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CategoryItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<herbcat_db::CategoryRow> for CategoryItem {
    fn from(row: herbcat_db::CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let rows = herbcat_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    let data: Vec<CategoryItem> = rows.into_iter().map(CategoryItem::from).collect();
    Ok(Json(ApiResponse::ok("categories fetched", data)))
}
