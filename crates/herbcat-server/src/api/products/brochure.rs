//! Brochure endpoints: generate, delete, download.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use herbcat_db::IdOrSlug;

use crate::brochure;
use crate::middleware::{Caller, RequestId};

use super::super::{
    ensure_admin, internal_error, map_db_error, ApiError, ApiResponse, AppState, ErrorCode,
};
use super::numeric_id;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct BrochureData {
    pub file_url: String,
    pub filename: String,
}

/// POST /collections/:id/generate-pdf — render and store a brochure.
///
/// The previously referenced file (if any) is removed before the new
/// one is written, so regeneration never leaves orphans on disk.
pub(in crate::api) async fn generate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<BrochureData>>, ApiError> {
    ensure_admin(caller)?;
    let id = numeric_id(&raw_id)?;

    let record = herbcat_db::get_product(&state.pool, &IdOrSlug::Id(id))
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    let bytes = brochure::render_brochure(&record)
        .map_err(|e| internal_error(&state, &req_id.0, "brochure rendering failed", &e))?;

    if let Some(ref previous) = record.product.brochure_url {
        brochure::remove_file_best_effort(&state.config, previous).await;
    }

    let dir = brochure::brochures_dir(&state.config);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| internal_error(&state, &req_id.0, "failed to create brochures directory", &e))?;

    let filename = brochure::brochure_filename(&record.product.slug);
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(|e| internal_error(&state, &req_id.0, "failed to write brochure file", &e))?;

    let file_url = brochure::public_media_url(&state.config, "brochures", &filename);
    herbcat_db::set_brochure(&state.pool, id, &file_url, Utc::now())
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    tracing::info!(request_id = %req_id.0, product_id = id, %filename, "brochure generated");

    Ok(Json(ApiResponse::ok(
        "brochure generated",
        BrochureData { file_url, filename },
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct DeleteBrochureRequest {
    pub file_url: Option<String>,
}

/// DELETE /collections/:id/pdf — remove the brochure file and clear
/// the product's brochure metadata.
pub(in crate::api) async fn delete_brochure(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    Json(body): Json<DeleteBrochureRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    ensure_admin(caller)?;
    let id = numeric_id(&raw_id)?;

    let file_url = body
        .file_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::field(ErrorCode::Validation, "fileUrl", "fileUrl is required"))?;
    reqwest::Url::parse(&file_url).map_err(|_| {
        ApiError::field(ErrorCode::Validation, "fileUrl", "fileUrl must be a valid URL")
    })?;

    let record = herbcat_db::get_product(&state.pool, &IdOrSlug::Id(id))
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    // The submitted URL must match the stored one; otherwise the caller
    // is pointing at a file this product does not own.
    if record.product.brochure_url.as_deref() != Some(file_url.as_str()) {
        return Err(ApiError::not_found("brochure file not found for this product"));
    }

    let filename = brochure::filename_from_url(&file_url).ok_or_else(|| {
        ApiError::field(
            ErrorCode::Validation,
            "fileUrl",
            "fileUrl does not reference a brochure file",
        )
    })?;

    let path = brochure::brochures_dir(&state.config).join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        // Missing file: leave the product untouched so the mismatch is
        // visible rather than silently papered over.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("brochure file not found"));
        }
        Err(e) => {
            return Err(internal_error(
                &state,
                &req_id.0,
                "failed to remove brochure file",
                &e,
            ));
        }
    }

    herbcat_db::clear_brochure(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?;

    tracing::info!(request_id = %req_id.0, product_id = id, %filename, "brochure deleted");

    Ok(Json(ApiResponse::ok("brochure deleted", Value::Null)))
}

/// GET /collections/:id/download-brochure — stream the stored PDF.
///
/// Public endpoint; unpublished products stay invisible to non-admin
/// callers just like the detail route.
pub(in crate::api) async fn download(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(id_or_slug): Path<String>,
) -> Result<Response, ApiError> {
    let lookup = IdOrSlug::parse(&id_or_slug);

    let record = herbcat_db::get_product(&state.pool, &lookup)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    if !record.product.is_published && !caller.is_admin {
        return Err(ApiError::not_found("product not found"));
    }

    let file_url = record
        .product
        .brochure_url
        .ok_or_else(|| ApiError::not_found("no brochure for this product"))?;
    let filename = brochure::filename_from_url(&file_url)
        .ok_or_else(|| ApiError::not_found("brochure file not found"))?;

    let path = brochure::brochures_dir(&state.config).join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("brochure file not found"));
        }
        Err(e) => {
            return Err(internal_error(
                &state,
                &req_id.0,
                "failed to read brochure file",
                &e,
            ));
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}
