//! POST /collections/:id/upload-image — multipart image intake.
//!
//! Stores the file under `<media_root>/uploads/` with a random name
//! and returns where it landed. Attaching the URL to a product is the
//! client's follow-up via the update endpoint.

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::brochure::uploads_dir;
use crate::middleware::{Caller, RequestId};

use super::super::{ensure_admin, internal_error, map_db_error, ApiError, ApiResponse, AppState};
use super::numeric_id;

const IMAGE_FIELD: &str = "image";

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct UploadData {
    pub path: String,
    pub url: String,
}

pub(in crate::api) async fn upload_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    ensure_admin(caller)?;
    let id = numeric_id(&raw_id)?;

    herbcat_db::get_product_row(&state.pool, id)
        .await
        .map_err(|e| map_db_error(&state, &req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("product not found"))?;

    let mut saved = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart payload: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .ok_or_else(|| ApiError::bad_request("image field must declare a content type"))?;
        let extension = extension_for_mime(&content_type).ok_or_else(|| {
            ApiError::bad_request("unsupported image type; expected JPEG, PNG, WebP, or GIF")
        })?;

        // Body-limit overruns surface here as a multipart read error.
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("uploaded image is empty"));
        }

        let dir = uploads_dir(&state.config);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| internal_error(&state, &req_id.0, "failed to create uploads directory", &e))?;

        let filename = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(dir.join(&filename), &data)
            .await
            .map_err(|e| internal_error(&state, &req_id.0, "failed to write uploaded image", &e))?;

        tracing::info!(
            request_id = %req_id.0,
            product_id = id,
            %filename,
            bytes = data.len(),
            "image uploaded"
        );

        let path = format!("/files/uploads/{filename}");
        let url = format!("{}{path}", state.config.public_base_url);
        saved = Some(UploadData { path, url });
        break;
    }

    let data = saved.ok_or_else(|| {
        ApiError::bad_request(format!("multipart field '{IMAGE_FIELD}' is required"))
    })?;

    Ok(Json(ApiResponse::ok("image uploaded", data)))
}
