mod categories;
mod products;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use herbcat_core::{AppConfig, Environment, FieldError, ValidationErrors};

use crate::middleware::{identify_caller, request_id, AdminAuthState, Caller, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

/// Unified response envelope. Lists, details, and mutations all use
/// the same shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Error taxonomy of the REST surface, mapped onto HTTP status codes
/// in [`IntoResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    DuplicateKey,
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    code: ErrorCode,
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            message: message.into(),
            errors: None,
        }
    }

    /// Full validation failure set from the normalizer, returned in
    /// one pass so the caller can fix everything in a single round trip.
    pub fn validation(errors: &ValidationErrors) -> Self {
        Self {
            code: ErrorCode::Validation,
            success: false,
            message: "validation failed".to_string(),
            errors: Some(errors.as_slice().to_vec()),
        }
    }

    pub fn field(code: ErrorCode, field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code,
            success: false,
            message: message.clone(),
            errors: Some(vec![FieldError {
                field: field.to_string(),
                message,
            }]),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, "admin access required")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            ErrorCode::Validation | ErrorCode::DuplicateKey | ErrorCode::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Reject non-admin callers on admin-only operations.
pub(super) fn ensure_admin(caller: Caller) -> Result<(), ApiError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

/// Translate store errors into the API taxonomy. Unexpected failures
/// are logged with the request id; the response stays generic outside
/// production debugging.
pub(super) fn map_db_error(state: &AppState, request_id: &str, error: &herbcat_db::DbError) -> ApiError {
    match error {
        herbcat_db::DbError::NotFound => ApiError::not_found("product not found"),
        herbcat_db::DbError::UniqueViolation { field } => ApiError::field(
            ErrorCode::DuplicateKey,
            field,
            format!("a product with that {field} already exists"),
        ),
        herbcat_db::DbError::InvalidReference { field } => ApiError::field(
            ErrorCode::Validation,
            field,
            format!("{field} does not reference an existing record"),
        ),
        other => {
            tracing::error!(request_id, error = %other, "database operation failed");
            if state.config.env == Environment::Production {
                ApiError::new(ErrorCode::Internal, "internal server error")
            } else {
                ApiError::new(ErrorCode::Internal, format!("internal server error: {other}"))
            }
        }
    }
}

/// Internal failure outside the store (rendering, filesystem). Same
/// logging and detail gating as [`map_db_error`].
pub(super) fn internal_error(
    state: &AppState,
    request_id: &str,
    context: &str,
    error: &dyn std::fmt::Display,
) -> ApiError {
    tracing::error!(request_id, error = %error, "{context}");
    if state.config.env == Environment::Production {
        ApiError::new(ErrorCode::Internal, "internal server error")
    } else {
        ApiError::new(ErrorCode::Internal, format!("internal server error: {error}"))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "health check query failed");
            "unreachable"
        }
    };

    Json(ApiResponse::ok(
        "ok",
        HealthData {
            status: "ok",
            database,
        },
    ))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState, auth: AdminAuthState) -> Router {
    let media_root = state.config.media_root.clone();
    let upload_max_bytes = state.config.upload_max_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/categories", get(categories::list))
        .nest("/collections", products::router(upload_max_bytes))
        .nest_service("/files", ServeDir::new(media_root))
        .layer(axum::middleware::from_fn_with_state(auth, identify_caller))
        .layer(axum::middleware::from_fn(request_id))
        .layer(build_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::products::product_json;
    use super::*;
    use chrono::Utc;
    use herbcat_core::product::UsageStep;
    use rust_decimal::Decimal;
    use sqlx::types::Json as SqlxJson;

    fn make_record() -> herbcat_db::ProductRecord {
        herbcat_db::ProductRecord {
            product: herbcat_db::ProductRow {
                id: 7,
                title: "Ashwagandha Tablets".to_string(),
                slug: "ashwagandha-tablets".to_string(),
                short_description: Some("Daily stress support".to_string()),
                description: "Full-spectrum root extract in tablet form.".to_string(),
                category_id: 3,
                brand_or_formulator: "Himalaya Labs".to_string(),
                price: Decimal::new(150, 0),
                original_price: Decimal::new(200, 0),
                is_free: false,
                net_quantity: Decimal::new(60, 0),
                shelf_life: "24 months".to_string(),
                form: "tablet".to_string(),
                image: None,
                thumbnail: None,
                preview_video: None,
                usage_guide: SqlxJson(vec![UsageStep {
                    order: 1,
                    title: "How to use".to_string(),
                    description: "Take with warm water after meals.".to_string(),
                    duration_label: String::new(),
                    steps: vec![],
                }]),
                ingredients: vec!["Ashwagandha root extract".to_string()],
                health_benefits: vec![],
                precautions: vec![],
                target_audience: vec![],
                tags: vec![],
                keywords: vec![],
                faqs: SqlxJson(vec![]),
                is_published: true,
                show_on_home: false,
                is_featured: false,
                prescription_required: false,
                enrollment_count: 0,
                average_rating: Decimal::ZERO,
                total_reviews: 0,
                meta_title: None,
                meta_description: None,
                brochure_url: None,
                brochure_generated_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            category_name: "Stress & Sleep".to_string(),
            category_slug: "stress-sleep".to_string(),
        }
    }

    #[test]
    fn api_error_statuses_follow_the_taxonomy() {
        use axum::response::IntoResponse;

        let errors = ValidationErrors::default();
        assert_eq!(
            ApiError::validation(&errors).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::field(ErrorCode::DuplicateKey, "slug", "taken")
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::bad_request("nope").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::forbidden().into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::not_found("gone").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::new(ErrorCode::Internal, "boom")
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn api_error_body_carries_field_errors() {
        let error = ApiError::field(ErrorCode::DuplicateKey, "slug", "a product with that slug already exists");
        let json = serde_json::to_value(&error).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "slug");
        // The taxonomy code is internal routing, not wire format.
        assert!(json.get("code").is_none());
    }

    #[test]
    fn ensure_admin_rejects_public_callers() {
        assert!(ensure_admin(Caller { is_admin: true }).is_ok());
        assert!(ensure_admin(Caller { is_admin: false }).is_err());
    }

    #[test]
    fn product_json_flattens_category_and_uses_camel_case() {
        let value = product_json(make_record(), None);
        assert_eq!(value["id"], 7);
        assert_eq!(value["category"]["slug"], "stress-sleep");
        assert_eq!(value["brandOrFormulator"], "Himalaya Labs");
        assert_eq!(value["originalPrice"], "200");
        assert_eq!(value["usageGuide"][0]["title"], "How to use");
    }

    #[test]
    fn product_json_projection_keeps_id_and_requested_fields_only() {
        let fields = ["title", "price"]
            .into_iter()
            .map(String::from)
            .collect::<std::collections::BTreeSet<_>>();
        let value = product_json(make_record(), Some(&fields));

        let keys: Vec<&str> = value
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["id", "price", "title"]);
    }

    #[test]
    fn response_envelope_has_success_and_message() {
        let json = serde_json::to_value(ApiResponse::ok("products fetched", vec![1, 2]))
            .expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "products fetched");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    // -------------------------------------------------------------------
    // Route tests that fail before any query runs: the pool is lazy and
    // never connects.
    // -------------------------------------------------------------------

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/herbcat_test".to_string(),
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            log_level: "info".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            media_root: std::path::PathBuf::from("./media"),
            categories_path: std::path::PathBuf::from("./config/categories.yaml"),
            upload_max_bytes: 5 * 1024 * 1024,
            db_max_connections: 1,
            db_min_connections: 0,
            db_acquire_timeout_secs: 1,
        }
    }

    fn test_app() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/herbcat_test")
            .expect("lazy pool");
        let auth = AdminAuthState::with_tokens(&["test-admin-token"]);
        build_app(
            AppState {
                pool,
                config: Arc::new(test_config()),
            },
            auth,
        )
    }

    #[tokio::test]
    async fn create_without_admin_token_is_forbidden() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/collections")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn update_rejects_non_numeric_id() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/collections/not-a-number")
                    .header("authorization", "Bearer test-admin-token")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn brochure_delete_requires_file_url() {
        use axum::body::{to_bytes, Body};
        use axum::http::Request;
        use tower::ServiceExt;

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/collections/9/pdf")
                    .header("authorization", "Bearer test-admin-token")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["errors"][0]["field"], "fileUrl");
    }

    #[tokio::test]
    async fn responses_echo_the_request_id() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/collections")
                    .header("x-request-id", "req-abc-123")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-abc-123")
        );
    }
}
