use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Capability of the current caller, attached to every request.
///
/// Public routes read it to apply visibility rules; admin routes
/// reject when `is_admin` is false.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub is_admin: bool,
}

/// Admin token settings used by the caller-identification middleware.
#[derive(Debug, Clone)]
pub struct AdminAuthState {
    admin_tokens: Arc<HashSet<String>>,
    enabled: bool,
}

impl AdminAuthState {
    /// Builds auth config from `HERBCAT_ADMIN_TOKENS` (comma-separated
    /// bearer tokens).
    ///
    /// In development, empty/missing tokens disable the check so every
    /// caller is treated as an admin for local iteration. In
    /// non-development envs, empty/missing tokens fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("HERBCAT_ADMIN_TOKENS").unwrap_or_default();
        let tokens: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if tokens.is_empty() {
            if is_development {
                tracing::warn!(
                    "HERBCAT_ADMIN_TOKENS not set; all callers treated as admin in development"
                );
                return Ok(Self {
                    admin_tokens: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "HERBCAT_ADMIN_TOKENS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            admin_tokens: Arc::new(tokens),
            enabled: true,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_tokens(tokens: &[&str]) -> Self {
        Self {
            admin_tokens: Arc::new(tokens.iter().map(ToString::to_string).collect()),
            enabled: true,
        }
    }

    fn is_admin_token(&self, token: &str) -> bool {
        self.admin_tokens.contains(token)
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware attaching the caller's capability to the request.
///
/// A valid admin bearer token yields `Caller { is_admin: true }`;
/// anything else is a public caller. Admin-only handlers do the actual
/// rejection so public reads on the same routes keep working.
pub async fn identify_caller(
    State(auth): State<AdminAuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let is_admin = if auth.enabled {
        extract_bearer_token(req.headers().get(AUTHORIZATION))
            .is_some_and(|token| auth.is_admin_token(token))
    } else {
        true
    };

    req.extensions_mut().insert(Caller { is_admin });
    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_strips_prefix() {
        let value = HeaderValue::from_static("Bearer secret-token");
        assert_eq!(extract_bearer_token(Some(&value)), Some("secret-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_other_schemes() {
        let value = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(Some(&value)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn extract_bearer_token_rejects_blank_token() {
        let value = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&value)), None);
    }

    #[test]
    fn admin_token_lookup() {
        let auth = AdminAuthState::with_tokens(&["alpha", "beta"]);
        assert!(auth.is_admin_token("alpha"));
        assert!(!auth.is_admin_token("gamma"));
    }
}
