//! REST API layer (Axum)
//!
//! `/api/products`, `/api/employees`, `/api/suppliers` and `/api/auth` over the
//! shared [`Storage`]. Every failure is answered as `{ "error": <message> }`
//! through [`AppError`]. [`create_app`] adds the static admin pages as the
//! fallback plus request tracing.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::AuthSettings;
use crate::error::AppError;
use crate::models::parse_id;
use crate::storage::Storage;

pub mod auth;
pub mod employees;
pub mod products;
pub mod suppliers;

/// Shared app state for REST handlers. The store handle is injected here and
/// nowhere else.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(storage: Storage, auth: AuthSettings) -> Self {
        Self { storage, auth }
    }
}

/// `Json` extractor whose rejection is an [`AppError`], so malformed bodies get
/// the same `{ "error": .. }` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query-string extractor with the same error shape as [`JsonBody`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// API routes only.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health_handler))
        .merge(products::routes())
        .merge(employees::routes())
        .merge(suppliers::routes())
        .merge(auth::routes(state.clone()))
        .with_state(state)
}

/// API routes plus static files from `public_dir` for every other path.
pub fn create_app(state: AppState, public_dir: &Path) -> Router {
    create_router(state)
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Canonical id for a path segment, or 400 `Invalid <entity> id`.
pub(crate) fn path_id(raw: &str, entity: &str) -> Result<String, AppError> {
    parse_id(raw).ok_or_else(|| AppError::InvalidArgument(format!("Invalid {entity} id")))
}

pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}


#[cfg(test)]
mod tests {
    use super::test_support::{app, send};
    use super::*;
    use axum::http::{Method, StatusCode};
    use std::fs;

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (app, _) = app();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/suppliers")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_string_is_json_error() {
        let (app, _) = app();
        for uri in [
            "/api/employees?department=a&department=b",
            "/api/suppliers?search=x&search=y",
        ] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_bundled_admin_pages() {
        let public_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("public");
        let app = create_app(AppState::new(Storage::temporary().unwrap(), AuthSettings::default()), &public_dir);

        let text = |body: Value| body.as_str().map(str::to_string).unwrap_or_default();

        let (status, body) = send(&app, Method::GET, "/dashboard.html", None).await;
        assert_eq!(status, StatusCode::OK);
        let dashboard = text(body);
        for id in ["totalProducts", "activeProducts", "lowStockList", "deptGrid"] {
            assert!(dashboard.contains(id), "dashboard is missing #{id}");
        }

        for page in ["/dashboard.html", "/admin.html"] {
            let (_, body) = send(&app, Method::GET, page, None).await;
            assert!(text(body).contains("/js/common.js"), "{page} does not load common.js");
        }

        let (status, body) = send(&app, Method::GET, "/js/common.js", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(text(body).contains("function escapeHtml"));
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let public_dir = std::env::temp_dir().join("inventory_admin_test_public");
        let _ = fs::remove_dir_all(&public_dir);
        fs::create_dir_all(&public_dir).unwrap();
        fs::write(public_dir.join("hello.txt"), "hi").unwrap();

        let storage = Storage::temporary().unwrap();
        let app = create_app(AppState::new(storage, AuthSettings::default()), &public_dir);

        let (status, body) = send(&app, Method::GET, "/hello.txt", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("hi".to_string()));

        let (status, _) = send(&app, Method::GET, "/api/products", None).await;
        assert_eq!(status, StatusCode::OK);

        let _ = fs::remove_dir_all(public_dir);
    }
}
