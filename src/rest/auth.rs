use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{message, AppState, JsonBody};
use crate::auth::{create_jwt, hash_password, validate_jwt, verify_password, AuthPayload};
use crate::error::{AppError, Result};
use crate::models::{new_id, User, UserProfile};
use crate::normalize::opt_text;
use crate::query::Query;
use crate::storage::Collection;

#[derive(Deserialize, Debug)]
pub struct UserRegister {
    #[serde(default, deserialize_with = "opt_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub role: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UserLogin {
    #[serde(default, deserialize_with = "opt_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub username: String,
    pub email: String,
    pub role: String,
    pub token: String,
}

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/users", get(list_users_handler))
        .merge(protected)
}

/// Requires `Authorization: Bearer <token>` and stores the claims as a request
/// extension.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;

    let claims = validate_jwt(token, &state.auth)
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token".to_string()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[instrument(name = "auth::register", skip_all)]
async fn register_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<UserRegister>,
) -> Result<(StatusCode, Json<Value>)> {
    let username = payload.username.as_deref().map(str::trim).unwrap_or_default().to_string();
    let password = payload.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::InvalidArgument(
            "username and password are required".to_string(),
        ));
    }

    let cost = state.auth.bcrypt_cost;
    let digest = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

    let user = User::new(new_id(), username, digest, payload.email, payload.role, Utc::now());
    if !state.storage.insert_unique(Collection::Users, &user.username, &user)? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    info!(username = %user.username, role = %user.role, "registered user");
    Ok((StatusCode::CREATED, message("User registered successfully")))
}

#[instrument(name = "auth::login", skip_all)]
async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<UserLogin>,
) -> Result<Json<LoginResponse>> {
    let invalid = || AppError::Unauthenticated("Invalid username or password".to_string());

    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let user: User = state.storage.get(Collection::Users, username)?.ok_or_else(invalid)?;

    let digest = user.password.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &digest)).await?;
    if !matches {
        warn!(username = %user.username, "login rejected");
        return Err(invalid());
    }

    let token = create_jwt(&user.username, &user.role, &state.auth)?;
    info!(username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    }))
}

#[instrument(name = "auth::users", skip_all)]
async fn list_users_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserProfile>>> {
    let users: Vec<User> = state.storage.find(Collection::Users, &Query::new())?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

#[instrument(name = "auth::me", skip_all)]
async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthPayload>,
) -> Result<Json<UserProfile>> {
    let user: User = state
        .storage
        .get(Collection::Users, &claims.sub)?
        .ok_or_else(|| AppError::Unauthenticated("Unknown user".to_string()))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, send_with};
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_twice_conflicts() {
        let (app, storage) = app();
        let body = json!({ "username": "mei", "password": "pw", "email": "mei@example.com" });

        let (status, res) = send(&app, Method::POST, "/api/auth/register", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(res, json!({ "message": "User registered successfully" }));

        let (status, res) = send(&app, Method::POST, "/api/auth/register", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res, json!({ "error": "Username already exists" }));

        let users: Vec<User> = storage.find(Collection::Users, &Query::new()).unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_register_requires_credentials() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::POST, "/api/auth/register", Some(json!({ "username": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let (app, _) = app();
        send(
            &app,
            Method::POST,
            "/api/auth/register",
            Some(json!({ "username": "mei", "password": "pw", "role": "admin" })),
        )
        .await;

        let (status, res) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "username": "mei", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(res, json!({ "error": "Invalid username or password" }));

        let (status, res) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "username": "ghost", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(res["error"], "Invalid username or password");

        let (status, res) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "username": "mei", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["username"], "mei");
        assert_eq!(res["email"], "");
        assert_eq!(res["role"], "admin");
        assert!(res.get("password").is_none());
        let token = res["token"].as_str().unwrap().to_string();

        let (status, profile) = send_with(&app, Method::GET, "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["username"], "mei");

        let (status, _) = send(&app, Method::GET, "/api/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send_with(&app, Method::GET, "/api/auth/me", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_users_hides_digest() {
        let (app, _) = app();
        for name in ["a", "b"] {
            send(
                &app,
                Method::POST,
                "/api/auth/register",
                Some(json!({ "username": name, "password": "pw" })),
            )
            .await;
        }

        let (status, users) = send(&app, Method::GET, "/api/auth/users", None).await;
        assert_eq!(status, StatusCode::OK);
        let users = users.as_array().unwrap();
        assert_eq!(users.len(), 2);
        for user in users {
            assert!(user.get("password").is_none());
            assert_eq!(user["role"], "user");
        }
    }
}
