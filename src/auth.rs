//! Accounts, sessions and the guards that protect routes.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::{env_flag, env_parse, env_string};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::types::{UserId, UserView};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "hunt_session";

/// bcrypt work factor used unless `BCRYPT_COST` says otherwise
const DEFAULT_BCRYPT_COST: u32 = 10;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Log in unknown usernames by creating the account on the spot
    pub auto_register: bool,
    /// Admin account ensured at startup
    pub admin_username: String,
    pub admin_password: String,
    /// Mark the session cookie `Secure` (serve over HTTPS only)
    pub secure_cookies: bool,
    pub session_ttl_days: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auto_register: true,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            secure_cookies: false,
            session_ttl_days: 30,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AuthConfig {
    /// Load auth config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let admin_username =
            env_string("ADMIN_USERNAME").unwrap_or_else(|| defaults.admin_username.clone());
        let admin_password = match env_string("ADMIN_PASSWORD") {
            Some(password) => password,
            None => {
                tracing::warn!(
                    "ADMIN_PASSWORD not set - admin account uses the well-known default password!"
                );
                defaults.admin_password.clone()
            }
        };

        let config = Self {
            auto_register: env_flag("AUTO_REGISTER", defaults.auto_register),
            admin_username,
            admin_password,
            secure_cookies: env_flag("SECURE_COOKIES", defaults.secure_cookies),
            session_ttl_days: env_parse("SESSION_TTL_DAYS", defaults.session_ttl_days),
            bcrypt_cost: env_parse("BCRYPT_COST", defaults.bcrypt_cost)
                .clamp(BCRYPT_MIN_COST, BCRYPT_MAX_COST),
        };

        tracing::info!(
            auto_register = config.auto_register,
            secure_cookies = config.secure_cookies,
            session_ttl_days = config.session_ttl_days,
            bcrypt_cost = config.bcrypt_cost,
            admin = %config.admin_username,
            "Auth config loaded"
        );
        config
    }
}

/// Valid bcrypt cost range (mirrors the bcrypt crate's private MIN_COST/MAX_COST)
pub(crate) const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

/// Hash a password with bcrypt, off the async runtime
pub async fn hash_password(password: &str, cost: u32) -> ApiResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored bcrypt hash. Unreadable hashes never match.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let password = password.to_string();
    let stored = stored.to_string();
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

/// Find the session token among the request's cookies
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    );
    // Tokens are ULIDs, always valid header characters
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// A request with a live session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub is_admin: bool,
    pub token: String,
}

/// A request whose session belongs to an admin
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: UserId,
}

/// The session if there is one; never rejects
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<UserId> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

async fn lookup_session(parts: &Parts, state: &AppState) -> Option<AuthUser> {
    let token = session_token(&parts.headers)?;
    let session = state.sessions.get(&token).await?;
    Some(AuthUser {
        user_id: session.user_id,
        is_admin: session.is_admin,
        token,
    })
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        lookup_session(parts, state)
            .await
            .ok_or_else(ApiError::login_required)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match lookup_session(parts, state).await {
            Some(user) if user.is_admin => Ok(AdminUser {
                user_id: user.user_id,
            }),
            _ => Err(ApiError::admin_required()),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(lookup_session(parts, state).await))
    }
}

/// Middleware for routes that only logged-in users may see (uploaded images)
pub async fn require_session_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let has_session = match session_token(request.headers()) {
        Some(token) => state.sessions.get(&token).await.is_some(),
        None => false,
    };
    if !has_session {
        return ApiError::Unauthorized("Login required to view images".to_string())
            .into_response();
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> ApiResult<(String, String)> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(ApiError::BadRequest(
                "Username and password are required".to_string(),
            )),
        }
    }
}

/// Respond with the user view and a fresh session cookie
async fn start_session(
    state: &AppState,
    status: StatusCode,
    user: &crate::types::User,
) -> Response {
    let token = state.sessions.create(user.id, user.is_admin).await;
    let max_age = state.sessions.ttl().num_seconds();
    let cookie = session_cookie(&token, max_age, state.auth_config.secure_cookies);
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(UserView::from(user)),
    )
        .into_response()
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<Response> {
    let (username, password) = body.into_parts()?;
    let user = state.authenticate(&username, &password).await?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(start_session(&state, StatusCode::OK, &user).await)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<Response> {
    let (username, password) = body.into_parts()?;
    let user = state.register_user(&username, &password).await?;
    tracing::info!(user_id = user.id, "User registered");
    Ok(start_session(&state, StatusCode::CREATED, &user).await)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(&token).await;
    }
    let cookie = session_cookie("", 0, state.auth_config.secure_cookies);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    MaybeUser(session): MaybeUser,
) -> ApiResult<Json<UserView>> {
    let session = session.ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;
    match state.store.get_user(session.user_id).await? {
        Some(user) => Ok(Json(UserView::from(&user))),
        None => {
            // Account is gone; the session is useless
            state.sessions.destroy(&session.token).await;
            Err(ApiError::Unauthorized("User not found".to_string()))
        }
    }
}
