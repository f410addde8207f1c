use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::Result,
    models::user::Principal,
    response::ApiResponse,
    services::auth as auth_service,
    state::AppState,
    token,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    /// A bearer token for stateless clients; the session cookie is set in
    /// parallel on the response.
    pub token: String,
    pub user: Principal,
}

/// Builds the session cookie: path `/`, http-only, same-site lax.
fn session_cookie(name: &str, value: String, max_age: std::time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), value);
    cookie.set_http_only(true);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(Duration::seconds(max_age.as_secs() as i64));
    cookie
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), "");
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookie
}

/// Handles user registration. The new user is logged in immediately.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<Principal>> {
    tracing::info!("📝 Register attempt: {}", payload.username);

    let user = auth_service::create_user(
        state.users.as_ref(),
        payload.username,
        payload.email,
        payload.password,
    )
    .await?;

    let session_key = state.sessions.create(user.id).await?;
    cookies.add(session_cookie(
        &state.config.session_cookie,
        session_key,
        state.config.session_max_age,
    ));

    tracing::info!("✅ User registered and logged in: {}", user.id);
    Ok(ApiResponse::success(Principal::from(user)))
}

/// Handles user login: server-side session plus a bearer token.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    tracing::info!("🔐 Login attempt: {}", payload.username);

    let user =
        auth_service::authenticate_user(state.users.as_ref(), &payload.username, &payload.password)
            .await?;

    let session_key = state.sessions.create(user.id).await?;
    cookies.add(session_cookie(
        &state.config.session_cookie,
        session_key,
        state.config.session_max_age,
    ));

    let bearer = token::issue(
        &state.config.jwt_secret,
        &state.config.jwt_issuer,
        state.config.jwt_expire_hours,
        user.id,
        user.role_ids.clone(),
    )?;

    tracing::info!("✅ User logged in: {}", user.id);
    Ok(ApiResponse::success(LoginResponse {
        token: bearer,
        user: Principal::from(user),
    }))
}

/// Handles user logout. Destroying an already-gone session is fine.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    cookies: Cookies,
) -> Result<ApiResponse<()>> {
    tracing::info!("👋 Logout for user: {}", principal.id);

    if let Some(cookie) = cookies.get(&state.config.session_cookie) {
        state.sessions.destroy(cookie.value()).await?;
    }
    cookies.remove(removal_cookie(&state.config.session_cookie));

    Ok(ApiResponse::success(()))
}

/// Returns the principal resolved for this request.
#[axum::debug_handler]
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResponse<Principal> {
    ApiResponse::success(principal)
}
