use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::user::Principal,
    response::ApiResponse,
    services::current_user,
    state::AppState,
    token,
};

/// Extracts the session key from the request cookies.
fn extract_session_key(cookies: &Cookies, cookie_name: &str) -> Option<String> {
    cookies
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
}

/// Resolves a principal from an `Authorization: Bearer` token.
///
/// The parallel credential path for stateless clients: verify the token,
/// fetch the user the claims point at, and cache the principal on the scope
/// the same way the session path does.
async fn bearer_principal(state: &AppState, request: &mut Request<Body>) -> Result<Principal> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::NotAuthenticated)?;

    let raw_token = header_value
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or(AppError::NotAuthenticated)?;

    let claims = token::verify(&state.config.jwt_secret, raw_token)?;

    let user = state
        .users
        .get_user_by_id(claims.user_id)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    let principal = Principal::from(user);
    request.extensions_mut().insert(principal.clone());
    Ok(principal)
}

/// A middleware that requires an authenticated principal.
///
/// The session cookie is the primary credential; when it yields nothing, a
/// bearer token is accepted as the stateless alternative. Either way the
/// resolved [`Principal`] ends up on the request scope for handlers to read
/// via `Extension<Principal>`. Failure is answered with the not-authenticated
/// business envelope, never a fault.
pub async fn require_auth(cookies: Cookies, mut request: Request<Body>, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        tracing::error!("❌ Shared resources missing from request scope");
        return ApiResponse::<()>::Internal.into_response();
    };

    let session_key = extract_session_key(&cookies, &state.config.session_cookie);

    let resolved = current_user::resolve(
        request.extensions_mut(),
        session_key.as_deref(),
        state.sessions.as_ref(),
        state.users.as_ref(),
    )
    .await;

    match resolved {
        Ok(principal) => {
            tracing::debug!("✅ Authenticated via session: {}", principal.username);
            next.run(request).await
        }
        Err(AppError::NotAuthenticated) => match bearer_principal(&state, &mut request).await {
            Ok(principal) => {
                tracing::debug!("✅ Authenticated via bearer token: {}", principal.username);
                next.run(request).await
            }
            Err(e) => e.into_response(),
        },
        Err(e) => e.into_response(),
    }
}
