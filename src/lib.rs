use std::time::Duration;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use http::{Method, header};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod db;
pub mod error;
pub mod response;
pub mod session;
pub mod state;
pub mod token;

pub mod models {
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod current_user;
}

pub mod handlers {
    pub mod auth;
}

pub mod middleware_layer {
    pub mod access_log;
    pub mod auth;
    pub mod inject;
    pub mod recovery;
}

use state::AppState;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            "x-requested-with".parse().unwrap(),
        ])
        .allow_credentials(true)
        .expose_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400))
}

/// The API routing table: public auth routes plus the session/token guarded
/// group.
pub fn api_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route_layer(from_fn(middleware_layer::auth::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Wraps a routing table in the cross-cutting pipeline, outermost first:
/// CORS → access log → trace → fault recovery → cookies → resource injection.
///
/// Both normal completion and a recovered fault flow back out through the
/// access logger.
pub fn pipeline(state: AppState, routes: Router) -> Router {
    routes
        .layer(from_fn_with_state(
            state,
            middleware_layer::inject::inject_resources,
        ))
        .layer(CookieManagerLayer::new())
        .layer(middleware_layer::recovery::layer())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(from_fn(middleware_layer::access_log::access_log))
        .layer(cors())
}

/// The complete application: API routes behind the full pipeline.
pub fn router(state: AppState) -> Router {
    let routes = api_routes(state.clone());
    pipeline(state, routes)
}
