use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::state::AppState;

/// Attaches the shared resource handles (database pool, session store, user
/// store, config) to the request scope before any handler runs.
///
/// The handles are shared-read and internally synchronized; this clones the
/// cheap `AppState` wrapper, never the resources themselves. Downstream
/// stages read them back with `request.extensions().get::<AppState>()`.
pub async fn inject_resources(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}
