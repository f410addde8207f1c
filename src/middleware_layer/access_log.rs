use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use http_body::Body as _;

/// Extracts the client IP from the request extensions.
fn client_ip(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Response size in bytes: Content-Length when set, otherwise the body's
/// exact size hint. A streamed body without Content-Length logs as 0.
fn response_size(response: &Response) -> u64 {
    response
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}

/// Records one line per completed request: method, path, query, client
/// address, status, response size, and processing duration.
///
/// Sits outermost (inside CORS only), so the timing covers the full pipeline
/// including fault recovery; a recovered panic is logged here as its 500.
pub async fn access_log(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or("").to_string();
    let ip = client_ip(&request);

    let start = Instant::now();
    let response = next.run(request).await;
    let cost = start.elapsed();

    let size = response_size(&response);

    tracing::info!(
        method = %method,
        path = %path,
        query = %query,
        ip = %ip,
        status = response.status().as_u16(),
        size,
        cost = ?cost,
        "[HTTP]"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn exact_bodies_report_their_size() {
        let response = "hello".into_response();
        assert_eq!(response_size(&response), 5);
    }

    #[test]
    fn content_length_header_wins_when_present() {
        let response = http::Response::builder()
            .header(http::header::CONTENT_LENGTH, "12")
            .body(Body::empty())
            .unwrap();
        assert_eq!(response_size(&response), 12);
    }
}
