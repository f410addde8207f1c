use std::any::Any;
use std::backtrace::Backtrace;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::response::ApiResponse;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// The fault-recovery boundary.
///
/// The single place where panics escaping a handler are caught. Each fault is
/// converted into the uniform internal-error envelope for its own request;
/// concurrently handled requests are unaffected.
pub fn layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// A peer that went away mid-request is not worth a diagnostic dump.
fn is_client_disconnect(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("broken pipe") || lower.contains("connection reset by peer")
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(err.as_ref());

    if is_client_disconnect(&message) {
        tracing::warn!("Connection aborted by client: {}", message);
    } else {
        tracing::error!(
            panic = %message,
            stack = %Backtrace::force_capture(),
            "[Recovery] panic while handling request"
        );
    }

    ApiResponse::<()>::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn fault_becomes_internal_error_response() {
        let response = handle_panic(Box::new("boom".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn disconnects_are_classified() {
        assert!(is_client_disconnect("write failed: Broken pipe (os error 32)"));
        assert!(is_client_disconnect("Connection reset by peer"));
        assert!(!is_client_disconnect("index out of bounds"));
    }
}
