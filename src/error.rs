use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::{ApiResponse, code};
use crate::token::TokenError;

/// The application's error type.
///
/// Every variant here is an expected outcome and is rendered as an HTTP 200
/// business envelope; only unrecovered panics caught at the pipeline boundary
/// produce an HTTP 500.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A pool construction error.
    #[error("Pool build error: {0}")]
    PoolBuild(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A bearer token validation error.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// No authenticated principal could be resolved for the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// An authentication error (bad credentials).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A row was missing an expected column.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The business status code carried in the response envelope.
    pub fn business_code(&self) -> i32 {
        match self {
            AppError::Token(TokenError::Expired) => code::TOKEN_EXPIRED,
            AppError::Token(TokenError::NotYetValid) => code::TOKEN_NOT_YET_VALID,
            AppError::Token(TokenError::Malformed) => code::TOKEN_MALFORMED,
            AppError::Token(TokenError::Invalid) => code::TOKEN_INVALID,
            AppError::NotAuthenticated => code::NOT_AUTHENTICATED,
            AppError::Authentication(_) => code::BAD_CREDENTIALS,
            AppError::Validation(_) => code::VALIDATION,
            AppError::NotFound => code::NOT_FOUND,
            _ => code::FAIL,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Pool(e) => tracing::error!("Pool error: {}", e),
            AppError::PoolBuild(e) => tracing::error!("Pool build error: {}", e),
            AppError::Redis(e) => tracing::error!("Redis error: {}", e),
            AppError::MissingData(col) => tracing::error!("Missing column in row: {}", col),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Token(e) => tracing::warn!("Token rejected: {}", e),
            AppError::NotAuthenticated => tracing::debug!("Request not authenticated"),
            AppError::Authentication(msg) => tracing::warn!("Authentication failed: {}", msg),
            AppError::Validation(msg) => tracing::debug!("Validation error: {}", msg),
            AppError::NotFound => tracing::debug!("Resource not found"),
        }

        let business_code = self.business_code();
        let response = match self {
            AppError::Token(e) => ApiResponse::business(business_code, e.to_string()),
            AppError::NotAuthenticated => {
                ApiResponse::business(business_code, "not authenticated".to_string())
            }
            AppError::Authentication(msg) => ApiResponse::business(business_code, msg),
            AppError::Validation(msg) => ApiResponse::business(business_code, msg),
            AppError::NotFound => {
                ApiResponse::business(business_code, "resource not found".to_string())
            }
            // System errors stay on the business channel too; the raw cause is
            // logged above and never leaks to the client.
            _ => ApiResponse::business(business_code, "internal server error".to_string()),
        };

        response.into_response()
    }
}
