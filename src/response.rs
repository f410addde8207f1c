use axum::response::{IntoResponse, Response};
use http::{StatusCode, header};
use serde::Serialize;

/// Business status codes carried in the response envelope.
///
/// Any request that reaches the backend is answered with HTTP 200 and one of
/// these codes; HTTP 500 is reserved for unrecovered faults.
pub mod code {
    pub const SUCCESS: i32 = 0;
    pub const FAIL: i32 = 500;
    pub const NOT_AUTHENTICATED: i32 = 1201;
    pub const TOKEN_EXPIRED: i32 = 1202;
    pub const TOKEN_NOT_YET_VALID: i32 = 1203;
    pub const TOKEN_MALFORMED: i32 = 1204;
    pub const TOKEN_INVALID: i32 = 1205;
    pub const BAD_CREDENTIALS: i32 = 1301;
    pub const VALIDATION: i32 = 1302;
    pub const NOT_FOUND: i32 = 1303;
}

/// A response to the client, one variant per response category.
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    /// A successful outcome with its payload. Code 0, HTTP 200.
    Success(T),
    /// An expected business failure. Non-zero code, HTTP 200.
    Business {
        code: i32,
        message: String,
        detail: Option<String>,
    },
    /// An unrecovered fault. The only HTTP 500; emitted at the pipeline
    /// boundary, never constructed by handlers directly.
    Internal,
}

impl<T: Serialize> ApiResponse<T> {
    /// A success envelope wrapping `data`.
    pub fn success(data: T) -> Self {
        ApiResponse::Success(data)
    }
}

impl ApiResponse<()> {
    /// A business failure envelope without extra detail.
    pub fn business(code: i32, message: String) -> Self {
        ApiResponse::Business {
            code,
            message,
            detail: None,
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    code: i32,
    message: &'a str,
    data: Option<T>,
}

fn json_body(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Serializes an envelope, falling back to a static internal-error body if
/// the payload itself refuses to serialize.
fn serialize<T: Serialize>(envelope: &Envelope<'_, T>) -> String {
    sonic_rs::to_string(envelope)
        .unwrap_or_else(|_| r#"{"code":500,"message":"internal server error","data":null}"#.into())
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(data) => json_body(
                StatusCode::OK,
                serialize(&Envelope {
                    code: code::SUCCESS,
                    message: "ok",
                    data: Some(data),
                }),
            ),
            ApiResponse::Business {
                code,
                message,
                detail,
            } => json_body(
                StatusCode::OK,
                serialize(&Envelope {
                    code,
                    message: &message,
                    data: detail,
                }),
            ),
            ApiResponse::Internal => json_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                serialize::<()>(&Envelope {
                    code: code::FAIL,
                    message: "internal server error",
                    data: None,
                }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_is_http_200_code_0() {
        let response = ApiResponse::success("hello").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], "hello");
    }

    #[tokio::test]
    async fn business_failure_keeps_http_200() {
        let response =
            ApiResponse::business(code::NOT_AUTHENTICATED, "not authenticated".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["code"], 1201);
        assert_eq!(json["message"], "not authenticated");
    }

    #[tokio::test]
    async fn internal_is_the_only_500() {
        let response = ApiResponse::<()>::Internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], 500);
    }
}
