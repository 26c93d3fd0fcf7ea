//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use std::time::Instant;

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

/// HTTP 状态码错误日志中间件
///
/// 当状态码为 4xx 或 5xx 时记录日志，附带请求耗时
/// 业务错误的详情在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    async fn healthy() -> &'static str {
        "healthy"
    }

    async fn rejected() -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    async fn timed_out() -> StatusCode {
        StatusCode::GATEWAY_TIMEOUT
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/health", get(healthy))
            .route("/rejected", post(rejected))
            .route("/timed-out", post(timed_out))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_error_passes_through() {
        assert_eq!(
            status_of("POST", "/rejected").await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of("GET", "/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_error_passes_through() {
        assert_eq!(
            status_of("POST", "/timed-out").await,
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
