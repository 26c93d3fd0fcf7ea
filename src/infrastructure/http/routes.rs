//! HTTP Routes
//!
//! API Endpoints:
//! - /generate-podcast  POST  生成播客（同步返回结果）
//! - /health            GET   健康检查

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-podcast", post(handlers::generate_podcast))
        .route("/health", get(handlers::health))
}
