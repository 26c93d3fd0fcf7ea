//! Podcast Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::GeneratePodcast;
use crate::infrastructure::http::{
    dto::{GeneratePodcastRequest, GeneratePodcastResponse},
    error::ApiError,
    state::AppState,
};

/// 生成播客
///
/// 请求在生成完成后才返回；客户端断开时请求 future 被丢弃，
/// 临时文件随之清理
pub async fn generate_podcast(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GeneratePodcastRequest>,
) -> Result<Json<GeneratePodcastResponse>, ApiError> {
    let cmd = GeneratePodcast::new(req.companies).with_output_file(req.output_file);

    let report = state
        .generate_podcast_handler
        .handle(cmd, state.shutdown.child_token())
        .await?;

    Ok(Json(report.into()))
}
