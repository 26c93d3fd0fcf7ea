//! Application State

use tokio_util::sync::CancellationToken;

use crate::application::GeneratePodcastHandler;

/// 应用状态
pub struct AppState {
    pub generate_podcast_handler: GeneratePodcastHandler,

    /// 服务关闭时取消所有进行中的生成
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(generate_podcast_handler: GeneratePodcastHandler) -> Self {
        Self {
            generate_podcast_handler,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
