//! Podcastgen - 播客生成 HTTP 服务
//!
//! - Domain: script/, pipeline/, audio/
//! - Application: commands, services, ports
//! - Infrastructure: http, adapters, persistence, bootstrap

use podcastgen::config::{load_config, print_config};
use podcastgen::infrastructure::http::{AppState, HttpServer};
use podcastgen::infrastructure::{build_podcast_handler, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Podcastgen - 播客生成服务");
    print_config(&config);

    let handler = build_podcast_handler(&config).await?;
    let server = HttpServer::new(config.server.clone(), AppState::new(handler));

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
