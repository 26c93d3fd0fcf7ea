//! podcast-generate - 命令行生成一期播客
//!
//! 固定研究 Apple，输出到 company_podcast.mp3

use std::process::ExitCode;

use podcastgen::application::{ApplicationError, GeneratePodcast};
use podcastgen::config::load_config;
use podcastgen::infrastructure::{build_podcast_handler, init_tracing};
use tokio_util::sync::CancellationToken;

const COMPANIES: &[&str] = &["Apple"];

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_tracing(&config.log);

    let handler = build_podcast_handler(&config).await?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let cmd = GeneratePodcast::new(COMPANIES.iter().map(|c| c.to_string()).collect());

    match handler.handle(cmd, cancel).await {
        Ok(report) => {
            println!(
                "Podcast generated: {} ({} utterances, {:.1}s, {})",
                report.output_file.display(),
                report.utterances,
                report.duration_ms as f64 / 1000.0,
                report.format
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ (ApplicationError::EmptyConversation | ApplicationError::MalformedScript(_))) => {
            eprintln!("No podcast generated: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
