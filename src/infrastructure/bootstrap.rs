//! Bootstrap - 根据配置装配生成流水线
//!
//! 服务端与命令行共用同一套装配逻辑

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use crate::application::{
    AgentSettings, AssemblerConfig, AudioAssembler, GeneratePodcastHandler, ScriptGenerator,
    VoiceSettings,
};
use crate::config::{AppConfig, LogConfig};
use crate::domain::script::ScriptNormalizer;
use crate::infrastructure::adapters::{
    ElevenLabsClient, ElevenLabsClientConfig, FileScratchStorage, OpenAiClient,
    OpenAiClientConfig, SerperClient, SerperClientConfig, SymphoniaCodec,
};
use crate::infrastructure::persistence::sled::{SledCacheConfig, SledSynthesisCache};

/// 装配错误
#[derive(Debug, Error)]
#[error("Failed to initialize {component}: {message}")]
pub struct BootstrapError {
    pub component: &'static str,
    pub message: String,
}

impl BootstrapError {
    fn new(component: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            component,
            message: err.to_string(),
        }
    }
}

/// 初始化日志
///
/// `RUST_LOG` 优先于 `log.level`
pub fn init_tracing(log: &LogConfig) {
    let log_filter = format!(
        "{},podcastgen={},tower_http=debug",
        log.level, log.level
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 构建播客生成处理器
///
/// 上游客户端只在这里创建一次，以 `Arc<dyn Port>` 传入各服务
pub async fn build_podcast_handler(
    config: &AppConfig,
) -> Result<GeneratePodcastHandler, BootstrapError> {
    let llm = OpenAiClient::new(OpenAiClientConfig {
        base_url: config.agent.base_url.clone(),
        api_key: config.agent.api_key.clone(),
        timeout_secs: config.agent.timeout_secs,
    })
    .map_err(|e| BootstrapError::new("language model client", e))?;

    let search = SerperClient::new(SerperClientConfig {
        base_url: config.search.base_url.clone(),
        api_key: config.search.api_key.clone(),
        results_per_query: config.search.results_per_query,
        timeout_secs: config.search.timeout_secs,
    })
    .map_err(|e| BootstrapError::new("search client", e))?;

    let tts = ElevenLabsClient::new(
        ElevenLabsClientConfig::new(&config.tts.base_url)
            .with_api_key(config.tts.api_key.clone())
            .with_timeout(config.tts.timeout_secs),
    )
    .map_err(|e| BootstrapError::new("TTS client", e))?;

    let scratch = FileScratchStorage::new(&config.storage.scratch_dir)
        .await
        .map_err(|e| BootstrapError::new("scratch storage", e))?;

    let generator = ScriptGenerator::new(
        Arc::new(llm),
        Arc::new(search),
        AgentSettings {
            model: config.agent.model.clone(),
            temperature: config.agent.temperature,
            max_tokens: config.agent.max_tokens,
        },
    );

    let voice = VoiceSettings {
        host_voice_id: config.voice.host_voice_id.clone(),
        guest_voice_id: config.voice.guest_voice_id.clone(),
        model_id: config.voice.model_id.clone(),
        output_format: config.voice.output_format.clone(),
        pause_duration_ms: config.voice.pause_duration_ms,
    };

    let mut assembler = AudioAssembler::new(
        AssemblerConfig {
            voice,
            max_concurrent: config.tts.max_concurrent,
        },
        Arc::new(tts),
        Arc::new(SymphoniaCodec::new(config.tts.opus_bitrate)),
        Arc::new(scratch),
        Arc::new(Semaphore::new(config.tts.global_max_concurrent)),
    );

    if config.cache.enabled {
        let cache = SledSynthesisCache::new(&SledCacheConfig {
            db_path: config.cache.path.clone(),
            max_size_bytes: config.cache.max_size_bytes,
        })
        .map_err(|e| BootstrapError::new("synthesis cache", e))?;
        assembler = assembler.with_cache(Arc::new(cache));
    }

    Ok(GeneratePodcastHandler::new(
        Arc::new(generator),
        ScriptNormalizer::new(config.voice.unknown_speaker),
        Arc::new(assembler),
        Duration::from_secs(config.pipeline.timeout_secs),
    )
    .with_output_root(&config.storage.output_dir))
}
