//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::application::ports::is_decodable_output_format;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 凭据的通用环境变量
const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const SERPER_API_KEY: &str = "SERPER_API_KEY";
const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PODCAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// 凭据未配置时回退到 `OPENAI_API_KEY`、`SERPER_API_KEY`、`ELEVENLABS_API_KEY`
///
/// # 环境变量示例
/// - `PODCAST_SERVER__PORT=8080`
/// - `PODCAST_AGENT__MODEL=openai/gpt-4o-mini`
/// - `PODCAST_VOICE__PAUSE_DURATION_MS=300`
/// - `PODCAST_TTS__MAX_CONCURRENT=2`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("agent.model", "openai/gpt-4o")?
        .set_default("agent.temperature", 0.8)?
        .set_default("agent.max_tokens", 1500)?
        .set_default("agent.base_url", "https://api.openai.com/v1")?
        .set_default("agent.timeout_secs", 120)?
        .set_default("search.base_url", "https://google.serper.dev")?
        .set_default("search.results_per_query", 5)?
        .set_default("search.timeout_secs", 30)?
        .set_default("voice.host_voice_id", "iP95p4xoKVk53GoZ742B")?
        .set_default("voice.guest_voice_id", "cgSgspJ2msm6clMCkdW9")?
        .set_default("voice.model_id", "eleven_multilingual_v2")?
        .set_default("voice.output_format", "mp3_44100_128")?
        .set_default("voice.pause_duration_ms", 500)?
        .set_default("voice.unknown_speaker", "guest")?
        .set_default("tts.base_url", "https://api.elevenlabs.io")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_concurrent", 4)?
        .set_default("tts.global_max_concurrent", 8)?
        .set_default("tts.opus_bitrate", 64000)?
        .set_default("storage.scratch_dir", "data/tmp")?
        .set_default("storage.output_dir", ".")?
        .set_default("cache.enabled", true)?
        .set_default("cache.path", "data/tts_cache.sled")?
        .set_default("cache.max_size_bytes", 1024_u64 * 1024 * 1024)?
        .set_default("pipeline.timeout_secs", 900)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: PODCAST_TTS__BASE_URL=http://tts-proxy:8080
    builder = builder.add_source(
        Environment::with_prefix("PODCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    fill_credentials(&mut app_config, |name| std::env::var(name).ok());

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 未配置的凭据从通用环境变量读取
fn fill_credentials(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let resolve = |current: &mut Option<String>, name: &str| {
        if current.as_deref().map_or(true, str::is_empty) {
            *current = lookup(name).filter(|v| !v.is_empty());
        }
    };

    resolve(&mut config.agent.api_key, OPENAI_API_KEY);
    resolve(&mut config.search.api_key, SERPER_API_KEY);
    resolve(&mut config.tts.api_key, ELEVENLABS_API_KEY);
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let fail = |message: &str| Err(ConfigError::ValidationError(message.to_string()));

    if config.server.port == 0 {
        return fail("Server port cannot be 0");
    }

    if config.agent.model.trim().is_empty() {
        return fail("Agent model cannot be empty");
    }

    if !(0.0..=2.0).contains(&config.agent.temperature) {
        return fail("Agent temperature must be within 0..=2");
    }

    if config.agent.max_tokens == 0 {
        return fail("Agent max_tokens cannot be 0");
    }

    if config.voice.host_voice_id.trim().is_empty() || config.voice.guest_voice_id.trim().is_empty()
    {
        return fail("Voice ids cannot be empty");
    }

    if config.voice.host_voice_id == config.voice.guest_voice_id {
        return fail("Host and guest voices must differ");
    }

    if !is_decodable_output_format(&config.voice.output_format) {
        return Err(ConfigError::ValidationError(format!(
            "Voice output_format {:?} cannot be decoded; use an mp3_*, pcm_* or wav_* encoding",
            config.voice.output_format
        )));
    }

    if config.tts.max_concurrent == 0 || config.tts.global_max_concurrent == 0 {
        return fail("TTS concurrency cannot be 0");
    }

    if config.pipeline.timeout_secs == 0 {
        return fail("Pipeline timeout cannot be 0");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），凭据只显示是否已设置
pub fn print_config(config: &AppConfig) {
    let key_state = |key: &Option<String>| if key.is_some() { "set" } else { "missing" };

    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Agent: model={} temperature={} max_tokens={} key={}",
        config.agent.model,
        config.agent.temperature,
        config.agent.max_tokens,
        key_state(&config.agent.api_key)
    );
    tracing::info!(
        "Search: {} key={}",
        config.search.base_url,
        key_state(&config.search.api_key)
    );
    tracing::info!(
        "TTS: {} key={} concurrency={}/{}",
        config.tts.base_url,
        key_state(&config.tts.api_key),
        config.tts.max_concurrent,
        config.tts.global_max_concurrent
    );
    tracing::info!(
        "Voices: host={} guest={} model={} format={}",
        config.voice.host_voice_id,
        config.voice.guest_voice_id,
        config.voice.model_id,
        config.voice.output_format
    );
    tracing::info!("Scratch Directory: {:?}", config.storage.scratch_dir);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("Synthesis Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::info!("Synthesis Cache: {}", config.cache.path);
    }
    tracing::info!("Pipeline Timeout: {}s", config.pipeline.timeout_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::UnknownSpeakerPolicy;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_temperature() {
        let mut config = AppConfig::default();
        config.agent.temperature = 2.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_max_tokens() {
        let mut config = AppConfig::default();
        config.agent.max_tokens = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_shared_voice() {
        let mut config = AppConfig::default();
        config.voice.guest_voice_id = config.voice.host_voice_id.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_voice() {
        let mut config = AppConfig::default();
        config.voice.host_voice_id = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_undecodable_output_format() {
        let mut config = AppConfig::default();
        config.voice.output_format = "opus_48000_64".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("opus_48000_64"));

        config.voice.output_format = "pcm_24000".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.tts.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_fill_credentials_prefers_configured_value() {
        let mut config = AppConfig::default();
        config.agent.api_key = Some("from-file".to_string());

        fill_credentials(&mut config, |name| match name {
            "OPENAI_API_KEY" => Some("from-env".to_string()),
            "ELEVENLABS_API_KEY" => Some("tts-key".to_string()),
            "SERPER_API_KEY" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.agent.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.tts.api_key.as_deref(), Some("tts-key"));
        assert_eq!(config.search.api_key, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("podcast.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[voice]
pause_duration_ms = 250
unknown_speaker = "reject"

[tts]
max_concurrent = 2
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.voice.pause_duration_ms, 250);
        assert_eq!(config.voice.unknown_speaker, UnknownSpeakerPolicy::Reject);
        assert_eq!(config.tts.max_concurrent, 2);
        assert_eq!(config.voice.model_id, "eleven_multilingual_v2");
    }
}
