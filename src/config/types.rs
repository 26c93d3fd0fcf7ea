//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::script::UnknownSpeakerPolicy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 文本生成配置
    #[serde(default)]
    pub agent: AgentConfig,

    /// 网络搜索配置
    #[serde(default)]
    pub search: SearchConfig,

    /// 音色配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// TTS 服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 临时文件存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 合成缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 文本生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// 模型标识（`provider/model`）
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// OpenAI 兼容接口地址
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    /// 未配置时读取 `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "openai/gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_agent_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: default_agent_base_url(),
            api_key: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

/// 网络搜索配置
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// 未配置时读取 `SERPER_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// 每次搜索返回的结果数
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_base_url() -> String {
    "https://google.serper.dev".to_string()
}

fn default_results_per_query() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            api_key: None,
            results_per_query: default_results_per_query(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// 音色配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_host_voice")]
    pub host_voice_id: String,

    #[serde(default = "default_guest_voice")]
    pub guest_voice_id: String,

    /// TTS 模型 ID
    #[serde(default = "default_voice_model")]
    pub model_id: String,

    /// TTS 输出编码
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 分段之间的静音（毫秒）
    #[serde(default = "default_pause")]
    pub pause_duration_ms: u64,

    /// 未知角色标签的处理方式: guest | host | reject
    #[serde(default)]
    pub unknown_speaker: UnknownSpeakerPolicy,
}

fn default_host_voice() -> String {
    "iP95p4xoKVk53GoZ742B".to_string()
}

fn default_guest_voice() -> String {
    "cgSgspJ2msm6clMCkdW9".to_string()
}

fn default_voice_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_pause() -> u64 {
    500
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            host_voice_id: default_host_voice(),
            guest_voice_id: default_guest_voice(),
            model_id: default_voice_model(),
            output_format: default_output_format(),
            pause_duration_ms: default_pause(),
            unknown_speaker: UnknownSpeakerPolicy::default(),
        }
    }
}

/// TTS 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub base_url: String,

    /// 未配置时读取 `ELEVENLABS_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// 单次运行的最大并发合成数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 进程级最大并发合成数（跨运行共享）
    #[serde(default = "default_global_max_concurrent")]
    pub global_max_concurrent: usize,

    /// Opus 导出比特率（bps）
    #[serde(default = "default_opus_bitrate")]
    pub opus_bitrate: u32,
}

fn default_tts_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_global_max_concurrent() -> usize {
    8
}

fn default_opus_bitrate() -> u32 {
    64000
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_url(),
            api_key: None,
            timeout_secs: default_request_timeout(),
            max_concurrent: default_max_concurrent(),
            global_max_concurrent: default_global_max_concurrent(),
            opus_bitrate: default_opus_bitrate(),
        }
    }
}

/// 临时文件存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 分段临时文件根目录
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// 请求中的输出文件相对于该目录解析
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("data/tmp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// 合成缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// 最大缓存大小（字节）
    #[serde(default = "default_cache_size")]
    pub max_size_bytes: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_path() -> String {
    "data/tts_cache.sled".to_string()
}

fn default_cache_size() -> u64 {
    1024 * 1024 * 1024 // 1 GB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: default_cache_path(),
            max_size_bytes: default_cache_size(),
        }
    }
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 单次生成的整体时限（秒）
    #[serde(default = "default_pipeline_timeout")]
    pub timeout_secs: u64,
}

fn default_pipeline_timeout() -> u64 {
    900 // 15 分钟
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_pipeline_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
