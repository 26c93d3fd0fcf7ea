//! TTS Engine Port - 语音合成能力抽象
//!
//! 定义流式语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API key missing: set {0}")]
    ApiKeyMissing(&'static str),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}

/// 语音合成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// TTS 模型 ID
    pub model_id: String,
    /// 输出编码，如 `mp3_44100_128`
    pub output_format: String,
}

impl SynthesisRequest {
    /// 输出编码对应的文件扩展名
    pub fn file_extension(&self) -> &'static str {
        output_format_extension(&self.output_format)
    }
}

/// 可以解码拼接的合成编码
const DECODABLE_CODECS: &[&str] = &["mp3", "wav", "pcm"];

fn output_codec(output_format: &str) -> String {
    output_format
        .split('_')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// 根据输出编码推断文件扩展名（`mp3_44100_128` → `mp3`，`wav_16000` → `wav`）
pub fn output_format_extension(output_format: &str) -> &'static str {
    match output_codec(output_format).as_str() {
        "wav" => "wav",
        "pcm" => "pcm",
        _ => "mp3",
    }
}

/// 合成编码能否被解码（`opus_*`、`ulaw_*` 等不支持）
pub fn is_decodable_output_format(output_format: &str) -> bool {
    let codec = output_codec(output_format);
    DECODABLE_CODECS.contains(&codec.as_str()) && output_format.len() > codec.len()
}

/// 合成音频字节流
pub type AudioStream = BoxStream<'static, Result<Vec<u8>, TtsError>>;

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行流式语音合成
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, TtsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_extension() {
        assert_eq!(output_format_extension("mp3_44100_128"), "mp3");
        assert_eq!(output_format_extension("wav_16000"), "wav");
        assert_eq!(output_format_extension("pcm_16000"), "pcm");
        assert_eq!(output_format_extension(""), "mp3");
    }

    #[test]
    fn test_decodable_output_formats() {
        assert!(is_decodable_output_format("mp3_44100_128"));
        assert!(is_decodable_output_format("pcm_16000"));
        assert!(is_decodable_output_format("wav_22050"));
        assert!(!is_decodable_output_format("opus_48000_64"));
        assert!(!is_decodable_output_format("ulaw_8000"));
        assert!(!is_decodable_output_format("mp3"));
        assert!(!is_decodable_output_format(""));
    }
}
