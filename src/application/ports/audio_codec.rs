//! Audio Codec Port - 音频编解码抽象
//!
//! 解码: TTS 返回的分段音频 → PCM 分段
//! 编码: 合成后的 PCM → 导出格式（WAV、Opus）

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::audio::{AudioSegment, CombinedAudio};

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 音频导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
    /// Opus (OGG 容器)
    Opus,
    Mp3,
}

impl AudioFormat {
    /// 根据输出路径的扩展名推断格式
    pub fn from_path(path: &Path) -> Result<Self, CodecError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                CodecError::UnsupportedFormat(format!(
                    "missing file extension: {}",
                    path.display()
                ))
            })?;
        ext.parse()
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Wav => write!(f, "wav"),
            AudioFormat::Opus => write!(f, "opus"),
            AudioFormat::Mp3 => write!(f, "mp3"),
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "opus" | "ogg" => Ok(AudioFormat::Opus),
            "mp3" => Ok(AudioFormat::Mp3),
            _ => Err(CodecError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 编码结果
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub data: Vec<u8>,
    /// 实际写出的格式（不支持的格式会回退为 WAV）
    pub format: AudioFormat,
    pub duration_ms: u64,
}

/// Audio Codec Port
pub trait AudioCodecPort: Send + Sync {
    /// 解码一个分段
    ///
    /// `format_hint` 为 TTS 的输出编码（如 `mp3_44100_128`、`pcm_16000`）
    fn decode(
        &self,
        index: usize,
        data: &[u8],
        format_hint: &str,
    ) -> Result<AudioSegment, CodecError>;

    /// 编码合成后的音频
    fn encode(&self, audio: &CombinedAudio, format: AudioFormat)
        -> Result<EncodedAudio, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            AudioFormat::from_path(Path::new("out/podcast.MP3")).unwrap(),
            AudioFormat::Mp3
        );
        assert_eq!(
            AudioFormat::from_path(Path::new("podcast.ogg")).unwrap(),
            AudioFormat::Opus
        );
        assert!(AudioFormat::from_path(Path::new("podcast")).is_err());
        assert!(AudioFormat::from_path(Path::new("podcast.flac")).is_err());
    }
}
