//! ElevenLabs Client - 流式 TTS HTTP 客户端
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! POST {base_url}/v1/text-to-speech/{voice_id}/stream?output_format=mp3_44100_128
//! Header: xi-api-key
//! Request: {"text": "...", "model_id": "..."}  (JSON)
//! Response: 音频字节流

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{AudioStream, SynthesisRequest, TtsEnginePort, TtsError};

const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// TTS 请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for ElevenLabsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl ElevenLabsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ElevenLabs 流式 TTS 客户端
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsClientConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn stream_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        )
    }

    fn api_key(&self) -> Result<&str, TtsError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(TtsError::ApiKeyMissing(API_KEY_ENV))
    }
}

#[async_trait]
impl TtsEnginePort for ElevenLabsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, TtsError> {
        let api_key = self.api_key()?;
        let url = self.stream_url(&request.voice_id);

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            output_format = %request.output_format,
            "Sending TTS stream request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", request.output_format.as_str())])
            .header("xi-api-key", api_key)
            .json(&TtsHttpRequest {
                text: &request.text,
                model_id: &request.model_id,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TtsError::VoiceNotFound(request.voice_id));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map(|bytes| bytes.to_vec()).map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else {
                    TtsError::NetworkError(format!("Audio stream interrupted: {}", e))
                }
            })
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ElevenLabsClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ElevenLabsClientConfig::new("http://example.com:9000/")
            .with_api_key(Some("key".to_string()))
            .with_timeout(60);
        let client = ElevenLabsClient::new(config).unwrap();
        assert_eq!(
            client.stream_url("voice-1"),
            "http://example.com:9000/v1/text-to-speech/voice-1/stream"
        );
        assert_eq!(client.config.timeout_secs, 60);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = ElevenLabsClient::new(ElevenLabsClientConfig::default()).unwrap();
        let result = client
            .synthesize(SynthesisRequest {
                text: "Hi".to_string(),
                voice_id: "voice-1".to_string(),
                model_id: "eleven_multilingual_v2".to_string(),
                output_format: "mp3_44100_128".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(TtsError::ApiKeyMissing("ELEVENLABS_API_KEY"))
        ));
    }
}
