//! Fake TTS Client - 用于测试和离线运行的 TTS 客户端
//!
//! 不实际调用 TTS 服务，按文本长度生成一段 WAV 音频

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{AudioStream, SynthesisRequest, TtsEnginePort, TtsError};
use crate::domain::audio::frames_for_ms;
use crate::infrastructure::adapters::codec::encode_wav;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 生成音频的采样率
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    /// 模拟合成延迟（毫秒）
    pub latency_ms: u64,
    /// 文本包含该片段时合成失败
    pub fail_on: Option<String>,
    /// 文本包含该片段时返回无法解码的字节
    pub garbage_on: Option<String>,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            ms_per_char: 100,
            latency_ms: 0,
            fail_on: None,
            garbage_on: None,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeTtsClient initialized"
        );
        Self {
            config,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 给定文本生成音频的时长
    pub fn duration_for(&self, text: &str) -> u64 {
        text.chars().count() as u64 * self.config.ms_per_char
    }

    /// 已收到的合成请求
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeTtsClient: generating audio"
        );

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(marker) = &self.config.fail_on {
            if request.text.contains(marker.as_str()) {
                return Err(TtsError::ServiceError(format!(
                    "synthesis rejected for voice {}",
                    request.voice_id
                )));
            }
        }

        if let Some(marker) = &self.config.garbage_on {
            if request.text.contains(marker.as_str()) {
                let body = b"<html>upstream error</html>".to_vec();
                return Ok(Box::pin(futures_util::stream::iter(vec![Ok(body)])));
            }
        }

        let frames = frames_for_ms(self.duration_for(&request.text), self.config.sample_rate);
        let wav = encode_wav(&vec![0.1; frames], self.config.sample_rate, 1);

        // 分两块返回，模拟流式响应
        let split = wav.len() / 2;
        let (head, tail) = wav.split_at(split);
        let chunks = vec![Ok(head.to_vec()), Ok(tail.to_vec())];

        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}
