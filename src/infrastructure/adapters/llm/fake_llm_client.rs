//! Fake LLM Client - 用于测试和离线运行的文本生成客户端
//!
//! 按顺序返回预设的响应，并记录收到的请求

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{CompletionRequest, LanguageModelPort, LlmError};

/// Fake Language Model
pub struct FakeLanguageModel {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLanguageModel {
    /// 依次返回给定响应，用完后返回错误
    pub fn scripted<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的请求
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModelPort for FakeLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        tracing::debug!(
            model = %request.model,
            prompt_chars = request.user.len(),
            "FakeLanguageModel: returning scripted response"
        );

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        self.responses
            .lock()
            .map_err(|e| LlmError::ServiceError(e.to_string()))?
            .pop_front()
            .ok_or_else(|| LlmError::ServiceError("no scripted response left".to_string()))
    }
}
