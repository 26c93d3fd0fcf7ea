//! Language Model Port - 文本生成能力抽象
//!
//! 每个流水线阶段通过该端口调用外部大模型，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// 大模型调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API key missing: set {0}")]
    ApiKeyMissing(&'static str),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 文本生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// 系统提示（阶段角色、目标、背景）
    pub system: String,
    /// 用户提示（任务描述 + 上游上下文）
    pub user: String,
    /// 模型标识，如 `openai/gpt-4o`
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Language Model Port
#[async_trait]
pub trait LanguageModelPort: Send + Sync {
    /// 执行一次文本生成，返回模型的自由文本输出
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
