//! 应用层错误定义
//!
//! 统一的命令错误类型

use thiserror::Error;

use crate::application::services::{AssemblyError, PipelineError};
use crate::domain::script::ScriptParseError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("{0}")]
    Validation(String),

    /// 规范化后没有任何对白
    #[error("Generated script contains no dialogue")]
    EmptyConversation,

    /// 脚本无法解析
    #[error("Generated script is malformed: {0}")]
    MalformedScript(#[source] ScriptParseError),

    /// 内容流水线失败
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// 音频组装失败
    #[error(transparent)]
    Assembly(AssemblyError),

    /// 超过整体时限
    #[error("Podcast generation timed out after {0}s")]
    Timeout(u64),

    /// 被调用方取消
    #[error("Podcast generation was cancelled")]
    Cancelled,
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<AssemblyError> for ApplicationError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::EmptyConversation => Self::EmptyConversation,
            other => Self::Assembly(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_assembly_maps_to_empty_conversation() {
        let err: ApplicationError = AssemblyError::EmptyConversation.into();
        assert!(matches!(err, ApplicationError::EmptyConversation));
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        assert_eq!(
            ApplicationError::validation("No companies provided").to_string(),
            "No companies provided"
        );
    }
}
