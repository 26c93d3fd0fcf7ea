//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LanguageModel、WebSearch、TtsEngine、AudioCodec、ScratchStorage 等）
//! - services: 脚本生成流水线与音频组装
//! - commands: 播客生成命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod services;

// Re-exports
pub use commands::{
    handlers::GeneratePodcastHandler, GeneratePodcast, PodcastReport, DEFAULT_OUTPUT_FILE,
};

pub use error::ApplicationError;

pub use services::{
    AgentSettings, AssemblerConfig, AssemblyError, AssemblyReport, AudioAssembler,
    PipelineError, ScriptGenerator, VoiceSettings,
};
