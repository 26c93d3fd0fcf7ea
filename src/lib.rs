//! Podcastgen - 公司研究播客生成系统
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Script: 对白脚本、角色标签与规范化
//! - Pipeline: 研究 / 分析 / 撰稿 三阶段定义
//! - Audio: PCM 片段与拼接
//!
//! 应用层 (application/):
//! - Ports: LanguageModel, WebSearch, TtsEngine, AudioCodec, ScratchStorage, SynthesisCache
//! - Services: 脚本生成流水线、音频组装
//! - Commands: 播客生成命令处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: POST /generate-podcast, GET /health
//! - Adapters: OpenAI, Serper, ElevenLabs 客户端, Symphonia 编解码, 临时文件存储
//! - Persistence: Sled 合成缓存
//! - Bootstrap: 根据配置装配

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
