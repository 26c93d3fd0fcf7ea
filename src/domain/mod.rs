//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Script Context: 对白脚本与规范化
//! - Pipeline Context: 内容生成流水线的阶段描述
//! - Audio Context: 分段音频与拼接

pub mod audio;
pub mod pipeline;
pub mod script;
