//! Application Services - 流水线服务
//!
//! - ScriptGenerator: 三阶段内容流水线
//! - AudioAssembler: 逐句合成与有序拼接

mod audio_assembler;
mod script_generator;

pub use audio_assembler::{
    AssemblerConfig, AssemblyError, AssemblyReport, AudioAssembler, VoiceSettings,
};
pub use script_generator::{
    AgentSettings, PipelineError, ScriptDraft, ScriptGenerator, StageOutput,
};
