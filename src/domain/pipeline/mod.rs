//! Pipeline Context - 内容生成流水线
//!
//! 以有序的阶段描述列表表达流水线，由单一驱动函数顺序执行

mod podcast_stages;
mod stage;

pub use podcast_stages::{
    analysis_stage, podcast_pipeline, research_stage, script_stage, SCRIPT_FORMAT_EXAMPLE,
};
pub use stage::{Capability, PipelineStage};
