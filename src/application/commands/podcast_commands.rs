//! Podcast Commands - 播客生成命令

use std::path::PathBuf;

use crate::application::ports::AudioFormat;
use crate::domain::script::RunId;

/// 默认输出文件
pub const DEFAULT_OUTPUT_FILE: &str = "company_podcast.mp3";

/// 生成播客命令
#[derive(Debug, Clone)]
pub struct GeneratePodcast {
    pub companies: Vec<String>,
    pub output_file: PathBuf,
}

impl GeneratePodcast {
    pub fn new(companies: Vec<String>) -> Self {
        Self {
            companies,
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct PodcastReport {
    pub run_id: RunId,
    pub output_file: PathBuf,
    /// 实际写出的音频格式
    pub format: AudioFormat,
    /// 对白句数
    pub utterances: usize,
    pub duration_ms: u64,
}
