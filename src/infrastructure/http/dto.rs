//! Data Transfer Objects
//!
//! HTTP 请求与响应结构

use serde::{Deserialize, Serialize};

use crate::application::{PodcastReport, DEFAULT_OUTPUT_FILE};

// ============================================================================
// Podcast DTOs
// ============================================================================

/// 生成播客请求
#[derive(Debug, Deserialize)]
pub struct GeneratePodcastRequest {
    pub companies: Vec<String>,
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

/// 生成播客响应
#[derive(Debug, Serialize)]
pub struct GeneratePodcastResponse {
    pub message: String,
    pub run_id: String,
    pub output_file: String,
    pub format: String,
    pub utterances: usize,
    pub duration_ms: u64,
}

impl From<PodcastReport> for GeneratePodcastResponse {
    fn from(report: PodcastReport) -> Self {
        let output_file = report.output_file.display().to_string();
        Self {
            message: format!("Podcast generated successfully: {}", output_file),
            run_id: report.run_id.to_string(),
            output_file,
            format: report.format.to_string(),
            utterances: report.utterances,
            duration_ms: report.duration_ms,
        }
    }
}

// ============================================================================
// Health DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
