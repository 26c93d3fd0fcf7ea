//! Audio Context - 音频组装上下文
//!
//! 职责:
//! - 分段音频（每句对白一个）
//! - 按顺序拼接并插入静音的合成累加器
//! - PCM 重采样与声道转换

mod pcm;
mod segment;

pub use pcm::{frames_for_ms, ms_for_frames, remix_channels, resample_linear};
pub use segment::{AudioSegment, CombinedAudio};
