//! Audio Context - 分段音频与合成结果

use super::pcm::{frames_for_ms, ms_for_frames, remix_channels, resample_linear};

/// 单句对白解码后的音频
///
/// 不变量: samples 为交错 f32，长度是 channels 的整数倍
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// 在对白序列中的位置
    pub index: usize,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioSegment {
    pub fn new(index: usize, samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            index,
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_ms(&self) -> u64 {
        ms_for_frames(self.frames(), self.sample_rate)
    }
}

/// 合成音频累加器
///
/// 以第一个追加的分段确定采样率和声道数，后续分段按需转换。
/// 导出时按值消费，导出后不能再修改。
#[derive(Debug, Clone, Default)]
pub struct CombinedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    segment_count: usize,
    gap_count: usize,
}

impl CombinedAudio {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 追加一个分段
    pub fn append(&mut self, segment: AudioSegment) {
        if self.segment_count == 0 && self.samples.is_empty() {
            self.sample_rate = segment.sample_rate;
            self.channels = segment.channels;
        }

        let mut samples = segment.samples;
        if segment.channels != self.channels {
            samples = remix_channels(&samples, segment.channels, self.channels);
        }
        if segment.sample_rate != self.sample_rate {
            samples = resample_linear(&samples, segment.sample_rate, self.sample_rate, self.channels);
        }

        self.samples.extend_from_slice(&samples);
        self.segment_count += 1;
    }

    /// 追加静音
    pub fn append_silence(&mut self, duration_ms: u64) {
        let frames = frames_for_ms(duration_ms, self.sample_rate);
        self.samples
            .resize(self.samples.len() + frames * self.channels as usize, 0.0);
        self.gap_count += 1;
    }

    /// 按顺序拼接分段，分段之间插入固定静音（最后一段之后不插入）
    pub fn concat(segments: impl IntoIterator<Item = AudioSegment>, pause_ms: u64) -> Self {
        let mut combined = Self::empty();
        for segment in segments {
            if combined.segment_count > 0 {
                combined.append_silence(pause_ms);
            }
            combined.append(segment);
        }
        combined
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn gap_count(&self) -> usize {
        self.gap_count
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_ms(&self) -> u64 {
        ms_for_frames(self.frames(), self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(index: usize, ms: u64, sample_rate: u32) -> AudioSegment {
        let frames = frames_for_ms(ms, sample_rate);
        AudioSegment::new(index, vec![0.25; frames], sample_rate, 1)
    }

    #[test]
    fn test_segment_duration() {
        assert_eq!(tone(0, 1200, 16000).duration_ms(), 1200);
    }

    #[test]
    fn test_concat_inserts_gaps_between_segments_only() {
        let segments = vec![tone(0, 1000, 16000), tone(1, 300, 16000), tone(2, 700, 16000)];
        let combined = CombinedAudio::concat(segments, 500);

        assert_eq!(combined.segment_count(), 3);
        assert_eq!(combined.gap_count(), 2);
        assert_eq!(combined.duration_ms(), 1000 + 300 + 700 + 2 * 500);
        // 最后一段之后没有静音
        assert_eq!(*combined.samples().last().unwrap(), 0.25);
    }

    #[test]
    fn test_concat_single_segment_has_no_gap() {
        let combined = CombinedAudio::concat(vec![tone(0, 400, 16000)], 500);
        assert_eq!(combined.gap_count(), 0);
        assert_eq!(combined.duration_ms(), 400);
    }

    #[test]
    fn test_concat_empty() {
        let combined = CombinedAudio::concat(Vec::new(), 500);
        assert!(combined.is_empty());
        assert_eq!(combined.duration_ms(), 0);
    }

    #[test]
    fn test_mismatched_segment_is_converted() {
        let first = tone(0, 1000, 16000);
        let second = AudioSegment::new(1, vec![0.5; 2 * 32000], 32000, 2);
        let combined = CombinedAudio::concat(vec![first, second], 0);

        assert_eq!(combined.sample_rate(), 16000);
        assert_eq!(combined.channels(), 1);
        assert_eq!(combined.duration_ms(), 2000);
    }
}
