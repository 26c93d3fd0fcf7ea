//! PCM 采样工具：重采样、声道转换、静音

/// 简单线性重采样（交错采样）
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32, channels: u16) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || channels == 0 {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let channel_count = channels as usize;
    let frame_count = samples.len() / channel_count;
    let new_frame_count = (frame_count as f64 * ratio).round() as usize;
    let mut resampled = Vec::with_capacity(new_frame_count * channel_count);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = (src_pos as usize).min(frame_count - 1);
        let frac = (src_pos - src_idx as f64) as f32;
        let next_idx = (src_idx + 1).min(frame_count - 1);

        for ch in 0..channel_count {
            let s0 = samples[src_idx * channel_count + ch];
            let s1 = samples[next_idx * channel_count + ch];
            // 线性插值
            resampled.push(s0 + (s1 - s0) * frac);
        }
    }

    resampled
}

/// 转换声道数
///
/// 单声道扩展为多声道时复制；多声道缩为单声道时取平均；
/// 其他情况按声道序号截断或补最后一个声道
pub fn remix_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let from = from as usize;
    let to = to as usize;
    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                out.push(frame[ch.min(from - 1)]);
            }
        }
    }

    out
}

/// 指定时长对应的帧数
pub fn frames_for_ms(duration_ms: u64, sample_rate: u32) -> usize {
    (duration_ms * sample_rate as u64 / 1000) as usize
}

/// 帧数对应的时长（毫秒）
pub fn ms_for_frames(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    frames as u64 * 1000 / sample_rate as u64
}
