//! Symphonia Codec - 基于 symphonia 的分段解码与导出编码
//!
//! 支持：
//! - 分段解码：WAV / MP3（symphonia 探测），`pcm_<rate>` 原始 s16le 单声道
//! - 导出编码：WAV、Opus (OGG 容器)、MP3 (LAME)

use mp3lame_encoder::{Bitrate, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    output_format_extension, AudioCodecPort, AudioFormat, CodecError, EncodedAudio,
};
use crate::domain::audio::{remix_channels, resample_linear, AudioSegment, CombinedAudio};

/// 默认 Opus 比特率
const DEFAULT_OPUS_BITRATE: u32 = 64_000;

/// LAME 支持的采样率
const MP3_SAMPLE_RATES: &[u32] = &[8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Symphonia 编解码器
pub struct SymphoniaCodec {
    opus_bitrate: u32,
}

impl SymphoniaCodec {
    pub fn new(opus_bitrate: u32) -> Self {
        Self { opus_bitrate }
    }

    /// 使用 symphonia 探测并解码
    fn decode_container(&self, data: &[u8], format_hint: &str) -> Result<(Vec<f32>, u32, u16), CodecError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if data.starts_with(b"RIFF") {
            hint.with_extension("wav");
        } else {
            hint.with_extension(output_format_extension(format_hint));
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| CodecError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| CodecError::DecodingError("No audio track found".to_string()))?;

        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| CodecError::UnsupportedFormat(format!("No decoder: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(CodecError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(error = %e, "Decode error (skipping packet)");
                    continue;
                }
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual_samples]);
        }

        let sample_rate = sample_rate
            .ok_or_else(|| CodecError::DecodingError("Unknown sample rate".to_string()))?;
        let channels = channels
            .ok_or_else(|| CodecError::DecodingError("Unknown channel count".to_string()))?;

        Ok((samples, sample_rate, channels))
    }

    /// 将合成音频编码为 Opus (OGG 容器)
    fn encode_opus(&self, audio: &CombinedAudio) -> Result<Vec<u8>, CodecError> {
        // Opus 仅支持单声道或立体声
        let channel_count: u16 = if audio.channels() == 1 { 1 } else { 2 };
        let stereo;
        let source: &[f32] = if audio.channels() > 2 {
            stereo = remix_channels(audio.samples(), audio.channels(), 2);
            &stereo
        } else {
            audio.samples()
        };

        let sample_rate = opus_compatible_sample_rate(audio.sample_rate());
        let samples = resample_linear(source, audio.sample_rate(), sample_rate, channel_count);

        let channels = if channel_count == 1 {
            Channels::Mono
        } else {
            Channels::Stereo
        };

        let mut encoder = Encoder::new(sample_rate, channels, Application::Voip).map_err(|e| {
            CodecError::EncodingError(format!("Failed to create Opus encoder: {}", e))
        })?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(self.opus_bitrate as i32))
            .map_err(|e| CodecError::EncodingError(format!("Failed to set bitrate: {}", e)))?;

        let pre_skip = encoder.get_lookahead().map(|l| l as u16).unwrap_or(312);

        let pcm_i16: Vec<i16> = samples.iter().map(|&s| to_i16(s)).collect();

        // 20ms 帧
        let frame_size = (sample_rate as usize * 20) / 1000;
        let samples_per_frame = frame_size * channel_count as usize;

        let mut ogg_data = Vec::new();
        {
            let mut packet_writer = PacketWriter::new(&mut ogg_data);

            packet_writer
                .write_packet(
                    opus_head(channel_count as u8, sample_rate, pre_skip),
                    0,
                    ogg::PacketWriteEndInfo::EndPage,
                    0,
                )
                .map_err(|e| CodecError::EncodingError(format!("Failed to write Opus head: {}", e)))?;

            packet_writer
                .write_packet(opus_tags(), 0, ogg::PacketWriteEndInfo::EndPage, 0)
                .map_err(|e| CodecError::EncodingError(format!("Failed to write Opus tags: {}", e)))?;

            let mut output_buf = vec![0u8; 4000];

            // granule position 以 48kHz 计
            let granule_scale = 48000.0 / sample_rate as f64;
            let frame_granule = (frame_size as f64 * granule_scale) as u64;
            let mut granule_pos = (pre_skip as f64 * granule_scale) as u64;

            let flush_frames = (pre_skip as usize).div_ceil(samples_per_frame).max(1);
            let silence_frame = vec![0i16; samples_per_frame];

            let frames = pcm_i16
                .chunks(samples_per_frame)
                .map(|chunk| {
                    let mut frame = chunk.to_vec();
                    frame.resize(samples_per_frame, 0);
                    frame
                })
                .chain(std::iter::repeat(silence_frame).take(flush_frames));
            let total_frames = pcm_i16.len().div_ceil(samples_per_frame) + flush_frames;

            for (position, frame) in frames.enumerate() {
                let encoded_len = encoder
                    .encode(&frame, &mut output_buf)
                    .map_err(|e| CodecError::EncodingError(format!("Opus encode failed: {}", e)))?;

                granule_pos += frame_granule;

                let end_info = if position + 1 == total_frames {
                    ogg::PacketWriteEndInfo::EndStream
                } else {
                    ogg::PacketWriteEndInfo::NormalPacket
                };

                packet_writer
                    .write_packet(output_buf[..encoded_len].to_vec(), 0, end_info, granule_pos)
                    .map_err(|e| {
                        CodecError::EncodingError(format!("Failed to write Opus packet: {}", e))
                    })?;
            }
        }

        Ok(ogg_data)
    }

    /// 将合成音频编码为 128kbps MP3
    fn encode_mp3(&self, audio: &CombinedAudio) -> Result<Vec<u8>, CodecError> {
        let channel_count: u16 = if audio.channels() == 1 { 1 } else { 2 };
        let stereo;
        let source: &[f32] = if audio.channels() > 2 {
            stereo = remix_channels(audio.samples(), audio.channels(), 2);
            &stereo
        } else {
            audio.samples()
        };

        let sample_rate = mp3_compatible_sample_rate(audio.sample_rate());
        let samples = resample_linear(source, audio.sample_rate(), sample_rate, channel_count);
        let pcm_i16: Vec<i16> = samples.iter().map(|&s| to_i16(s)).collect();

        let build_err = |e: mp3lame_encoder::BuildError| {
            CodecError::EncodingError(format!("Failed to configure MP3 encoder: {:?}", e))
        };
        let mut builder = mp3lame_encoder::Builder::new().ok_or_else(|| {
            CodecError::EncodingError("Failed to create MP3 encoder".to_string())
        })?;
        builder
            .set_num_channels(channel_count as u8)
            .map_err(build_err)?;
        builder.set_sample_rate(sample_rate).map_err(build_err)?;
        builder.set_brate(Bitrate::Kbps128).map_err(build_err)?;
        builder.set_quality(Quality::Good).map_err(build_err)?;
        let mut encoder = builder.build().map_err(build_err)?;

        let encode_err = |e: mp3lame_encoder::EncodeError| {
            CodecError::EncodingError(format!("MP3 encode failed: {:?}", e))
        };

        let mut mp3_data = Vec::new();
        mp3_data.reserve(mp3lame_encoder::max_required_buffer_size(pcm_i16.len()));
        if channel_count == 1 {
            encoder
                .encode_to_vec(MonoPcm(&pcm_i16), &mut mp3_data)
                .map_err(encode_err)?;
        } else {
            encoder
                .encode_to_vec(InterleavedPcm(&pcm_i16), &mut mp3_data)
                .map_err(encode_err)?;
        }

        // 刷出编码器内剩余的帧
        mp3_data.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut mp3_data)
            .map_err(encode_err)?;

        Ok(mp3_data)
    }
}

impl Default for SymphoniaCodec {
    fn default() -> Self {
        Self::new(DEFAULT_OPUS_BITRATE)
    }
}

impl AudioCodecPort for SymphoniaCodec {
    fn decode(
        &self,
        index: usize,
        data: &[u8],
        format_hint: &str,
    ) -> Result<AudioSegment, CodecError> {
        if data.is_empty() {
            return Err(CodecError::InvalidInput(format!(
                "segment {} is empty",
                index
            )));
        }

        let (samples, sample_rate, channels) = match raw_pcm_rate(format_hint) {
            Some(rate) => (decode_pcm_s16le(data), rate, 1),
            None => self.decode_container(data, format_hint)?,
        };

        let segment = AudioSegment::new(index, samples, sample_rate, channels);
        tracing::debug!(
            segment = index,
            sample_rate,
            channels,
            duration_ms = segment.duration_ms(),
            "Decoded segment"
        );
        Ok(segment)
    }

    fn encode(
        &self,
        audio: &CombinedAudio,
        format: AudioFormat,
    ) -> Result<EncodedAudio, CodecError> {
        if audio.is_empty() {
            return Err(CodecError::InvalidInput("no audio to encode".to_string()));
        }

        let (data, format) = match format {
            AudioFormat::Wav => (
                encode_wav(audio.samples(), audio.sample_rate(), audio.channels()),
                AudioFormat::Wav,
            ),
            AudioFormat::Opus => {
                let data = self.encode_opus(audio)?;
                tracing::debug!(
                    opus_size = data.len(),
                    bitrate = self.opus_bitrate,
                    "Encoded to Opus"
                );
                (data, AudioFormat::Opus)
            }
            AudioFormat::Mp3 => {
                let data = self.encode_mp3(audio)?;
                tracing::debug!(mp3_size = data.len(), "Encoded to MP3");
                (data, AudioFormat::Mp3)
            }
        };

        Ok(EncodedAudio {
            data,
            format,
            duration_ms: audio.duration_ms(),
        })
    }
}

/// 将交错 f32 样本编码为 16 位 PCM WAV
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = channels * (bits_per_sample / 8);

    let data_size = samples.len() * 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for &sample in samples {
        wav.extend_from_slice(&to_i16(sample).to_le_bytes());
    }

    wav
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// `pcm_16000` → `Some(16000)`
fn raw_pcm_rate(format_hint: &str) -> Option<u32> {
    let mut parts = format_hint.split('_');
    match (parts.next(), parts.next()) {
        (Some(codec), Some(rate)) if codec.eq_ignore_ascii_case("pcm") => rate.parse().ok(),
        _ => None,
    }
}

fn decode_pcm_s16le(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect()
}

/// Opus 支持: 8000, 12000, 16000, 24000, 48000
fn opus_compatible_sample_rate(sample_rate: u32) -> u32 {
    match sample_rate {
        8000 | 12000 | 16000 | 24000 | 48000 => sample_rate,
        r if r <= 8000 => 8000,
        r if r <= 12000 => 12000,
        r if r <= 16000 => 16000,
        r if r <= 24000 => 24000,
        _ => 48000,
    }
}

fn mp3_compatible_sample_rate(sample_rate: u32) -> u32 {
    if MP3_SAMPLE_RATES.contains(&sample_rate) {
        sample_rate
    } else {
        44100
    }
}

/// Opus Head 包 (RFC 7845)
fn opus_head(channels: u8, sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

fn opus_tags() -> Vec<u8> {
    let vendor = env!("CARGO_PKG_NAME");
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes());
    tags
}
