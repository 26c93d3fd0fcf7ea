//! Audio Assembler - 逐句语音合成与有序拼接
//!
//! 1. 每句对白并发合成（每次运行的并发上限 + 进程级共享上限），字节流写入本次运行的临时目录后解码
//! 2. 按对白序号（而非完成顺序）拼接，分段之间插入固定静音
//! 3. 一次性导出到目标路径（先写 `.partial` 再重命名）
//! 4. 临时目录由租约管理，最后一个持有者（包括仍在写入的阻塞任务）释放时删除

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::application::ports::{
    generate_cache_key, AudioCodecPort, AudioFormat, CacheMetadata, CodecError, ScratchError,
    ScratchLease, ScratchStoragePort, SynthesisCachePort, SynthesisRequest, TtsEnginePort,
    TtsError,
};
use crate::domain::audio::{AudioSegment, CombinedAudio};
use crate::domain::script::{RunId, Speaker, Utterance};

/// 组装错误
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No utterances to synthesize")]
    EmptyConversation,

    #[error("Synthesis failed for utterance {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: TtsError,
    },

    #[error("Scratch storage error: {0}")]
    Storage(#[from] ScratchError),

    #[error("Audio codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to export {path}: {message}")]
    Export { path: String, message: String },

    #[error("Synthesis task failed: {0}")]
    Task(String),
}

/// 音色与合成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSettings {
    pub host_voice_id: String,
    pub guest_voice_id: String,
    pub model_id: String,
    pub output_format: String,
    /// 分段之间的静音（毫秒）
    pub pause_duration_ms: u64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            host_voice_id: "iP95p4xoKVk53GoZ742B".to_string(),
            guest_voice_id: "cgSgspJ2msm6clMCkdW9".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            pause_duration_ms: 500,
        }
    }
}

impl VoiceSettings {
    pub fn voice_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Host => &self.host_voice_id,
            Speaker::Guest => &self.guest_voice_id,
        }
    }

    fn request_for(&self, utterance: &Utterance) -> SynthesisRequest {
        SynthesisRequest {
            text: utterance.text.clone(),
            voice_id: self.voice_for(utterance.speaker).to_string(),
            model_id: self.model_id.clone(),
            output_format: self.output_format.clone(),
        }
    }
}

/// 组装器配置
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub voice: VoiceSettings,
    /// 单次运行的最大并发合成数
    pub max_concurrent: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            voice: VoiceSettings::default(),
            max_concurrent: 4,
        }
    }
}

/// 组装结果
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output_file: PathBuf,
    /// 实际写出的格式
    pub format: AudioFormat,
    pub duration_ms: u64,
    /// 按对白顺序的分段时长
    pub segment_durations_ms: Vec<u64>,
    pub gap_count: usize,
    pub cache_hits: usize,
}

/// 已解码的分段
struct DecodedSegment {
    index: usize,
    audio: AudioSegment,
    from_cache: bool,
}

/// 单句合成任务共享的依赖
#[derive(Clone)]
struct SynthesisContext {
    tts_engine: Arc<dyn TtsEnginePort>,
    codec: Arc<dyn AudioCodecPort>,
    scratch: Arc<dyn ScratchStoragePort>,
    cache: Option<Arc<dyn SynthesisCachePort>>,
    lease: ScratchLease,
}

/// 音频组装器
pub struct AudioAssembler {
    config: AssemblerConfig,
    tts_engine: Arc<dyn TtsEnginePort>,
    codec: Arc<dyn AudioCodecPort>,
    scratch: Arc<dyn ScratchStoragePort>,
    cache: Option<Arc<dyn SynthesisCachePort>>,
    /// 跨运行共享的合成并发上限
    global_limit: Arc<Semaphore>,
}

impl AudioAssembler {
    pub fn new(
        config: AssemblerConfig,
        tts_engine: Arc<dyn TtsEnginePort>,
        codec: Arc<dyn AudioCodecPort>,
        scratch: Arc<dyn ScratchStoragePort>,
        global_limit: Arc<Semaphore>,
    ) -> Self {
        Self {
            config,
            tts_engine,
            codec,
            scratch,
            cache: None,
            global_limit,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SynthesisCachePort>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.config.voice
    }

    /// 合成并导出整段对白
    pub async fn assemble(
        &self,
        run_id: RunId,
        utterances: &[Utterance],
        output: &Path,
    ) -> Result<AssemblyReport, AssemblyError> {
        if utterances.is_empty() {
            return Err(AssemblyError::EmptyConversation);
        }
        let format = AudioFormat::from_path(output)?;

        let lease = self.scratch.open_run(run_id);
        let result = self.assemble_with(lease, utterances, output, format).await;

        match &result {
            Ok(report) => tracing::info!(
                run_id = %run_id,
                output = %report.output_file.display(),
                segments = report.segment_durations_ms.len(),
                duration_ms = report.duration_ms,
                cache_hits = report.cache_hits,
                "Podcast audio exported"
            ),
            Err(e) => tracing::error!(run_id = %run_id, error = %e, "Audio assembly failed"),
        }

        result
    }

    async fn assemble_with(
        &self,
        lease: ScratchLease,
        utterances: &[Utterance],
        output: &Path,
        format: AudioFormat,
    ) -> Result<AssemblyReport, AssemblyError> {
        let segments = self.synthesize_all(lease, utterances).await?;
        let cache_hits = segments.iter().filter(|s| s.from_cache).count();

        let pause_ms = self.config.voice.pause_duration_ms;
        let mut combined = CombinedAudio::empty();
        let mut segment_durations_ms = Vec::with_capacity(segments.len());

        // 严格按对白序号拼接
        for segment in segments {
            segment_durations_ms.push(segment.audio.duration_ms());
            if combined.segment_count() > 0 {
                combined.append_silence(pause_ms);
            }
            combined.append(segment.audio);
        }

        let gap_count = combined.gap_count();
        let duration_ms = combined.duration_ms();

        let codec = self.codec.clone();
        let encoded = tokio::task::spawn_blocking(move || codec.encode(&combined, format))
            .await
            .map_err(|e| AssemblyError::Task(e.to_string()))??;

        write_atomically(output, encoded.data).await?;

        Ok(AssemblyReport {
            output_file: output.to_path_buf(),
            format: encoded.format,
            duration_ms,
            segment_durations_ms,
            gap_count,
            cache_hits,
        })
    }

    /// 并发合成并解码全部对白，结果按序号排列
    async fn synthesize_all(
        &self,
        lease: ScratchLease,
        utterances: &[Utterance],
    ) -> Result<Vec<DecodedSegment>, AssemblyError> {
        let run_limit = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let context = SynthesisContext {
            tts_engine: self.tts_engine.clone(),
            codec: self.codec.clone(),
            scratch: self.scratch.clone(),
            cache: self.cache.clone(),
            lease,
        };
        let mut tasks = JoinSet::new();

        for (index, utterance) in utterances.iter().enumerate() {
            let request = self.config.voice.request_for(utterance);
            let context = context.clone();
            let run_limit = run_limit.clone();
            let global_limit = self.global_limit.clone();

            tasks.spawn(async move {
                let _run_permit = run_limit
                    .acquire_owned()
                    .await
                    .map_err(|e| AssemblyError::Task(e.to_string()))?;
                let _global_permit = global_limit
                    .acquire_owned()
                    .await
                    .map_err(|e| AssemblyError::Task(e.to_string()))?;

                synthesize_one(&context, index, request).await
            });
        }
        drop(context);

        let mut slots: Vec<Option<DecodedSegment>> =
            (0..utterances.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| AssemblyError::Task(e.to_string()))
                .and_then(|r| r);

            match outcome {
                Ok(segment) => {
                    let index = segment.index;
                    slots[index] = Some(segment);
                }
                Err(e) => {
                    // 一句失败则中止整次运行
                    tasks.shutdown().await;
                    return Err(e);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    AssemblyError::Task(format!("utterance {} produced no audio", index))
                })
            })
            .collect()
    }
}

fn cache_key_for(request: &SynthesisRequest) -> String {
    generate_cache_key(
        &request.text,
        &request.voice_id,
        &request.model_id,
        &request.output_format,
    )
}

/// 合成并解码一句对白
///
/// 缓存命中但无法解码的条目会被删除并重新合成；只有解码成功的结果才写入缓存
async fn synthesize_one(
    context: &SynthesisContext,
    index: usize,
    request: SynthesisRequest,
) -> Result<DecodedSegment, AssemblyError> {
    let run_id = context.lease.run_id();

    if let Some(cache) = &context.cache {
        let key = cache_key_for(&request);
        match cache.get(&key).await {
            Ok(Some(data)) => {
                let (_, decoded) =
                    decode_blocking(context.codec.clone(), index, data, &request.output_format)
                        .await?;
                match decoded {
                    Ok(audio) => {
                        tracing::debug!(run_id = %run_id, index, "Synthesis cache hit");
                        return Ok(DecodedSegment {
                            index,
                            audio,
                            from_cache: true,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(
                            run_id = %run_id,
                            cache_key = %key,
                            error = %e,
                            "Cached audio cannot be decoded, evicting"
                        );
                        if let Err(e) = cache.remove(&key).await {
                            tracing::warn!(cache_key = %key, error = %e, "Failed to evict cache entry");
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cache_key = %key, error = %e, "Synthesis cache lookup failed"),
        }
    }

    tracing::debug!(
        run_id = %run_id,
        index,
        voice_id = %request.voice_id,
        text_len = request.text.len(),
        "Synthesizing utterance"
    );

    let stream = context
        .tts_engine
        .synthesize(request.clone())
        .await
        .map_err(|e| AssemblyError::Synthesis { index, source: e })?;

    let path = context
        .scratch
        .save_segment(&context.lease, index, request.file_extension(), stream)
        .await
        .map_err(|e| match e {
            ScratchError::StreamError(message) => AssemblyError::Synthesis {
                index,
                source: TtsError::InvalidResponse(message),
            },
            other => AssemblyError::Storage(other),
        })?;

    let data = context.scratch.read_segment(&path).await?;
    context.scratch.remove_segment(&path).await?;

    let (data, decoded) =
        decode_blocking(context.codec.clone(), index, data, &request.output_format).await?;
    let audio = decoded?;

    if let Some(cache) = &context.cache {
        store_in_cache(cache.as_ref(), &request, data).await;
    }

    Ok(DecodedSegment {
        index,
        audio,
        from_cache: false,
    })
}

/// 在阻塞线程池中解码，原始字节随结果一并返回
async fn decode_blocking(
    codec: Arc<dyn AudioCodecPort>,
    index: usize,
    data: Vec<u8>,
    format_hint: &str,
) -> Result<(Vec<u8>, Result<AudioSegment, CodecError>), AssemblyError> {
    let format_hint = format_hint.to_string();
    tokio::task::spawn_blocking(move || {
        let decoded = codec.decode(index, &data, &format_hint);
        (data, decoded)
    })
    .await
    .map_err(|e| AssemblyError::Task(e.to_string()))
}

async fn store_in_cache(
    cache: &dyn SynthesisCachePort,
    request: &SynthesisRequest,
    data: Vec<u8>,
) {
    let key = cache_key_for(request);
    let metadata = CacheMetadata {
        voice_id: request.voice_id.clone(),
        model_id: request.model_id.clone(),
        output_format: request.output_format.clone(),
        text_len: request.text.len(),
    };
    if let Err(e) = cache.put(&key, data, metadata).await {
        tracing::warn!(cache_key = %key, error = %e, "Failed to cache synthesized audio");
    }
}

/// 先写入同目录下的 `.partial` 文件再重命名，避免留下写了一半的输出
///
/// 写入在一个阻塞任务中完成；调用方被丢弃后该任务不再重命名，并删除 `.partial`
async fn write_atomically(path: &Path, data: Vec<u8>) -> Result<(), AssemblyError> {
    let abandoned = Arc::new(AtomicBool::new(false));
    let _abandon_on_drop = AbandonOnDrop(abandoned.clone());
    let target = path.to_path_buf();

    tokio::task::spawn_blocking(move || export_blocking(&target, &data, &abandoned))
        .await
        .map_err(|e| AssemblyError::Task(e.to_string()))?
        .map_err(|message| AssemblyError::Export {
            path: path.display().to_string(),
            message,
        })
}

fn export_blocking(path: &Path, data: &[u8], abandoned: &AtomicBool) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let result = std::fs::write(&partial, data)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            if abandoned.load(Ordering::SeqCst) {
                return Err("export abandoned".to_string());
            }
            std::fs::rename(&partial, path).map_err(|e| e.to_string())
        });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

/// 导出 future 被丢弃时置位
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
