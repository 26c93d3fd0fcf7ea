//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_codec;
mod language_model;
mod scratch_storage;
mod synthesis_cache;
mod tts_engine;
mod web_search;

pub use audio_codec::{AudioCodecPort, AudioFormat, CodecError, EncodedAudio};
pub use language_model::{CompletionRequest, LanguageModelPort, LlmError};
pub use scratch_storage::{ScratchError, ScratchLease, ScratchStoragePort};
pub use synthesis_cache::{
    generate_cache_key, CacheError, CacheMetadata, CacheStats, SynthesisCachePort,
};
pub use tts_engine::{
    is_decodable_output_format, output_format_extension, AudioStream, SynthesisRequest, TtsEnginePort, TtsError,
};
pub use web_search::{format_search_hits, SearchError, SearchHit, WebSearchPort};
