//! Synthesis Cache Port - 跨运行的语音合成缓存
//!
//! 相同文本 + 音色 + 模型 + 编码的合成结果可在多次运行间复用

use async_trait::async_trait;
use thiserror::Error;

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存元数据
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub text_len: usize,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Synthesis Cache Port
///
/// 基于 md5(text) + voice + model + format 的 LRU 缓存
#[async_trait]
pub trait SynthesisCachePort: Send + Sync {
    /// 存储合成结果，自动执行 LRU 淘汰
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError>;

    /// 获取合成结果，同时更新访问时间
    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError>;

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError>;

    async fn stats(&self) -> CacheStats;
}

/// 生成缓存 key
pub fn generate_cache_key(text: &str, voice_id: &str, model_id: &str, output_format: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{:x}:{}:{}:{}", digest, voice_id, model_id, output_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_stable_and_distinct() {
        let a = generate_cache_key("Hi", "v1", "m", "mp3_44100_128");
        let b = generate_cache_key("Hi", "v1", "m", "mp3_44100_128");
        let c = generate_cache_key("Hi", "v2", "m", "mp3_44100_128");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(":v1:m:mp3_44100_128"));
    }
}
