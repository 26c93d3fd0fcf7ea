//! Sled-based LRU Synthesis Cache Implementation

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{CacheError, CacheMetadata, CacheStats, SynthesisCachePort};

const ENTRY_PREFIX: &str = "cache:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/tts_cache.sled".to_string(),
            max_size_bytes: 1024 * 1024 * 1024, // 1GB
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    voice_id: String,
    model_id: String,
    output_format: String,
    text_len: usize,
    last_accessed: i64,
    created_at: i64,
}

/// Sled 合成缓存
pub struct SledSynthesisCache {
    db: Db,
    max_size_bytes: u64,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledSynthesisCache {
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledSynthesisCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        Self::new(&SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
        })
    }

    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix(ENTRY_PREFIX) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    /// LRU 淘汰一个条目，缓存为空时返回 false
    fn evict_lru(&self) -> Result<bool, CacheError> {
        let mut oldest: Option<(sled::IVec, InternalCacheEntry)> = None;

        for item in self.db.scan_prefix(ENTRY_PREFIX) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, e)| entry.last_accessed < e.last_accessed)
                    .unwrap_or(true);

                if is_older {
                    oldest = Some((key, entry));
                }
            }
        }

        let Some((key, entry)) = oldest else {
            return Ok(false);
        };

        self.db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.current_size
            .fetch_sub(entry.size_bytes, Ordering::Relaxed);

        tracing::debug!(
            key = %String::from_utf8_lossy(&key),
            size_bytes = entry.size_bytes,
            "LRU evicted cache entry"
        );

        Ok(true)
    }

    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SynthesisCachePort for SledSynthesisCache {
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError> {
        let size = audio_data.len() as u64;

        if size > self.max_size_bytes {
            tracing::warn!(
                cache_key = %cache_key,
                size_bytes = size,
                max_size_bytes = self.max_size_bytes,
                "Audio larger than cache capacity, not cached"
            );
            return Ok(());
        }

        // 覆盖写入时先移除旧条目
        self.remove(cache_key).await?;

        while self.current_size.load(Ordering::Relaxed) + size > self.max_size_bytes {
            if !self.evict_lru()? {
                break;
            }
        }

        let now = Utc::now().timestamp_millis();
        let entry = InternalCacheEntry {
            audio_data,
            size_bytes: size,
            voice_id: metadata.voice_id,
            model_id: metadata.model_id,
            output_format: metadata.output_format,
            text_len: metadata.text_len,
            last_accessed: now,
            created_at: now,
        };

        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(format!("{}{}", ENTRY_PREFIX, cache_key), entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        self.current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            cache_key = %cache_key,
            size_bytes = size,
            "Audio cached"
        );

        Ok(())
    }

    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = format!("{}{}", ENTRY_PREFIX, cache_key);

        match self.db.get(&key) {
            Ok(Some(data)) => {
                let mut entry: InternalCacheEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;

                // LRU touch
                entry.last_accessed = Utc::now().timestamp_millis();
                let entry_bytes = bincode::serialize(&entry)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                self.db
                    .insert(&key, entry_bytes)
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.audio_data))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError> {
        self.db
            .contains_key(format!("{}{}", ENTRY_PREFIX, cache_key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError> {
        let key = format!("{}{}", ENTRY_PREFIX, cache_key);

        if let Some(data) = self
            .db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        {
            if let Ok(entry) = bincode::deserialize::<InternalCacheEntry>(&data) {
                self.current_size
                    .fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.db.scan_prefix(ENTRY_PREFIX).count(),
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
