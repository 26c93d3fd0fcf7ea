//! Sled 存储实现

mod synthesis_cache;

pub use synthesis_cache::{SledCacheConfig, SledSynthesisCache};
