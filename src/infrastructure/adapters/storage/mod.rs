//! Storage Adapter - 临时分段文件存储

mod scratch_storage;

pub use scratch_storage::FileScratchStorage;
