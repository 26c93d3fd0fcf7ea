//! Scratch Storage Port - 出站端口
//!
//! 每次运行的临时分段音频文件存储，按 RunId 划分目录

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::tts_engine::AudioStream;
use crate::domain::script::RunId;

/// 临时存储错误
#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Synthesis stream failed: {0}")]
    StreamError(String),
}

/// 运行临时目录的租约
///
/// 可克隆，最后一个持有者释放时同步删除整个运行目录。
/// 写文件的阻塞任务各持有一份，目录不会在写入结束前被删除，也不会在删除后被重建
#[derive(Debug, Clone)]
pub struct ScratchLease {
    inner: Arc<LeaseInner>,
}

#[derive(Debug)]
struct LeaseInner {
    run_id: RunId,
    run_dir: PathBuf,
}

impl ScratchLease {
    pub fn new(run_id: RunId, run_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(LeaseInner { run_id, run_dir }),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.inner.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.inner.run_dir
    }

    /// 分段文件路径
    pub fn segment_path(&self, index: usize, extension: &str) -> PathBuf {
        self.inner
            .run_dir
            .join(format!("segment_{}.{}", index, extension))
    }
}

impl Drop for LeaseInner {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.run_dir) {
            Ok(()) => tracing::debug!(run_id = %self.run_id, "Scratch directory removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                run_id = %self.run_id,
                error = %e,
                "Failed to remove scratch directory"
            ),
        }
    }
}

/// Scratch Storage Port
#[async_trait]
pub trait ScratchStoragePort: Send + Sync {
    /// 为一次运行打开临时目录租约（目录在首次写入时创建）
    fn open_run(&self, run_id: RunId) -> ScratchLease;

    /// 将合成字节流写入分段文件，返回文件路径
    ///
    /// 写入过程持有租约；调用方被丢弃时已开始的写入仍会完成，随后由租约清理
    async fn save_segment(
        &self,
        lease: &ScratchLease,
        index: usize,
        extension: &str,
        stream: AudioStream,
    ) -> Result<PathBuf, ScratchError>;

    /// 读取分段文件
    async fn read_segment(&self, path: &Path) -> Result<Vec<u8>, ScratchError>;

    /// 删除单个分段文件（已解码的分段不再保留）
    async fn remove_segment(&self, path: &Path) -> Result<(), ScratchError>;
}
