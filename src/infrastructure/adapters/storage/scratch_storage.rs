//! File Scratch Storage - 文件系统临时分段存储
//!
//! 实现 ScratchStoragePort trait，目录结构: `<base_dir>/<run_id>/segment_<index>.<ext>`
//!
//! 合成字节流先在内存中收齐，再由一个持有租约的阻塞任务一次写入

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioStream, ScratchError, ScratchLease, ScratchStoragePort};
use crate::domain::script::RunId;

/// 文件系统临时存储
pub struct FileScratchStorage {
    /// 临时文件根目录
    base_dir: PathBuf,
}

impl FileScratchStorage {
    /// 创建新的临时存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, ScratchError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 运行的临时目录
    pub fn run_dir(&self, run_id: RunId) -> PathBuf {
        self.base_dir.join(run_id.to_string())
    }
}

#[async_trait]
impl ScratchStoragePort for FileScratchStorage {
    fn open_run(&self, run_id: RunId) -> ScratchLease {
        ScratchLease::new(run_id, self.run_dir(run_id))
    }

    async fn save_segment(
        &self,
        lease: &ScratchLease,
        index: usize,
        extension: &str,
        mut stream: AudioStream,
    ) -> Result<PathBuf, ScratchError> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ScratchError::StreamError(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(ScratchError::StreamError(format!(
                "empty audio stream for segment {}",
                index
            )));
        }

        let path = lease.segment_path(index, extension);
        let size = data.len();
        let held = lease.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || {
            let result = std::fs::create_dir_all(held.run_dir())
                .and_then(|_| std::fs::write(&target, &data));
            drop(held);
            result
        })
        .await
        .map_err(|e| ScratchError::IoError(e.to_string()))?
        .map_err(|e| ScratchError::IoError(e.to_string()))?;

        tracing::debug!(
            run_id = %lease.run_id(),
            segment = index,
            size,
            "Saved scratch segment"
        );

        Ok(path)
    }

    async fn read_segment(&self, path: &Path) -> Result<Vec<u8>, ScratchError> {
        if !path.exists() {
            return Err(ScratchError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        fs::read(path)
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))
    }

    async fn remove_segment(&self, path: &Path) -> Result<(), ScratchError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScratchError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TtsError;
    use tempfile::tempdir;

    fn stream_of(chunks: Vec<Result<Vec<u8>, TtsError>>) -> AudioStream {
        Box::pin(futures_util::stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_save_read_and_remove_segment() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let run_id = RunId::new();
        let lease = storage.open_run(run_id);

        let path = storage
            .save_segment(
                &lease,
                0,
                "mp3",
                stream_of(vec![Ok(b"fake ".to_vec()), Ok(b"audio".to_vec())]),
            )
            .await
            .unwrap();
        assert_eq!(path, storage.run_dir(run_id).join("segment_0.mp3"));

        let data = storage.read_segment(&path).await.unwrap();
        assert_eq!(data, b"fake audio");

        storage.remove_segment(&path).await.unwrap();
        assert!(!path.exists());
        // 重复删除不报错
        storage.remove_segment(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_stream_failure_leaves_no_file() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let lease = storage.open_run(RunId::new());

        let err = storage
            .save_segment(
                &lease,
                1,
                "mp3",
                stream_of(vec![
                    Ok(b"partial".to_vec()),
                    Err(TtsError::NetworkError("connection reset".to_string())),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ScratchError::StreamError(_)));
        assert!(!lease.segment_path(1, "mp3").exists());
    }

    #[tokio::test]
    async fn test_empty_stream_rejected() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let lease = storage.open_run(RunId::new());

        let err = storage
            .save_segment(&lease, 0, "mp3", stream_of(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScratchError::StreamError(_)));
    }

    #[tokio::test]
    async fn test_dropping_lease_removes_only_its_run() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let run_id = RunId::new();
        let other_run = RunId::new();
        let lease = storage.open_run(run_id);
        let other_lease = storage.open_run(other_run);

        for i in 0..3 {
            storage
                .save_segment(&lease, i, "mp3", stream_of(vec![Ok(b"data".to_vec())]))
                .await
                .unwrap();
        }
        let other_path = storage
            .save_segment(&other_lease, 0, "mp3", stream_of(vec![Ok(b"data".to_vec())]))
            .await
            .unwrap();

        drop(lease);
        assert!(!storage.run_dir(run_id).exists());
        // 其他运行不受影响
        assert!(other_path.exists());

        drop(other_lease);
        assert!(!storage.run_dir(other_run).exists());
    }
}
