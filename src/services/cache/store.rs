// 持久化键值存储
//
// 本模块提供缓存的底层存储接口及两种实现：
// - MemoryStore: 进程内存储（测试、无持久化部署）
// - FileStore: 每个键一个 JSON 文件的目录存储

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::fs;
use tracing::{debug, info};

use super::error::StorageError;

/// 字符串键值存储接口
///
/// 存储可能被外部修改（例如用户手动清空），调用方不得缓存读取结果
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// 删除键，键不存在时为空操作
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// 内存存储实现
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read()?;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write()?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write()?;
        items.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.write()?;
        items.clear();
        Ok(())
    }
}

/// 文件存储实现
///
/// 每个键对应目录下的一个 `{key}.json` 文件，文件名是百分号编码后的键，
/// 不同的键不会落到同一个文件。写入先落到临时文件再原子重命名，
/// 并发读取只会看到旧内容或完整的新内容
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 创建文件存储并确保目录存在
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|_| StorageError::DirectoryUnavailable(dir.clone()))?;
        info!("📁 Cache store directory initialized: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            ".{}.{}.{}.tmp",
            urlencoding::encode(key),
            std::process::id(),
            seq
        ))
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let temp = self.temp_path_for(key);
        fs::write(&temp, value).await?;
        if let Err(e) = fs::rename(&temp, self.path_for(key)).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                debug!("Failed to remove temp file {}: {}", temp.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut cleared = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                fs::remove_file(&path).await?;
                cleared += 1;
            }
        }
        debug!("🧹 Cleared {} cache files from {}", cleared, self.dir.display());
        Ok(())
    }
}
