// 缓存模块错误类型定义
//
// 定义了持久化存储读写中可能出现的各种错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 缓存存储的统一错误类型
///
/// 这些错误在缓存层内部被吸收：读取失败视为未命中，写入失败只记录日志，
/// 调用方在没有缓存的情况下继续执行
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("存储目录不可用: {0}")]
    DirectoryUnavailable(PathBuf),

    #[error("存储锁已损坏")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let storage: StorageError = err.into();
        assert!(matches!(storage, StorageError::Json(_)));
        assert!(storage.to_string().starts_with("JSON 序列化错误"));
    }

    #[test]
    fn test_directory_error_display() {
        let err = StorageError::DirectoryUnavailable(PathBuf::from("/nope"));
        assert!(err.to_string().contains("/nope"));
    }
}
