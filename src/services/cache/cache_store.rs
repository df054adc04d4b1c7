// 带 TTL 的缓存存储
//
// 在 PersistentStore 之上提供按条目过期的语义：
// - 每次读取都重新从存储读取并校验 TTL（没有内存镜像）
// - 过期或损坏的条目在读取时删除，没有后台清理任务
// - 写入失败只返回错误，由调用方记录后继续

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::StorageError;
use super::store::PersistentStore;

/// 缓存条目
///
/// 持久化格式为 `{payload, storedAtMillis, ttlMillis}`，
/// 读取时同样接受旧格式 `{data, timestamp, ttl}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    #[serde(alias = "data")]
    pub payload: T,
    #[serde(alias = "timestamp")]
    pub stored_at_millis: i64,
    #[serde(alias = "ttl")]
    pub ttl_millis: i64,
}

impl<T> CacheEntry<T> {
    /// `now - storedAt > ttl` 时过期，恰好等于 TTL 时仍然有效
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis.saturating_sub(self.stored_at_millis) > self.ttl_millis
    }

    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.stored_at_millis).max(0)
    }
}

/// TTL 缓存
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn PersistentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// 读取未过期的负载
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_entry(key).await.map(|entry| entry.payload)
    }

    /// 读取完整条目（包含写入时间）
    pub async fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss: no entry for key {}", key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.discard(key).await;
                return None;
            }
        };

        let now = self.clock.now_millis();
        if entry.is_expired_at(now) {
            info!(
                "⏰ Cache expired for key {} (age {} ms, ttl {} ms)",
                key,
                entry.age_millis(now),
                entry.ttl_millis
            );
            self.discard(key).await;
            return None;
        }

        debug!("Cache hit for key {}", key);
        Some(entry)
    }

    /// 写入条目，覆盖旧值并以当前时间作为写入时间
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        payload: &T,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let entry = CacheEntry {
            payload,
            stored_at_millis: self.clock.now_millis(),
            ttl_millis: duration_to_millis(ttl),
        };
        let json = serde_json::to_string(&entry)?;
        self.store.set_item(key, &json).await?;
        debug!("💾 Cached entry {} (ttl {} ms)", key, entry.ttl_millis);
        Ok(())
    }

    /// 删除条目，键不存在时为空操作
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove_item(key).await
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.remove_item(key).await {
            warn!("Failed to remove cache entry {}: {}", key, e);
        }
    }
}

pub(crate) fn duration_to_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
