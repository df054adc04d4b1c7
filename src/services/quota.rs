// 配额记账
//
// 按估算的单位消耗累计当前窗口内的用量，窗口固定为配置的时长（默认 24 小时）。
// 收到配额耗尽响应后标记窗口为已耗尽，窗口结束前不再发起网络请求。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::cache::cache_store::duration_to_millis;
use super::cache::CacheStore;
use crate::config::ShortsConfig;

/// 当前窗口的用量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub units_used: u32,
    pub requests: u32,
    pub exhausted: bool,
    pub window_started_millis: i64,
    pub daily_limit: u32,
}

impl QuotaUsage {
    fn fresh(now_millis: i64, daily_limit: u32) -> Self {
        Self {
            units_used: 0,
            requests: 0,
            exhausted: false,
            window_started_millis: now_millis,
            daily_limit,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.units_used)
    }
}

/// 配额记账器
#[derive(Clone)]
pub struct QuotaTracker {
    cache: CacheStore,
    key: String,
    window: Duration,
    daily_limit: u32,
}

impl QuotaTracker {
    pub fn new(cache: CacheStore, config: &ShortsConfig) -> Self {
        Self {
            cache,
            key: config.cache.quota_key.clone(),
            window: config.quota_window(),
            daily_limit: config.cache.daily_quota_limit,
        }
    }

    /// 当前窗口的用量，窗口过期后重新计数
    pub async fn usage(&self) -> QuotaUsage {
        match self.cache.get::<QuotaUsage>(&self.key).await {
            Some(usage) => usage,
            None => QuotaUsage::fresh(self.cache.now_millis(), self.daily_limit),
        }
    }

    pub async fn is_exhausted(&self) -> bool {
        self.usage().await.exhausted
    }

    /// 记录一次请求的估算消耗
    pub async fn record(&self, cost: u32) -> QuotaUsage {
        let mut usage = self.usage().await;
        usage.units_used = usage.units_used.saturating_add(cost);
        usage.requests = usage.requests.saturating_add(1);

        if usage.units_used >= usage.daily_limit {
            warn!(
                "Estimated quota usage {} reached the daily limit {}",
                usage.units_used, usage.daily_limit
            );
        }

        self.save(&usage).await;
        usage
    }

    /// 标记当前窗口配额已耗尽
    pub async fn mark_exhausted(&self) {
        let mut usage = self.usage().await;
        if usage.exhausted {
            return;
        }
        usage.exhausted = true;
        info!(
            "Quota marked exhausted after {} requests ({} units)",
            usage.requests, usage.units_used
        );
        self.save(&usage).await;
    }

    async fn save(&self, usage: &QuotaUsage) {
        let elapsed = self
            .cache
            .now_millis()
            .saturating_sub(usage.window_started_millis)
            .max(0);
        let remaining_millis = duration_to_millis(self.window).saturating_sub(elapsed).max(0);
        let ttl = Duration::from_millis(remaining_millis as u64);

        if let Err(e) = self.cache.set(&self.key, usage, ttl).await {
            warn!("Failed to persist quota usage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{ManualClock, MemoryStore};
    use std::sync::Arc;

    fn tracker(clock: Arc<ManualClock>) -> QuotaTracker {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()), clock);
        QuotaTracker::new(cache, &ShortsConfig::default())
    }

    #[tokio::test]
    async fn test_record_accumulates() {
        let clock = Arc::new(ManualClock::new(1_000));
        let quota = tracker(clock.clone());

        quota.record(100).await;
        clock.advance(60_000);
        let usage = quota.record(1).await;

        assert_eq!(usage.units_used, 101);
        assert_eq!(usage.requests, 2);
        assert_eq!(usage.window_started_millis, 1_000);
        assert_eq!(usage.remaining(), 10_000 - 101);
        assert!(!quota.is_exhausted().await);
    }

    #[tokio::test]
    async fn test_exhaustion_lasts_until_window_ends() {
        let clock = Arc::new(ManualClock::new(0));
        let quota = tracker(clock.clone());
        let day = 24 * 60 * 60 * 1000;

        quota.record(100).await;
        clock.advance(day / 2);
        quota.mark_exhausted().await;
        assert!(quota.is_exhausted().await);

        // 窗口从第一次记录开始计算，不因标记而延长
        clock.set(day);
        assert!(quota.is_exhausted().await);
        clock.set(day + 1);
        assert!(!quota.is_exhausted().await);
        assert_eq!(quota.usage().await.units_used, 0);
    }
}
