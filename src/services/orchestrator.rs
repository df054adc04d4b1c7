// 拉取编排器
//
// 一次加载的流程：
// 1. 读缓存，命中直接返回
// 2. 未配置密钥时返回内置示例数据，不发起网络请求
// 3. 配额窗口已耗尽时直接报错
// 4. 依次执行回退查询链，各级原始结果累积后统一分类
// 5. 排序截断后写入缓存（写入失败只记录日志）

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache::{CacheStore, Clock, PersistentStore};
use super::classifier::ResultClassifier;
use super::fallback::{FallbackChain, TierAttempt};
use super::quota::{QuotaTracker, QuotaUsage};
use super::sample::sample_items;
use crate::config::ShortsConfig;
use crate::external::{
    FetchError, HttpClient, QueryBuilder, QueryConfig, YoutubeClient, YoutubeVideo,
};
use crate::models::{rank_and_truncate, Feed, FeedSource, VideoItem};

/// 拉取编排器
pub struct FetchOrchestrator {
    config: Arc<ShortsConfig>,
    cache: CacheStore,
    client: Option<YoutubeClient>,
    classifier: ResultClassifier,
    quota: QuotaTracker,
    chain: FallbackChain,
    clock: Arc<dyn Clock>,
    loading: AtomicBool,
}

impl FetchOrchestrator {
    pub fn new(
        config: Arc<ShortsConfig>,
        store: Arc<dyn PersistentStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = CacheStore::new(store, clock.clone());
        let client = config.api_key().map(|key| {
            YoutubeClient::new(
                http,
                QueryBuilder::new(config.api.base_url.clone(), key),
                config.request_timeout(),
            )
        });

        Self {
            classifier: ResultClassifier::new(&config),
            quota: QuotaTracker::new(cache.clone(), &config),
            chain: FallbackChain::for_config(&config),
            cache,
            client,
            clock,
            config,
            loading: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ShortsConfig {
        &self.config
    }

    /// 是否有加载正在进行
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// 加载列表
    ///
    /// 已有加载在进行时不做任何事，返回 `Ok(None)`
    pub async fn load(&self) -> Result<Option<Feed>, FetchError> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            info!("Load already in progress, ignoring request");
            return Ok(None);
        };
        self.load_exclusive().await.map(Some)
    }

    /// 删除缓存后重新加载
    pub async fn refresh(&self) -> Result<Option<Feed>, FetchError> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            info!("Load already in progress, ignoring refresh");
            return Ok(None);
        };
        let key = self.config.feed_cache_key();
        if let Err(e) = self.cache.remove(&key).await {
            warn!("Failed to invalidate cache entry {}: {}", key, e);
        }
        self.load_exclusive().await.map(Some)
    }

    /// 重试，仍然使用未过期的缓存
    pub async fn retry(&self) -> Result<Option<Feed>, FetchError> {
        self.load().await
    }

    /// 删除当前预设的缓存条目，存储错误只记录日志
    pub async fn clear_cache(&self) {
        let key = self.config.feed_cache_key();
        match self.cache.remove(&key).await {
            Ok(()) => info!("🗑️ Cleared cached shorts ({})", key),
            Err(e) => warn!("Failed to clear cache entry {}: {}", key, e),
        }
    }

    pub async fn quota_usage(&self) -> QuotaUsage {
        self.quota.usage().await
    }

    async fn load_exclusive(&self) -> Result<Feed, FetchError> {
        let key = self.config.feed_cache_key();

        if let Some(entry) = self.cache.get_entry::<Vec<VideoItem>>(&key).await {
            info!("Serving {} shorts from cache", entry.payload.len());
            let now = self.clock.now();
            return Ok(Feed {
                items: entry.payload,
                source: FeedSource::Cache,
                updated_at: Utc
                    .timestamp_millis_opt(entry.stored_at_millis)
                    .single()
                    .unwrap_or(now),
            });
        }

        match self.fetch_live().await {
            Ok(feed) => Ok(feed),
            Err(FetchError::NoCredential) => {
                info!("No YouTube API key configured, serving sample data");
                Ok(self.sample_feed())
            }
            Err(FetchError::QuotaExceeded(message)) => {
                self.quota.mark_exhausted().await;
                error!("YouTube quota exceeded: {}", message);
                Err(FetchError::QuotaExceeded(message))
            }
            Err(e) if e.is_recoverable() && self.config.sample_on_exhaustion => {
                warn!("All queries failed ({}), serving sample data", e);
                Ok(self.sample_feed())
            }
            Err(e) => {
                error!("Failed to load shorts: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_live(&self) -> Result<Feed, FetchError> {
        let client = self.client.as_ref().ok_or(FetchError::NoCredential)?;

        if self.quota.is_exhausted().await {
            return Err(FetchError::QuotaExceeded(
                "quota already exhausted for the current window".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut attempt = PooledAttempt {
            orchestrator: self,
            client,
            pool: Vec::new(),
            now,
        };
        let items = self.chain.first_success(&mut attempt).await?;
        let ranked = rank_and_truncate(items, self.config.display_count);

        let key = self.config.feed_cache_key();
        if let Err(e) = self.cache.set(&key, &ranked, self.config.feed_ttl()).await {
            warn!("Failed to cache shorts, continuing without cache: {}", e);
        }

        info!(
            "Loaded {} shorts from {} raw items",
            ranked.len(),
            attempt.pool.len()
        );
        Ok(Feed {
            items: ranked,
            source: FeedSource::Live,
            updated_at: now,
        })
    }

    /// 用 videos 端点补全搜索结果的统计和时长
    async fn hydrate(
        &self,
        client: &YoutubeClient,
        mut hits: Vec<YoutubeVideo>,
        now: DateTime<Utc>,
    ) -> Result<Vec<YoutubeVideo>, FetchError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = hits
            .iter()
            .filter_map(YoutubeVideo::video_id)
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Ok(hits);
        }

        let query = QueryConfig::details(ids).part(self.config.query.chart_part.clone());
        self.quota.record(query.quota_cost()).await;

        match client.fetch(&query, now).await {
            Ok(details) => {
                let mut by_id: HashMap<String, YoutubeVideo> = details
                    .into_iter()
                    .filter_map(|detail| {
                        let id = detail.video_id()?.to_string();
                        Some((id, detail))
                    })
                    .collect();
                for hit in hits.iter_mut() {
                    let detail = hit.video_id().and_then(|id| by_id.remove(id));
                    if let Some(detail) = detail {
                        hit.merge_details(detail);
                    }
                }
                Ok(hits)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Could not hydrate search results, using them as-is: {}", e);
                Ok(hits)
            }
            Err(e) => Err(e),
        }
    }

    fn sample_feed(&self) -> Feed {
        let now = self.clock.now();
        Feed {
            items: sample_items(&self.config, now),
            source: FeedSource::Sample,
            updated_at: now,
        }
    }
}

/// 单级查询：拉取、可选补全、累积到结果池后重新分类
struct PooledAttempt<'a> {
    orchestrator: &'a FetchOrchestrator,
    client: &'a YoutubeClient,
    pool: Vec<YoutubeVideo>,
    now: DateTime<Utc>,
}

#[async_trait]
impl<'a> TierAttempt for PooledAttempt<'a> {
    type Output = Vec<VideoItem>;

    async fn attempt(
        &mut self,
        index: usize,
        tier: &QueryConfig,
    ) -> Result<Vec<VideoItem>, FetchError> {
        let orchestrator = self.orchestrator;
        orchestrator.quota.record(tier.quota_cost()).await;

        let mut raw = self.client.fetch(tier, self.now).await?;
        if tier.is_search() && orchestrator.config.query.hydrate_search_results && !raw.is_empty() {
            raw = orchestrator.hydrate(self.client, raw, self.now).await?;
        }
        self.pool.extend(raw);

        let items = orchestrator.classifier.classify(&self.pool, self.now);
        debug!(
            "Tier {} classified {} items from a pool of {}",
            index,
            items.len(),
            self.pool.len()
        );
        if items.is_empty() {
            return Err(FetchError::EmptyResult);
        }
        Ok(items)
    }
}

/// 加载互斥标记，离开作用域时自动释放
struct LoadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
