// 应用配置
//
// 默认值对应原始页面的常量，启动时从 .env / 环境变量覆盖

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 未填写 API 密钥时的占位值
pub const API_KEY_PLACEHOLDER: &str = "YOUR_YOUTUBE_API_KEY_HERE";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortsConfig {
    /// 远端 API 设置
    pub api: ApiConfig,

    /// 查询预设
    pub query: QueryPresetConfig,

    /// 缓存设置
    pub cache: CacheConfig,

    /// 短视频判定规则
    pub filter: ShortsFilterConfig,

    /// 最终展示数量上限
    pub display_count: usize,

    /// 所有回退查询都失败时是否使用内置示例数据
    pub sample_on_exhaustion: bool,

    /// HTTP 服务监听设置
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Data API 基础地址
    pub base_url: String,

    /// API 密钥（为空或占位值视为未配置）
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// 单次请求超时（毫秒）
    pub request_timeout_ms: u64,

    /// 观看/嵌入/频道链接的站点地址
    pub site_base_url: String,
}

/// 拉取模式：关键词搜索或"最受欢迎"榜单
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Search,
    Chart,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Search => "search",
            FeedMode::Chart => "chart",
        }
    }
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(FeedMode::Search),
            "chart" | "mostpopular" => Ok(FeedMode::Chart),
            other => Err(format!("Invalid feed mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPresetConfig {
    pub mode: FeedMode,
    pub search_term: String,
    pub region_code: String,
    /// 搜索请求的 part 参数
    pub search_part: String,
    /// 榜单与详情请求的 part 参数
    pub chart_part: String,
    pub order: String,
    pub search_max_results: u32,
    pub fallback_max_results: u32,
    pub chart_max_results: u32,
    /// 主查询回溯天数
    pub lookback_days: u32,
    /// 回退查询回溯天数
    pub fallback_lookback_days: u32,
    /// 搜索结果是否追加一次 videos 查询补全统计与时长
    pub hydrate_search_results: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub feed_key: String,
    pub quota_key: String,
    pub feed_ttl_minutes: u64,
    pub quota_window_minutes: u64,
    pub daily_quota_limit: u32,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortsFilterConfig {
    /// 按时长判定为短视频的上限（秒）
    pub max_duration_secs: u64,
    pub hashtags: Vec<String>,
    pub keywords: Vec<String>,
    /// 合格条目少于该数量时改为返回未过滤的前 N 条
    pub min_eligible: usize,
    /// 未过滤回退时返回的条目数
    pub unfiltered_count: usize,
    pub channel_placeholder: String,
    pub thumbnail_placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ShortsConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://www.googleapis.com/youtube/v3".to_string(),
                api_key: None,
                request_timeout_ms: 10_000,
                site_base_url: "https://www.youtube.com".to_string(),
            },
            query: QueryPresetConfig {
                mode: FeedMode::Chart,
                search_term: "shorts".to_string(),
                region_code: "KR".to_string(),
                search_part: "snippet".to_string(),
                chart_part: "snippet,statistics,contentDetails".to_string(),
                order: "viewCount".to_string(),
                search_max_results: 10,
                fallback_max_results: 20,
                chart_max_results: 50,
                lookback_days: 3,
                fallback_lookback_days: 7,
                hydrate_search_results: true,
            },
            cache: CacheConfig {
                feed_key: "youtube_shorts_cache".to_string(),
                quota_key: "api_quota_usage".to_string(),
                feed_ttl_minutes: 30,
                quota_window_minutes: 24 * 60,
                daily_quota_limit: 10_000,
                cache_dir: PathBuf::from("./cache"),
            },
            filter: ShortsFilterConfig {
                max_duration_secs: 60,
                hashtags: vec!["#shorts".to_string(), "#short".to_string(), "#쇼츠".to_string()],
                keywords: vec!["shorts".to_string(), "쇼츠".to_string()],
                min_eligible: 5,
                unfiltered_count: 10,
                channel_placeholder: "Unknown channel".to_string(),
                thumbnail_placeholder: "https://via.placeholder.com/320x180?text=No+Thumbnail"
                    .to_string(),
            },
            display_count: 10,
            sample_on_exhaustion: false,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
        }
    }
}

impl ShortsConfig {
    /// 从 .env 与环境变量加载配置
    ///
    /// 无法解析的数值覆盖项会被忽略并记录警告
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            config.api.api_key = Some(key);
        }
        if let Ok(base_url) = std::env::var("YOUTUBE_API_BASE_URL") {
            config.api.base_url = base_url;
        }
        if let Some(mode) = env_parse::<FeedMode>("SHORTS_QUERY_MODE") {
            config.query.mode = mode;
        }
        if let Ok(region) = std::env::var("SHORTS_REGION_CODE") {
            config.query.region_code = region;
        }
        if let Ok(term) = std::env::var("SHORTS_SEARCH_TERM") {
            config.query.search_term = term;
        }
        if let Some(ttl) = env_parse("SHORTS_CACHE_TTL_MINUTES") {
            config.cache.feed_ttl_minutes = ttl;
        }
        if let Some(count) = env_parse("SHORTS_DISPLAY_COUNT") {
            config.display_count = count;
        }
        if let Ok(dir) = std::env::var("SHORTS_CACHE_DIR") {
            config.cache.cache_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = env_parse("SHORTS_REQUEST_TIMEOUT_MS") {
            config.api.request_timeout_ms = timeout;
        }
        if let Some(flag) = env_parse("SHORTS_SAMPLE_ON_EXHAUSTION") {
            config.sample_on_exhaustion = flag;
        }
        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_parse("PORT") {
            config.server.port = port;
        }

        config
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| anyhow!("Invalid API base URL {}: {}", self.api.base_url, e))?;
        url::Url::parse(&self.api.site_base_url)
            .map_err(|e| anyhow!("Invalid site base URL {}: {}", self.api.site_base_url, e))?;
        if self.display_count == 0 {
            return Err(anyhow!("display_count must be greater than zero"));
        }
        Ok(())
    }

    /// 有效的 API 密钥（未配置、空值或占位值返回 None）
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != API_KEY_PLACEHOLDER)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    pub fn feed_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.feed_ttl_minutes.saturating_mul(60))
    }

    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.cache.quota_window_minutes.saturating_mul(60))
    }

    /// 当前预设的缓存键，两种模式互不共享条目
    pub fn feed_cache_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.cache.feed_key,
            self.query.mode.as_str(),
            self.query.region_code
        )
    }
}

fn env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid {}={}: {}", name, raw, e);
            None
        }
    }
}
