use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{FetchError, TransportError};
use super::http::{HttpClient, HttpResponse};
use super::query::{QueryBuilder, QueryConfig};
use crate::config::ShortsConfig;
use crate::models::{VideoItem, VideoLinks};

/// 缩略图质量优先级（高到低）
const THUMBNAIL_PRIORITY: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

/// YouTube Data API 客户端
#[derive(Clone)]
pub struct YoutubeClient {
    http: Arc<dyn HttpClient>,
    queries: QueryBuilder,
    timeout: Duration,
}

impl YoutubeClient {
    pub fn new(http: Arc<dyn HttpClient>, queries: QueryBuilder, timeout: Duration) -> Self {
        Self {
            http,
            queries,
            timeout,
        }
    }

    /// 执行一次列表查询
    ///
    /// 超时按传输错误处理
    pub async fn fetch(
        &self,
        query: &QueryConfig,
        now: DateTime<Utc>,
    ) -> Result<Vec<YoutubeVideo>, FetchError> {
        let request = self.queries.build(query, now);
        debug!("Fetching {} -> {}", query.describe(), request.redacted_url());

        let response = tokio::time::timeout(self.timeout, self.http.send(&request))
            .await
            .map_err(|_| TransportError::Timeout)??;

        let items = parse_list_response(response)?;
        debug!("{} returned {} raw items", query.describe(), items.len());
        Ok(items)
    }
}

/// 按状态码与错误信息分类响应
pub fn parse_list_response(response: HttpResponse) -> Result<Vec<YoutubeVideo>, FetchError> {
    if response.is_success() {
        let list: YoutubeListResponse = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        return Ok(list.items);
    }

    let detail = serde_json::from_str::<YoutubeErrorResponse>(&response.body)
        .ok()
        .map(|r| r.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    match response.status {
        403 => {
            let quota_signal = message.to_lowercase().contains("quota")
                || detail.as_ref().map_or(false, YoutubeErrorBody::has_quota_reason);
            if quota_signal {
                Err(FetchError::QuotaExceeded(message))
            } else {
                Err(FetchError::InvalidCredential(message))
            }
        }
        400 => Err(FetchError::MalformedRequest(message)),
        status => Err(FetchError::Api { status, message }),
    }
}

// ========== API 响应结构 ==========

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct YoutubeListResponse {
    #[serde(default)]
    pub items: Vec<YoutubeVideo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeVideo {
    #[serde(default)]
    pub id: Option<YoutubeVideoId>,
    #[serde(default)]
    pub snippet: Option<Snippet>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
}

/// videos 端点返回字符串 ID，search 端点返回 `{kind, videoId}` 对象
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum YoutubeVideoId {
    Plain(String),
    Resource {
        #[serde(rename = "videoId", default)]
        video_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// API 以字符串返回计数，也兼容数字
    #[serde(default)]
    pub view_count: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeErrorResponse {
    pub error: YoutubeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<YoutubeErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}

impl YoutubeErrorBody {
    fn has_quota_reason(&self) -> bool {
        self.errors.iter().filter_map(|e| e.reason.as_deref()).any(|reason| {
            let reason = reason.to_lowercase();
            reason.contains("quota") || reason == "dailylimitexceeded"
        })
    }
}

impl YoutubeVideoId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            YoutubeVideoId::Plain(id) => Some(id.as_str()),
            YoutubeVideoId::Resource { video_id } => video_id.as_deref(),
        }
    }
}

impl YoutubeVideo {
    /// 去除空白后的视频 ID，缺失或为空时返回 None
    pub fn video_id(&self) -> Option<&str> {
        self.id
            .as_ref()
            .and_then(YoutubeVideoId::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn title(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.description.as_deref())
            .unwrap_or("")
    }

    /// 时长（秒），缺失或无法解析时为 0
    pub fn duration_seconds(&self) -> u64 {
        self.content_details
            .as_ref()
            .and_then(|c| c.duration.as_deref())
            .map_or(0, parse_iso8601_duration)
    }

    /// 观看次数，无法解析时为 0
    pub fn view_count(&self) -> u64 {
        match self.statistics.as_ref().and_then(|s| s.view_count.as_ref()) {
            Some(serde_json::Value::String(raw)) => raw.trim().parse::<u64>().unwrap_or(0),
            Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map_or(0, |v| v as u64)
            }),
            _ => 0,
        }
    }

    /// 用 videos 端点的详情补全搜索结果
    pub fn merge_details(&mut self, detail: YoutubeVideo) {
        if detail.snippet.is_some() {
            self.snippet = detail.snippet;
        }
        if detail.statistics.is_some() {
            self.statistics = detail.statistics;
        }
        if detail.content_details.is_some() {
            self.content_details = detail.content_details;
        }
        if let Some(id) = self.video_id().map(str::to_string) {
            self.id = Some(YoutubeVideoId::Plain(id));
        }
    }
}

/// 解析 `PT#H#M#S` 形式的时长，各部分可省略
///
/// 无法解析时返回 0
pub fn parse_iso8601_duration(raw: &str) -> u64 {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let regex = DURATION.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("时长正则表达式编译失败")
    });

    let Some(caps) = regex.captures(raw.trim()) else {
        return 0;
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(part(3))
}

/// API 条目到 VideoItem 的转换器
#[derive(Debug, Clone)]
pub struct YoutubeConverter {
    links: VideoLinks,
    hashtag_pattern: Option<Regex>,
    channel_placeholder: String,
    thumbnail_placeholder: String,
}

impl YoutubeConverter {
    pub fn new(config: &ShortsConfig) -> Self {
        Self {
            links: VideoLinks::new(config.api.site_base_url.clone()),
            hashtag_pattern: build_hashtag_pattern(&config.filter.hashtags),
            channel_placeholder: config.filter.channel_placeholder.clone(),
            thumbnail_placeholder: config.filter.thumbnail_placeholder.clone(),
        }
    }

    /// 去掉标题中的短视频话题标签并整理空白
    pub fn clean_title(&self, title: &str) -> String {
        let stripped = match self.hashtag_pattern {
            Some(ref pattern) => pattern.replace_all(title, " ").into_owned(),
            None => title.to_string(),
        };
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 规范化单个条目；缺少 ID 或标题清理后为空时返回 None
    pub fn normalize(&self, raw: &YoutubeVideo, fetched_at: DateTime<Utc>) -> Option<VideoItem> {
        let id = raw.video_id()?.to_string();
        let title = self.clean_title(raw.title());
        if title.is_empty() {
            return None;
        }

        let snippet = raw.snippet.as_ref();
        let channel_name = snippet
            .and_then(|s| s.channel_title.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.channel_placeholder.clone());
        let published_at = snippet
            .and_then(|s| s.published_at.as_deref())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(fetched_at);
        let channel_url = self
            .links
            .channel_url(snippet.and_then(|s| s.channel_id.as_deref()));
        let duration = raw.duration_seconds();

        Some(VideoItem {
            watch_url: self.links.watch_url(&id),
            embed_url: self.links.embed_url(&id),
            channel_url,
            thumbnail_url: self.pick_thumbnail(raw),
            title,
            channel_name,
            published_at,
            view_count: raw.view_count(),
            duration_seconds: (duration > 0).then_some(duration),
            id,
        })
    }

    fn pick_thumbnail(&self, raw: &YoutubeVideo) -> String {
        let thumbnails = raw.snippet.as_ref().map(|s| &s.thumbnails);
        THUMBNAIL_PRIORITY
            .iter()
            .filter_map(|quality| thumbnails.and_then(|t| t.get(*quality)))
            .filter_map(|thumb| thumb.url.as_deref())
            .find(|url| !url.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.thumbnail_placeholder.clone())
    }
}

fn build_hashtag_pattern(hashtags: &[String]) -> Option<Regex> {
    let mut tags: Vec<&str> = hashtags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return None;
    }
    // 长标签优先，避免 #short 吃掉 #shorts 的前缀
    tags.sort_by(|a, b| b.len().cmp(&a.len()));
    // 以单词字符结尾的标签要求后面是词边界，#short 不匹配 #shortfilm
    let alternation = tags
        .iter()
        .map(|t| {
            let ends_in_word = t
                .chars()
                .last()
                .map_or(false, |c| c.is_alphanumeric() || c == '_');
            if ends_in_word {
                format!(r"{}\b", regex::escape(t))
            } else {
                regex::escape(t)
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&alternation).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Hashtag pattern rejected, titles will not be cleaned: {}", e);
            None
        }
    }
}
