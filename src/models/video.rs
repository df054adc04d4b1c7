use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 规范化后的短视频条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    pub watch_url: String,
    pub embed_url: String,
    pub channel_url: String,
}

/// 由视频 ID 推导观看、嵌入和频道链接
#[derive(Debug, Clone)]
pub struct VideoLinks {
    site_base_url: String,
}

impl VideoLinks {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        Self {
            site_base_url: site_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={}", self.site_base_url, urlencoding::encode(video_id))
    }

    pub fn embed_url(&self, video_id: &str) -> String {
        format!(
            "{}/embed/{}?autoplay=1&rel=0",
            self.site_base_url,
            urlencoding::encode(video_id)
        )
    }

    /// 频道 ID 缺失时退回站点首页
    pub fn channel_url(&self, channel_id: Option<&str>) -> String {
        match channel_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => format!("{}/channel/{}", self.site_base_url, urlencoding::encode(id)),
            None => self.site_base_url.clone(),
        }
    }
}

/// 结果来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// 缓存命中
    Cache,
    /// 实时拉取
    Live,
    /// 内置示例数据（未配置密钥等情况）
    Sample,
}

/// 一次加载的最终结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub items: Vec<VideoItem>,
    pub source: FeedSource,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    pub fn is_sample(&self) -> bool {
        self.source == FeedSource::Sample
    }
}

/// 按观看次数降序稳定排序、按 ID 去重（保留首次出现）并截断到 `limit`
pub fn rank_and_truncate(items: Vec<VideoItem>, limit: usize) -> Vec<VideoItem> {
    let mut seen = std::collections::HashSet::new();
    let mut ranked: Vec<VideoItem> = items
        .into_iter()
        .filter(|item| !item.id.is_empty() && seen.insert(item.id.clone()))
        .collect();
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, views: u64) -> VideoItem {
        let links = VideoLinks::new("https://www.youtube.com");
        VideoItem {
            id: id.to_string(),
            title: format!("title {}", id),
            channel_name: "channel".to_string(),
            thumbnail_url: "https://i.ytimg.com/vi/x/default.jpg".to_string(),
            published_at: Utc::now(),
            view_count: views,
            duration_seconds: None,
            watch_url: links.watch_url(id),
            embed_url: links.embed_url(id),
            channel_url: links.channel_url(None),
        }
    }

    #[test]
    fn test_links() {
        let links = VideoLinks::new("https://www.youtube.com/");
        assert_eq!(links.watch_url("abc"), "https://www.youtube.com/watch?v=abc");
        assert_eq!(
            links.embed_url("abc"),
            "https://www.youtube.com/embed/abc?autoplay=1&rel=0"
        );
        assert_eq!(
            links.channel_url(Some("UC123")),
            "https://www.youtube.com/channel/UC123"
        );
        assert_eq!(links.channel_url(Some("")), "https://www.youtube.com");
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = rank_and_truncate(
            vec![item("a", 5), item("b", 10), item("c", 5), item("d", 10)],
            10,
        );
        let ids: Vec<&str> = ranked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_rank_dedupes_first_occurrence() {
        let ranked = rank_and_truncate(vec![item("a", 1), item("a", 100), item("b", 2)], 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[1].view_count, 1);
    }

    #[test]
    fn test_video_item_serializes_camel_case() {
        let json = serde_json::to_value(item("a", 3)).unwrap();
        assert_eq!(json["viewCount"], 3);
        assert!(json.get("durationSeconds").is_none());
        assert!(json["watchUrl"].as_str().unwrap().ends_with("v=a"));
    }

    proptest! {
        #[test]
        fn prop_ranked_list_invariants(
            raw in proptest::collection::vec(("[a-e]{1,2}", 0u64..1_000), 0..40),
            limit in 1usize..15,
        ) {
            let items: Vec<VideoItem> = raw.iter().map(|(id, views)| item(id, *views)).collect();
            let ranked = rank_and_truncate(items, limit);

            prop_assert!(ranked.len() <= limit);
            let mut ids = std::collections::HashSet::new();
            for item in &ranked {
                prop_assert!(!item.id.is_empty());
                prop_assert!(ids.insert(item.id.clone()));
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].view_count >= pair[1].view_count);
            }
        }
    }
}
