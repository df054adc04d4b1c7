// 内置示例数据
//
// 未配置 API 密钥时展示的固定列表，发布时间相对于传入的当前时间

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::config::ShortsConfig;
use crate::models::{rank_and_truncate, VideoItem, VideoLinks};

/// (ID, 标题, 频道, 观看次数)
const SAMPLE_VIDEOS: [(&str, &str, &str, u64); 10] = [
    ("dQw4w9WgXcQ", "Never Gonna Give You Up", "Rick Astley", 1_500_000_000),
    ("jNQXAC9IVRw", "Me at the zoo", "jawed", 250_000_000),
    ("kJQP7kiw5Fk", "Despacito Remix", "Luis Fonsi", 8_000_000_000),
    ("YQHsXMglC9A", "Hello", "Adele", 3_500_000_000),
    ("9bZkp7q19f0", "GANGNAM STYLE", "officialpsy", 4_500_000_000),
    ("fJ9rUzIMcZQ", "Bohemian Rhapsody", "Queen Official", 2_000_000_000),
    ("hT_nvWreIhg", "Blinding Lights", "The Weeknd", 1_800_000_000),
    ("JGwWNGJdvx8", "Shape of You", "Ed Sheeran", 5_500_000_000),
    ("DyDfgMOUjCI", "bad guy", "Billie Eilish", 1_200_000_000),
    ("OPf0YbXqDm0", "Uptown Funk", "Mark Ronson", 4_900_000_000),
];

/// 生成示例列表，按观看次数排序并截断到展示数量
pub fn sample_items(config: &ShortsConfig, now: DateTime<Utc>) -> Vec<VideoItem> {
    let links = VideoLinks::new(config.api.site_base_url.clone());

    let items = SAMPLE_VIDEOS
        .iter()
        .enumerate()
        .map(|(index, (id, title, channel, views))| VideoItem {
            id: id.to_string(),
            title: title.to_string(),
            channel_name: channel.to_string(),
            thumbnail_url: format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id),
            published_at: now - ChronoDuration::days(index as i64),
            view_count: *views,
            duration_seconds: None,
            watch_url: links.watch_url(id),
            embed_url: links.embed_url(id),
            channel_url: links.channel_url(None),
        })
        .collect();

    rank_and_truncate(items, config.display_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_is_deterministic_and_ranked() {
        let config = ShortsConfig::default();
        let now = Utc::now();
        let first = sample_items(&config, now);
        let second = sample_items(&config, now);

        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, "kJQP7kiw5Fk");
        let ids: HashSet<_> = first.iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids.len(), first.len());
        assert!(first.windows(2).all(|w| w[0].view_count >= w[1].view_count));
    }

    #[test]
    fn test_sample_respects_display_count() {
        let mut config = ShortsConfig::default();
        config.display_count = 3;
        assert_eq!(sample_items(&config, Utc::now()).len(), 3);
    }
}
