// 短视频分类器
//
// - 按话题标签、标题关键词或时长判定短视频
// - 合格条目过少时退回未过滤的前 N 条
// - 规范化字段并按 ID 去重

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::config::{ShortsConfig, ShortsFilterConfig};
use crate::external::{YoutubeConverter, YoutubeVideo};
use crate::models::VideoItem;

/// 短视频判定规则
#[derive(Debug, Clone)]
pub struct ShortsFilter {
    max_duration_secs: u64,
    hashtags: Vec<String>,
    keywords: Vec<String>,
}

impl ShortsFilter {
    pub fn new(config: &ShortsFilterConfig) -> Self {
        let lowered = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect()
        };
        Self {
            max_duration_secs: config.max_duration_secs,
            hashtags: lowered(&config.hashtags),
            keywords: lowered(&config.keywords),
        }
    }

    /// 任一条件成立即为短视频
    ///
    /// 时长为 0（缺失或无法解析）不满足时长条件
    pub fn is_short(&self, raw: &YoutubeVideo) -> bool {
        let title = raw.title().to_lowercase();
        let description = raw.description().to_lowercase();

        let has_hashtag = self
            .hashtags
            .iter()
            .any(|tag| title.contains(tag.as_str()) || description.contains(tag.as_str()));
        if has_hashtag {
            return true;
        }

        if self.keywords.iter().any(|kw| title.contains(kw.as_str())) {
            return true;
        }

        let duration = raw.duration_seconds();
        duration > 0 && duration <= self.max_duration_secs
    }
}

/// 原始结果分类器
#[derive(Debug, Clone)]
pub struct ResultClassifier {
    filter: ShortsFilter,
    converter: YoutubeConverter,
    min_eligible: usize,
    unfiltered_count: usize,
}

impl ResultClassifier {
    pub fn new(config: &ShortsConfig) -> Self {
        Self {
            filter: ShortsFilter::new(&config.filter),
            converter: YoutubeConverter::new(config),
            min_eligible: config.filter.min_eligible,
            unfiltered_count: config.filter.unfiltered_count,
        }
    }

    pub fn filter(&self) -> &ShortsFilter {
        &self.filter
    }

    /// 将原始条目分类并规范化
    ///
    /// 结果中的 ID 非空且唯一，保持首次出现的顺序
    pub fn classify(&self, raw_items: &[YoutubeVideo], fetched_at: DateTime<Utc>) -> Vec<VideoItem> {
        let mut seen = HashSet::new();
        let mut usable = Vec::with_capacity(raw_items.len());
        let mut eligible = Vec::new();

        for raw in raw_items {
            let Some(item) = self.converter.normalize(raw, fetched_at) else {
                continue;
            };
            if !seen.insert(item.id.clone()) {
                continue;
            }
            if self.filter.is_short(raw) {
                eligible.push(item.clone());
            }
            usable.push(item);
        }

        if eligible.len() >= self.min_eligible {
            debug!(
                "Classified {} of {} raw items as shorts",
                eligible.len(),
                raw_items.len()
            );
            eligible
        } else {
            debug!(
                "Only {} shorts among {} raw items, returning first {} unfiltered",
                eligible.len(),
                raw_items.len(),
                self.unfiltered_count
            );
            usable.truncate(self.unfiltered_count);
            usable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(id: &str, title: &str, duration: Option<&str>) -> YoutubeVideo {
        let mut value = json!({
            "id": id,
            "snippet": {"title": title, "description": ""},
            "statistics": {"viewCount": "10"}
        });
        if let Some(d) = duration {
            value["contentDetails"] = json!({"duration": d});
        }
        serde_json::from_value(value).unwrap()
    }

    fn classifier() -> ResultClassifier {
        ResultClassifier::new(&ShortsConfig::default())
    }

    #[test]
    fn test_short_by_signals() {
        let c = classifier();
        assert!(c.filter().is_short(&raw("a", "Dance #SHORTS", None)));
        assert!(c.filter().is_short(&raw("a", "오늘의 쇼츠", None)));
        assert!(c.filter().is_short(&raw("a", "Quick clip", Some("PT59S"))));
        assert!(c.filter().is_short(&raw("a", "Quick clip", Some("PT1M"))));
        assert!(!c.filter().is_short(&raw("a", "Long talk", Some("PT1M1S"))));
        assert!(!c.filter().is_short(&raw("a", "Live", Some("P0D"))));
        assert!(!c.filter().is_short(&raw("a", "Unknown", None)));
    }

    #[test]
    fn test_hashtag_in_description() {
        let video: YoutubeVideo = serde_json::from_value(json!({
            "id": "d",
            "snippet": {"title": "Music video", "description": "watch more #Short clips"}
        }))
        .unwrap();
        assert!(classifier().filter().is_short(&video));
    }

    #[test]
    fn test_eligible_subset_above_threshold() {
        let mut items: Vec<YoutubeVideo> = (0..6)
            .map(|i| raw(&format!("s{}", i), "clip", Some("PT30S")))
            .collect();
        items.push(raw("l1", "Long one", Some("PT10M")));
        items.push(raw("l2", "Long two", Some("PT20M")));

        let result = classifier().classify(&items, Utc::now());
        assert_eq!(result.len(), 6);
        assert!(result.iter().all(|v| v.id.starts_with('s')));
    }

    #[test]
    fn test_falls_back_to_unfiltered_when_few_shorts() {
        let mut items = vec![raw("s0", "clip #shorts", None)];
        for i in 0..14 {
            items.push(raw(&format!("l{}", i), "Long video", Some("PT5M")));
        }

        let result = classifier().classify(&items, Utc::now());
        assert_eq!(result.len(), 10);
        assert_eq!(result[0].id, "s0");
        assert_eq!(result[1].id, "l0");
    }

    #[test]
    fn test_dedupes_and_discards() {
        let items = vec![
            raw("a", "first #shorts", None),
            raw("a", "second #shorts", None),
            raw("", "no id #shorts", None),
            raw("b", "#shorts", None),
            raw("c", "ok #shorts", None),
        ];
        let result = classifier().classify(&items, Utc::now());
        let ids: Vec<&str> = result.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(result[0].title, "first");
    }

    proptest! {
        #[test]
        fn prop_hashtag_title_is_always_short(
            prefix in "[a-z ]{0,12}",
            tag_index in 0usize..3,
            upper in any::<bool>(),
            duration in proptest::option::of("PT[0-9]{1,2}M[0-9]{1,2}S"),
        ) {
            let config = ShortsConfig::default();
            let tag = &config.filter.hashtags[tag_index];
            let tag = if upper { tag.to_uppercase() } else { tag.clone() };
            let title = format!("{}{}", prefix, tag);
            let video = raw("x", &title, duration.as_deref());
            prop_assert!(ShortsFilter::new(&config.filter).is_short(&video));
        }

        #[test]
        fn prop_classified_ids_unique_and_non_empty(
            raw_items in proptest::collection::vec(("[a-d]{0,2}", "[a-z #]{0,10}"), 0..30),
        ) {
            let items: Vec<YoutubeVideo> = raw_items
                .iter()
                .map(|(id, title)| raw(id, title, None))
                .collect();
            let result = classifier().classify(&items, Utc::now());
            let mut ids = HashSet::new();
            for item in &result {
                prop_assert!(!item.id.is_empty());
                prop_assert!(!item.title.is_empty());
                prop_assert!(ids.insert(item.id.clone()));
            }
        }
    }
}
