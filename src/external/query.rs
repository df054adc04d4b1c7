// 请求构建器
//
// 将不可变的 QueryConfig 转换为带完整查询串的 GET 请求描述，
// 支持关键词搜索、"最受欢迎"榜单和按 ID 查询详情三种形态

use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// HTTP 方法（只需要 GET）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

/// 出站请求描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
}

impl RequestDescriptor {
    /// 隐去 key 参数的 URL，用于日志
    pub fn redacted_url(&self) -> String {
        static KEY_PARAM: OnceLock<Regex> = OnceLock::new();
        let regex = KEY_PARAM.get_or_init(|| {
            Regex::new(r"([?&]key=)[^&]*").expect("key 参数正则表达式编译失败")
        });
        regex.replace_all(&self.url, "${1}***").into_owned()
    }
}

/// 查询形态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// 关键词搜索（search 端点）
    Search { term: String },
    /// 最受欢迎榜单（videos 端点，chart=mostPopular）
    Chart,
    /// 按 ID 查询详情（videos 端点，id=...）
    Details { ids: Vec<String> },
}

/// 单次请求的查询配置
///
/// 通过链式方法构造，构造完成后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    kind: QueryKind,
    part: String,
    region_code: Option<String>,
    order: Option<String>,
    max_results: Option<u32>,
    lookback_days: Option<u32>,
    short_only: bool,
}

impl QueryConfig {
    pub fn search(term: impl Into<String>) -> Self {
        Self::with_kind(QueryKind::Search { term: term.into() })
    }

    pub fn chart() -> Self {
        Self::with_kind(QueryKind::Chart)
    }

    pub fn details(ids: Vec<String>) -> Self {
        Self::with_kind(QueryKind::Details { ids })
    }

    fn with_kind(kind: QueryKind) -> Self {
        Self {
            kind,
            part: "snippet".to_string(),
            region_code: None,
            order: None,
            max_results: None,
            lookback_days: None,
            short_only: false,
        }
    }

    pub fn part(mut self, part: impl Into<String>) -> Self {
        self.part = part.into();
        self
    }

    pub fn region(mut self, region_code: impl Into<String>) -> Self {
        let region_code = region_code.into();
        self.region_code = (!region_code.trim().is_empty()).then_some(region_code);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        let order = order.into();
        self.order = (!order.trim().is_empty()).then_some(order);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// 只搜索短视频（videoDuration=short）
    pub fn short_only(mut self) -> Self {
        self.short_only = true;
        self
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    pub fn is_search(&self) -> bool {
        matches!(self.kind, QueryKind::Search { .. })
    }

    pub fn max_results_value(&self) -> Option<u32> {
        self.max_results
    }

    pub fn lookback_days_value(&self) -> Option<u32> {
        self.lookback_days
    }

    /// 估算的配额消耗（search 100 单位，videos 1 单位）
    pub fn quota_cost(&self) -> u32 {
        match self.kind {
            QueryKind::Search { .. } => 100,
            QueryKind::Chart | QueryKind::Details { .. } => 1,
        }
    }

    /// 日志用的简短描述
    pub fn describe(&self) -> String {
        match &self.kind {
            QueryKind::Search { term } => format!(
                "search '{}' (max {:?}, lookback {:?}d, region {:?})",
                term, self.max_results, self.lookback_days, self.region_code
            ),
            QueryKind::Chart => format!(
                "chart mostPopular (max {:?}, region {:?})",
                self.max_results, self.region_code
            ),
            QueryKind::Details { ids } => format!("details for {} videos", ids.len()),
        }
    }
}

/// 请求构建器
#[derive(Clone)]
pub struct QueryBuilder {
    base_url: String,
    api_key: String,
}

impl QueryBuilder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// 构建请求，`now` 用于计算 publishedAfter 下界
    pub fn build(&self, query: &QueryConfig, now: DateTime<Utc>) -> RequestDescriptor {
        let mut params: Vec<(&str, String)> = vec![("part", query.part.clone())];

        let endpoint = match &query.kind {
            QueryKind::Search { term } => {
                params.push(("q", term.clone()));
                params.push(("type", "video".to_string()));
                if query.short_only {
                    params.push(("videoDuration", "short".to_string()));
                }
                "search"
            }
            QueryKind::Chart => {
                params.push(("chart", "mostPopular".to_string()));
                "videos"
            }
            QueryKind::Details { ids } => {
                params.push(("id", ids.join(",")));
                "videos"
            }
        };

        if let Some(ref region) = query.region_code {
            params.push(("regionCode", region.clone()));
        }
        if let Some(ref order) = query.order {
            params.push(("order", order.clone()));
        }
        if let (QueryKind::Search { .. }, Some(days)) = (&query.kind, query.lookback_days) {
            let published_after = now - ChronoDuration::days(i64::from(days));
            params.push((
                "publishedAfter",
                published_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if !matches!(query.kind, QueryKind::Details { .. }) {
            if let Some(max_results) = query.max_results {
                params.push(("maxResults", max_results.to_string()));
            }
        }
        params.push(("key", self.api_key.clone()));

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        RequestDescriptor {
            url: format!("{}/{}?{}", self.base_url, endpoint, query_string),
            method: HttpMethod::Get,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn params_of(url: &str) -> HashMap<String, String> {
        let parsed = url::Url::parse(url).unwrap();
        parsed.query_pairs().into_owned().collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_search_query() {
        let builder = QueryBuilder::new("https://www.googleapis.com/youtube/v3/", "secret");
        let query = QueryConfig::search("shorts 쇼츠")
            .part("snippet")
            .region("KR")
            .order("viewCount")
            .max_results(10)
            .lookback_days(3)
            .short_only();

        let request = builder.build(&query, now());
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.url.starts_with("https://www.googleapis.com/youtube/v3/search?"));

        let params = params_of(&request.url);
        assert_eq!(params["q"], "shorts 쇼츠");
        assert_eq!(params["type"], "video");
        assert_eq!(params["videoDuration"], "short");
        assert_eq!(params["regionCode"], "KR");
        assert_eq!(params["order"], "viewCount");
        assert_eq!(params["maxResults"], "10");
        assert_eq!(params["publishedAfter"], "2026-10-14T12:00:00Z");
        assert_eq!(params["key"], "secret");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let builder = QueryBuilder::new("https://api.example.com", "k&y");
        let request = builder.build(&QueryConfig::search("a b&c=d"), now());
        assert!(request.url.contains("q=a%20b%26c%3Dd"));
        assert!(request.url.contains("key=k%26y"));
    }

    #[test]
    fn test_chart_query() {
        let builder = QueryBuilder::new("https://api.example.com", "secret");
        let query = QueryConfig::chart()
            .part("snippet,statistics,contentDetails")
            .region("KR")
            .max_results(50)
            .lookback_days(3);

        let request = builder.build(&query, now());
        assert!(request.url.starts_with("https://api.example.com/videos?"));
        let params = params_of(&request.url);
        assert_eq!(params["chart"], "mostPopular");
        assert_eq!(params["part"], "snippet,statistics,contentDetails");
        assert_eq!(params["maxResults"], "50");
        assert!(!params.contains_key("publishedAfter"));
        assert!(!params.contains_key("q"));
    }

    #[test]
    fn test_minimal_search_omits_optional_filters() {
        let builder = QueryBuilder::new("https://api.example.com", "secret");
        let request = builder.build(&QueryConfig::search("shorts").max_results(10), now());
        let params = params_of(&request.url);
        assert!(!params.contains_key("regionCode"));
        assert!(!params.contains_key("order"));
        assert!(!params.contains_key("videoDuration"));
        assert!(!params.contains_key("publishedAfter"));
    }

    #[test]
    fn test_details_query() {
        let builder = QueryBuilder::new("https://api.example.com", "secret");
        let query = QueryConfig::details(vec!["a".into(), "b".into()]).max_results(5);
        let request = builder.build(&query, now());
        let params = params_of(&request.url);
        assert_eq!(params["id"], "a,b");
        assert!(!params.contains_key("maxResults"));
        assert_eq!(query.quota_cost(), 1);
    }

    #[test]
    fn test_redacted_url() {
        let builder = QueryBuilder::new("https://api.example.com", "secret");
        let request = builder.build(&QueryConfig::chart(), now());
        let redacted = request.redacted_url();
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("key=***"));
    }

    #[test]
    fn test_blank_region_is_dropped() {
        let query = QueryConfig::chart().region("  ");
        let request = QueryBuilder::new("https://api.example.com", "k").build(&query, now());
        assert!(!request.url.contains("regionCode"));
    }
}
