// 回退查询链
//
// 按顺序尝试一组越来越宽松的查询，返回第一个成功结果：
// - 可恢复错误（网络、空结果等）继续下一级
// - 不可恢复错误（配额、密钥、请求格式）立即返回
// - 全部失败时返回最后一个错误

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{FeedMode, ShortsConfig};
use crate::external::{FetchError, QueryConfig};

/// 单级查询的执行逻辑
#[async_trait]
pub trait TierAttempt: Send {
    type Output: Send;

    async fn attempt(&mut self, index: usize, tier: &QueryConfig)
        -> Result<Self::Output, FetchError>;
}

/// 有序的回退查询链
#[derive(Debug, Clone)]
pub struct FallbackChain {
    tiers: Vec<QueryConfig>,
}

impl FallbackChain {
    pub fn new(tiers: Vec<QueryConfig>) -> Self {
        Self { tiers }
    }

    /// 按配置的模式构建预设查询链
    pub fn for_config(config: &ShortsConfig) -> Self {
        let query = &config.query;
        let minimal_search = QueryConfig::search(query.search_term.clone())
            .part("snippet")
            .max_results(query.search_max_results);

        let tiers = match query.mode {
            FeedMode::Search => vec![
                QueryConfig::search(query.search_term.clone())
                    .part(query.search_part.clone())
                    .region(query.region_code.clone())
                    .order(query.order.clone())
                    .lookback_days(query.lookback_days)
                    .max_results(query.search_max_results)
                    .short_only(),
                QueryConfig::search(query.search_term.clone())
                    .part(query.search_part.clone())
                    .region(query.region_code.clone())
                    .order(query.order.clone())
                    .lookback_days(query.fallback_lookback_days)
                    .max_results(query.fallback_max_results)
                    .short_only(),
                minimal_search,
            ],
            FeedMode::Chart => vec![
                QueryConfig::chart()
                    .part(query.chart_part.clone())
                    .region(query.region_code.clone())
                    .order(query.order.clone())
                    .max_results(query.chart_max_results),
                QueryConfig::chart()
                    .part(query.chart_part.clone())
                    .max_results(query.chart_max_results),
                minimal_search,
            ],
        };

        Self::new(tiers)
    }

    pub fn tiers(&self) -> &[QueryConfig] {
        &self.tiers
    }

    /// 依次执行，返回第一个成功结果
    pub async fn first_success<A>(&self, attempt: &mut A) -> Result<A::Output, FetchError>
    where
        A: TierAttempt,
    {
        let mut last_error = FetchError::EmptyResult;

        for (index, tier) in self.tiers.iter().enumerate() {
            match attempt.attempt(index, tier).await {
                Ok(output) => {
                    if index > 0 {
                        info!("Fallback tier {} succeeded: {}", index, tier.describe());
                    }
                    return Ok(output);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Tier {} failed ({}), trying next: {}", index, tier.describe(), e);
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{QueryKind, TransportError};

    struct Scripted {
        outcomes: Vec<Result<u32, FetchError>>,
        calls: Vec<usize>,
    }

    #[async_trait]
    impl TierAttempt for Scripted {
        type Output = u32;

        async fn attempt(&mut self, index: usize, _tier: &QueryConfig) -> Result<u32, FetchError> {
            self.calls.push(index);
            self.outcomes.remove(0)
        }
    }

    fn chain(len: usize) -> FallbackChain {
        FallbackChain::new((0..len).map(|_| QueryConfig::chart()).collect())
    }

    #[tokio::test]
    async fn test_recoverable_errors_advance() {
        let mut scripted = Scripted {
            outcomes: vec![
                Err(FetchError::Transport(TransportError::Timeout)),
                Err(FetchError::EmptyResult),
                Ok(7),
            ],
            calls: vec![],
        };
        assert_eq!(chain(3).first_success(&mut scripted).await.unwrap(), 7);
        assert_eq!(scripted.calls, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_chain() {
        let mut scripted = Scripted {
            outcomes: vec![Err(FetchError::QuotaExceeded("quota".into())), Ok(1)],
            calls: vec![],
        };
        let err = chain(2).first_success(&mut scripted).await.unwrap_err();
        assert!(matches!(err, FetchError::QuotaExceeded(_)));
        assert_eq!(scripted.calls, vec![0]);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let mut scripted = Scripted {
            outcomes: vec![
                Err(FetchError::EmptyResult),
                Err(FetchError::Transport(TransportError::Network("down".into()))),
            ],
            calls: vec![],
        };
        let err = chain(2).first_success(&mut scripted).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_search_preset_widens() {
        let mut config = ShortsConfig::default();
        config.query.mode = FeedMode::Search;
        let chain = FallbackChain::for_config(&config);
        let tiers = chain.tiers();

        assert_eq!(tiers.len(), 3);
        assert!(tiers.iter().all(QueryConfig::is_search));
        assert_eq!(tiers[0].lookback_days_value(), Some(3));
        assert_eq!(tiers[0].max_results_value(), Some(10));
        assert_eq!(tiers[1].lookback_days_value(), Some(7));
        assert_eq!(tiers[1].max_results_value(), Some(20));
        assert_eq!(tiers[2].lookback_days_value(), None);
    }

    #[test]
    fn test_chart_preset() {
        let chain = FallbackChain::for_config(&ShortsConfig::default());
        let tiers = chain.tiers();
        assert_eq!(tiers[0].kind(), &QueryKind::Chart);
        assert_eq!(tiers[0].max_results_value(), Some(50));
        assert!(tiers[2].is_search());
    }
}
