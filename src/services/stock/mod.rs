//! 股票数据服务模块
//!
//! 价格历史与公司快照。上游数据源通过 `MarketDataSource` 注入，
//! 生产环境使用 Yahoo 实现，测试中替换为内存数据。

pub mod history;
pub mod period;
pub mod snapshot;
pub mod yahoo;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{Bar, CompanyMetadata, CompanySnapshot, PriceHistoryQuery, PriceHistoryResponse};

pub use history::build_price_history;
pub use period::{resolve_period, DEFAULT_PERIOD};
pub use snapshot::assemble_snapshot;
pub use yahoo::YahooClient;

/// 行情数据源
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 获取时间序列，按时间升序
    async fn fetch_series(&self, symbol: &str, range: &str, interval: &str) -> Result<Vec<Bar>>;

    /// 获取公司描述信息，`None` 表示上游没有该代码
    async fn fetch_metadata(&self, symbol: &str) -> Result<Option<CompanyMetadata>>;
}

/// 行情服务
///
/// 每个请求只做一次取数 → 整理 → 返回，不保存跨请求状态
#[derive(Clone)]
pub struct MarketService {
    source: Arc<dyn MarketDataSource>,
}

impl MarketService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// 获取价格历史
    pub async fn price_history(
        &self,
        symbol: &str,
        query: &PriceHistoryQuery,
    ) -> Result<PriceHistoryResponse, ServiceError> {
        let period = query.period.as_deref().unwrap_or(DEFAULT_PERIOD);
        let resolved = resolve_period(period, query.interval.as_deref());

        let bars = self
            .source
            .fetch_series(symbol, &resolved.range, &resolved.interval)
            .await
            .map_err(|e| {
                log::error!(
                    "获取价格历史失败 symbol={} period={} interval={}: {:#}",
                    symbol,
                    period,
                    resolved.interval,
                    e
                );
                ServiceError::upstream(
                    format!("Could not fetch price history for symbol: {}", symbol),
                    format!("{:#}", e),
                )
            })?;

        if bars.is_empty() {
            log::warn!("{} 在周期 {} 内无价格数据", symbol, period);
        }

        Ok(build_price_history(symbol, period, &resolved.interval, &bars))
    }

    /// 获取公司快照
    pub async fn company_snapshot(&self, symbol: &str) -> Result<CompanySnapshot, ServiceError> {
        let upstream_err = |e: anyhow::Error| {
            log::error!("获取公司数据失败 symbol={}: {:#}", symbol, e);
            ServiceError::upstream(
                format!("Could not fetch data for symbol: {}", symbol),
                format!("{:#}", e),
            )
        };

        let metadata = self
            .source
            .fetch_metadata(symbol)
            .await
            .map_err(upstream_err)?
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Company data not found for symbol: {}", symbol))
            })?;

        let day = self
            .source
            .fetch_series(symbol, "1d", "1d")
            .await
            .map_err(upstream_err)?;

        Ok(assemble_snapshot(symbol, &metadata, day.last()))
    }
}
