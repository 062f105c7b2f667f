//! 股票数据模型
//!
//! 定义行情历史与公司快照相关的数据结构

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 上游返回的单根K线
///
/// 时间戳已换算为交易所当地时间
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// 价格序列中的一个点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 日期（日线及以上）或日期+时间（分钟线/小时线）
    pub date: String,
    /// 收盘价，保留两位小数
    pub price: f64,
    /// 成交量
    pub volume: u64,
}

/// 价格序列汇总信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMeta {
    pub last_price: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    /// 请求的周期
    pub period: String,
    /// 实际使用的采样间隔
    pub interval: String,
    /// 无数据时的说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 价格历史响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub prices: Vec<PricePoint>,
    pub meta: PriceMeta,
}

/// 价格历史查询参数
#[derive(Debug, Deserialize)]
pub struct PriceHistoryQuery {
    /// 周期（1d / 1w / 1mo / 3mo / 6mo / 1y / max 或任意透传值）
    pub period: Option<String>,
    /// 采样间隔，仅对未识别的周期生效
    pub interval: Option<String>,
}

/// 上游公司描述信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyMetadata {
    pub long_name: Option<String>,
    pub long_business_summary: Option<String>,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
    pub trailing_pe: Option<f64>,
}

impl CompanyMetadata {
    /// 所有字段都缺失视为无数据
    pub fn is_empty(&self) -> bool {
        self.long_name.is_none()
            && self.long_business_summary.is_none()
            && self.previous_close.is_none()
            && self.volume.is_none()
            && self.trailing_pe.is_none()
    }
}

/// 公司快照
///
/// 合并描述信息与当日价格样本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    /// 股票代码（大写）
    pub symbol: String,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub current_price: Option<f64>,
    pub price_change: Option<f64>,
    #[serde(rename = "high24")]
    pub day_high: Option<f64>,
    #[serde(rename = "low24")]
    pub day_low: Option<f64>,
    pub previous_close: f64,
    pub volume: Option<u64>,
    pub pe_ratio: Option<f64>,
}
