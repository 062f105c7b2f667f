//! 价格序列整理与汇总

use crate::models::{Bar, PriceHistoryResponse, PriceMeta, PricePoint};

use super::period::is_intraday;

/// 保留两位小数，恰好落在中点时取偶数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// 按采样间隔格式化时间戳
fn format_timestamp(bar: &Bar, interval: &str) -> String {
    if is_intraday(interval) {
        bar.timestamp.format("%Y-%m-%d %H:%M").to_string()
    } else {
        bar.timestamp.format("%Y-%m-%d").to_string()
    }
}

/// 构建价格历史响应
///
/// 空序列不是错误：返回空列表、空汇总和说明文字
pub fn build_price_history(
    symbol: &str,
    period: &str,
    interval: &str,
    bars: &[Bar],
) -> PriceHistoryResponse {
    let prices: Vec<PricePoint> = bars
        .iter()
        .map(|bar| PricePoint {
            date: format_timestamp(bar, interval),
            price: round2(bar.close),
            volume: bar.volume,
        })
        .collect();

    let (first, last) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (first.price, last.price),
        _ => {
            return PriceHistoryResponse {
                prices,
                meta: PriceMeta {
                    last_price: None,
                    price_change: None,
                    price_change_percent: None,
                    period: period.to_string(),
                    interval: interval.to_string(),
                    message: Some(format!(
                        "No price history data found for {} for the selected period.",
                        symbol
                    )),
                },
            }
        }
    };

    let price_change = round2(last - first);
    let price_change_percent = if first != 0.0 {
        round2(price_change / first * 100.0)
    } else {
        0.0
    };

    PriceHistoryResponse {
        prices,
        meta: PriceMeta {
            last_price: Some(last),
            price_change: Some(price_change),
            price_change_percent: Some(price_change_percent),
            period: period.to_string(),
            interval: interval.to_string(),
            message: None,
        },
    }
}
